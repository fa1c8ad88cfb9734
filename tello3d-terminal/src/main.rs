//! tello3d terminal viewer - spinning DJI Tello drone
//!
//! Usage: tello3d-terminal [mesh.ply]
//!
//! Without an argument the bundled drone asset is shown. A PLY path is run
//! through the same normalization pipeline instead.
//! Controls:
//!   - WASD / Arrow Keys: Rotate the model
//!   - E/R: Roll rotation
//!   - Space: Toggle auto-spin
//!   - P: Toggle perspective/orthographic
//!   - Q/ESC: Quit

use anyhow::{Context, Result};
use tello3d_core::{convert, load_normalized_asset, load_normalized_asset_from};
use tello3d_terminal::TerminalApp;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mesh = match std::env::args().nth(1) {
        Some(path) => load_normalized_asset_from(&path)
            .with_context(|| format!("Failed to load mesh from {}", path))?,
        None => load_normalized_asset().context("Failed to load the bundled drone mesh")?,
    };

    let render_mesh = convert(&mesh);
    log::info!(
        "Prepared render mesh: {} vertices, {} triangles",
        render_mesh.vertex_count(),
        render_mesh.triangle_count()
    );

    log::info!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(render_mesh)?;
    app.run()?;

    Ok(())
}
