//! Terminal viewer for the normalized drone mesh
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tello3d_core::{EulerAngles, RenderMesh};

pub mod camera;
pub mod renderer;

pub use camera::{Camera, ProjectionMode};
pub use renderer::AsciiRenderer;

const ROTATE_STEP: f32 = 0.1;

/// Interactive ASCII view of a [`RenderMesh`]
pub struct TerminalApp {
    mesh: RenderMesh,
    orientation: EulerAngles,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    spinning: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: RenderMesh) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(mesh, width as usize, height as usize))
    }

    pub fn with_size(mesh: RenderMesh, width: usize, height: usize) -> Self {
        let mut camera = Camera::new(width as u32, height as u32);
        camera.frame(bounding_radius(&mesh));

        Self {
            mesh,
            orientation: EulerAngles::new(0.3, 0.3, 0.0),
            camera,
            renderer: AsciiRenderer::new(width, height),
            running: true,
            spinning: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30);

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            self.update();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('w') | KeyCode::Up => self.orientation.nudge(ROTATE_STEP, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.orientation.nudge(-ROTATE_STEP, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.orientation.nudge(0.0, -ROTATE_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.orientation.nudge(0.0, ROTATE_STEP, 0.0),
            KeyCode::Char('e') => self.orientation.nudge(0.0, 0.0, ROTATE_STEP),
            KeyCode::Char('r') => self.orientation.nudge(0.0, 0.0, -ROTATE_STEP),
            KeyCode::Char(' ') => self.spinning = !self.spinning,
            KeyCode::Char('p') => {
                self.camera.mode = match self.camera.mode {
                    ProjectionMode::Perspective => ProjectionMode::Orthographic,
                    ProjectionMode::Orthographic => ProjectionMode::Perspective,
                }
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        if self.spinning {
            self.orientation.nudge(0.0, 0.015, 0.0);
        }
    }

    /// Rasterize the current frame into the renderer's buffers
    pub fn render_frame(&mut self) -> &AsciiRenderer {
        let model = self.orientation.to_matrix();
        self.renderer.clear();
        self.renderer.render_mesh(&self.mesh, &model, &self.camera);
        &self.renderer
    }

    fn render(&mut self) -> io::Result<()> {
        self.render_frame();

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "tello3d | {} tris | FPS: {:.1} | WASD/Arrows=Rotate E/R=Roll Space=Spin P=Projection Q=Quit",
                self.mesh.triangle_count(),
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Distance from the origin to the farthest vertex
pub fn bounding_radius(mesh: &RenderMesh) -> f32 {
    mesh.positions()
        .iter()
        .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use tello3d_core::{convert, load_normalized_asset, TriangleMesh};

    fn press(app: &mut TerminalApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_bounding_radius() {
        let mesh = convert(&TriangleMesh::cube(2.0));
        assert!((bounding_radius(&mesh) - 3f32.sqrt()).abs() < 1e-6);
        assert_eq!(bounding_radius(&RenderMesh::default()), 0.0);
    }

    #[test]
    fn test_keys_drive_orientation_and_quit() {
        let mut app = TerminalApp::with_size(convert(&TriangleMesh::cube(1.0)), 40, 20);
        let start = app.orientation;

        press(&mut app, KeyCode::Up);
        assert!((app.orientation.roll - start.roll - ROTATE_STEP).abs() < 1e-6);

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.camera.mode, ProjectionMode::Orthographic);

        press(&mut app, KeyCode::Char(' '));
        assert!(!app.spinning);

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn test_drone_fills_part_of_the_frame() {
        let mesh = convert(&load_normalized_asset().unwrap());
        let mut app = TerminalApp::with_size(mesh, 80, 40);
        let covered = app.render_frame().covered_cells();
        assert!(covered > 0);
        assert!(covered < 80 * 40);
    }
}
