//! Error types for PLY parsing and asset loading
use std::io;
use std::path::PathBuf;

/// Errors produced while decoding PLY data
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    #[error("malformed PLY header at line {line}: {message}")]
    Header { line: usize, message: String },

    #[error("unsupported PLY format '{0}'")]
    UnsupportedFormat(String),

    #[error("PLY data has no '{0}' element")]
    MissingElement(&'static str),

    #[error("PLY element '{element}' has no '{property}' property")]
    MissingProperty {
        element: String,
        property: &'static str,
    },

    #[error("PLY body ended before all declared elements were read")]
    UnexpectedEof,

    #[error("invalid PLY value '{0}'")]
    InvalidValue(String),

    #[error("face references vertex {index} but only {vertex_count} vertices are declared")]
    IndexOutOfRange { index: u64, vertex_count: usize },
}

/// Errors surfaced by the asset loader
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("mesh asset '{}' could not be read", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("mesh asset '{}' is not a valid triangle mesh", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: PlyError,
    },
}
