use std::path::PathBuf;

use thiserror::Error;

/// Rejection of a level source that cannot back a rectangular tile grid.
#[derive(Debug, Error)]
pub enum InvalidLevelError {
    #[error("level has no tiles")]
    Empty,
    #[error("level row {row} has {found} columns, expected {expected}")]
    Jagged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("pixel buffer holds {found} bytes, expected {expected} for a {width}x{height} RGBA image")]
    PixelBuffer {
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },
    #[error("failed to read level {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
