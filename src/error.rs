//! Error types for Shadowsilk

use std::path::PathBuf;

use thiserror::Error;

/// Malformed animation configuration. Fatal to the registering/playing call.
#[derive(Debug, Error, PartialEq)]
pub enum AnimationError {
    #[error("Animation already registered: {0}")]
    DuplicateClip(String),

    #[error("Animation not found: {0}")]
    UnknownClip(String),

    #[error("Clip {clip}: {durations} durations given for {frames} frames")]
    InvalidFrameCount {
        clip: String,
        frames: usize,
        durations: usize,
    },

    #[error("Frame duration must be positive in clip {0}")]
    InvalidDuration(String),

    #[error(
        "Frame at row={row}, col={col} is outside sprite sheet bounds ({sheet_width}x{sheet_height})"
    )]
    FrameOutOfBounds {
        col: u32,
        row: u32,
        sheet_width: u32,
        sheet_height: u32,
    },

    #[error("Sprite sheet not found: {0}")]
    SheetNotFound(PathBuf),

    #[error("Failed to decode sprite sheet {path}: {reason}")]
    SheetDecode { path: PathBuf, reason: String },
}

/// Reasons a transition refused to start. The machine is left untouched.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("A transition is already in progress")]
    AlreadyActive,

    #[error("Transition requires the '{0}' parameter")]
    MissingParameter(&'static str),

    #[error("Transition speed must be positive, got {0}")]
    InvalidSpeed(f32),

    #[error("Transition asset not found: {0}")]
    AssetNotFound(PathBuf),

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Storage failures. Caught at the `ProgressStore` boundary and logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid save slot {0} (expected 1-3)")]
    InvalidSlot(u8),

    #[error("Unsupported save version {0}")]
    UnsupportedVersion(u32),

    #[error("No save data at {0}")]
    Missing(PathBuf),
}
