//! Platform abstraction layer
//!
//! Handles:
//! - Input state (held keys, edge detection, pointer clicks)
//! - Frame timing (monotonic dt, FPS)

pub mod clock;
pub mod input;

pub use clock::FrameClock;
pub use input::{Action, InputState};
