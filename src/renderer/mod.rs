//! Software rendering module
//!
//! Draws into an RGBA `Canvas`; presenting it (window, PNG snapshot) is the
//! binary's job.

pub mod canvas;
pub mod draw;
pub mod frames;

pub use canvas::{Canvas, Pixel};
pub use draw::{SpriteBank, draw_combat, draw_mission};
pub use frames::{FrameSequence, load_image, load_sprite_sheet};
