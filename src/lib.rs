//! Shadowsilk - real-time simulation core for two small 2D prototypes
//!
//! Core modules:
//! - `sim`: Simulation (animation, particles, guards, stealth mission, action combat)
//! - `transition`: Two-phase scene transition state machine
//! - `renderer`: Software RGBA canvas and asset-backed frame sources
//! - `scene`: Stealth/action scenes and the root frame driver
//! - `platform`: Input state and frame clock
//! - `persistence`: Versioned save documents (profile, records, save slots)
//! - `audio`: Audio service seam
//! - `ui`: Buttons and sliders polled by the scenes
//! - `records`: Best successful missions

pub mod audio;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod records;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod transition;
pub mod ui;

pub use error::{AnimationError, PersistenceError, TransitionError};
pub use records::MissionRecords;
pub use settings::{QualityPreset, Settings};

use serde::{Deserialize, Serialize};

/// Engine configuration constants
pub mod consts {
    /// Target frame rate of the root loop
    pub const TARGET_FPS: u32 = 60;
    /// Nominal frame time at the target rate
    pub const FRAME_DT: f32 = 1.0 / TARGET_FPS as f32;
    /// Largest dt handed to the simulations after a stalled frame
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Logical screen size shared by both prototypes
    pub const SCREEN_WIDTH: u32 = 1000;
    pub const SCREEN_HEIGHT: u32 = 700;

    /// Hard cap on live particles (medium quality)
    pub const DEFAULT_PARTICLE_CAP: usize = 500;
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const GRAY: Rgb = Rgb(100, 100, 100);
    pub const DARK_GRAY: Rgb = Rgb(50, 50, 50);
    pub const DARK_BLUE: Rgb = Rgb(0, 0, 100);
    pub const DARK_GREEN: Rgb = Rgb(0, 100, 0);

    /// Linear blend toward `other` (t clamped to [0, 1])
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Normalize an angle difference in degrees to [-180, 180)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Cubic ease-out: `1 - (1 - p)^3`, p clamped to [0, 1]
#[inline]
pub fn cubic_ease_out(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}
