//! Game settings and preferences
//!
//! Persisted inside the profile document under `game_settings`. Audio levels
//! live beside them in `audio_settings` (see `audio::AudioVolumes`).

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::transition::DEFAULT_SPEED;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => consts::DEFAULT_PARTICLE_CAP,
            QualityPreset::High => 2000,
        }
    }

    /// Whether ambient embers drift across the action stage
    pub fn embers_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Screen shake on security-event jolts
    pub screen_shake: bool,
    /// Particle effects (sparks, smoke)
    pub particles: bool,
    /// Ambient embers
    pub embers: bool,

    // === HUD ===
    pub show_fps: bool,

    // === Timing ===
    /// Transition progress speed (progress units x 255 per second)
    pub transition_speed: f32,
    /// Largest frame dt handed to the simulations
    pub max_frame_dt: f32,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            screen_shake: true,
            particles: true,
            embers: true,

            show_fps: false,

            transition_speed: DEFAULT_SPEED,
            max_frame_dt: consts::MAX_FRAME_DT,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.embers = preset.embers_enabled();
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Clamp a measured frame time before it reaches any simulation
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        dt.clamp(0.0, self.max_frame_dt.max(0.0))
    }
}
