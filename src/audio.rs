//! Audio service
//!
//! Cue names resolve against an asset directory (`sfx/` and `music/`). A
//! missing file is logged once and the cue becomes a no-op; nothing here ever
//! fails back into the simulation.

#[cfg(feature = "audio-device")]
mod kira_output;

#[cfg(feature = "audio-device")]
pub use kira_output::KiraOutput;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

const SFX_EXTENSIONS: [&str; 3] = ["wav", "ogg", "mp3"];
const MUSIC_EXTENSIONS: [&str; 3] = ["mp3", "ogg", "wav"];

/// Sound cues used by the scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    ButtonClick,
    SystemStartup,
    CameraDisable,
    LightsCut,
    Distraction,
    HackSuccess,
    HackFail,
    CoinCollect,
    HornetJump,
    HornetAttack,
    HornetDash,
    HornetSpecial,
    HornetHeal,
}

impl Cue {
    pub fn name(self) -> &'static str {
        match self {
            Cue::ButtonClick => "button_click",
            Cue::SystemStartup => "system_startup",
            Cue::CameraDisable => "camera_disable",
            Cue::LightsCut => "lights_cut",
            Cue::Distraction => "distraction",
            Cue::HackSuccess => "hack_success",
            Cue::HackFail => "hack_fail",
            Cue::CoinCollect => "coin_collect",
            Cue::HornetJump => "hornet_jump",
            Cue::HornetAttack => "hornet_attack",
            Cue::HornetDash => "hornet_dash",
            Cue::HornetSpecial => "hornet_special",
            Cue::HornetHeal => "hornet_heal",
        }
    }
}

pub const MENU_THEME: &str = "menu_theme";

/// Persisted mixer levels, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioVolumes {
    pub master: f32,
    pub music: f32,
    pub sfx: f32,
}

impl Default for AudioVolumes {
    fn default() -> Self {
        Self {
            master: 0.7,
            music: 0.5,
            sfx: 0.8,
        }
    }
}

/// What the scenes talk to
pub trait AudioService {
    /// Fire-and-forget effect; `volume` scales the effect before the mixer levels
    fn play_sfx(&mut self, name: &str, volume: Option<f32>);
    fn play_music(&mut self, name: &str, looping: bool, fade_in_ms: u32);
    fn stop_music(&mut self, fade_out_secs: f32);
    fn is_music_playing(&self) -> bool;

    fn volumes(&self) -> AudioVolumes;
    fn set_master_volume(&mut self, volume: f32);
    fn set_music_volume(&mut self, volume: f32);
    fn set_sfx_volume(&mut self, volume: f32);

    fn play(&mut self, cue: Cue) {
        self.play_sfx(cue.name(), None);
    }
}

/// Playback device. Receives already-resolved files and final volumes.
pub trait AudioOutput {
    fn play_sound(&mut self, path: &Path, volume: f32);
    fn play_music(&mut self, path: &Path, looping: bool, fade_in_ms: u32, volume: f32);
    fn stop_music(&mut self, fade_out_ms: u32);
    fn set_music_volume(&mut self, volume: f32);
    fn is_music_playing(&self) -> bool;
}

/// Output that plays nothing (headless runs, tests)
#[derive(Debug, Default)]
pub struct SilentOutput {
    music: Option<PathBuf>,
}

impl AudioOutput for SilentOutput {
    fn play_sound(&mut self, path: &Path, volume: f32) {
        debug!("sfx {} @ {volume:.2}", path.display());
    }

    fn play_music(&mut self, path: &Path, _looping: bool, _fade_in_ms: u32, _volume: f32) {
        self.music = Some(path.to_path_buf());
    }

    fn stop_music(&mut self, _fade_out_ms: u32) {
        self.music = None;
    }

    fn set_music_volume(&mut self, _volume: f32) {}

    fn is_music_playing(&self) -> bool {
        self.music.is_some()
    }
}

/// The sound card when the `audio-device` feature is on and a device opens,
/// otherwise silence
#[cfg(feature = "audio-device")]
pub fn default_output() -> Box<dyn AudioOutput> {
    match KiraOutput::open() {
        Some(output) => Box::new(output),
        None => Box::new(SilentOutput::default()),
    }
}

#[cfg(not(feature = "audio-device"))]
pub fn default_output() -> Box<dyn AudioOutput> {
    Box::new(SilentOutput::default())
}

/// Audio manager for the game
pub struct AudioManager {
    asset_dir: Option<PathBuf>,
    output: Box<dyn AudioOutput>,
    volumes: AudioVolumes,
    muted: bool,
    /// Resolution cache; `None` marks a cue already reported missing
    sfx: HashMap<String, Option<PathBuf>>,
    missing_music: Vec<String>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None, Box::new(SilentOutput::default()))
    }
}

impl AudioManager {
    pub fn new(asset_dir: Option<PathBuf>, output: Box<dyn AudioOutput>) -> Self {
        if asset_dir.is_none() {
            warn!("No audio asset directory - audio disabled");
        }
        Self {
            asset_dir,
            output,
            volumes: AudioVolumes::default(),
            muted: false,
            sfx: HashMap::new(),
            missing_music: Vec::new(),
        }
    }

    pub fn apply_volumes(&mut self, volumes: AudioVolumes) {
        self.volumes = AudioVolumes {
            master: volumes.master.clamp(0.0, 1.0),
            music: volumes.music.clamp(0.0, 1.0),
            sfx: volumes.sfx.clamp(0.0, 1.0),
        };
        self.refresh_music_volume();
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.refresh_music_volume();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn sfx_volume_for(&self, scale: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            scale * self.volumes.sfx * self.volumes.master
        }
    }

    fn music_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volumes.music * self.volumes.master
        }
    }

    fn refresh_music_volume(&mut self) {
        let level = self.music_level();
        self.output.set_music_volume(level);
    }

    fn find(dir: &Path, name: &str, extensions: &[&str]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }

    fn resolve_sfx(&mut self, name: &str) -> Option<PathBuf> {
        if let Some(cached) = self.sfx.get(name) {
            return cached.clone();
        }
        let dir = self.asset_dir.as_ref().map(|d| d.join("sfx"));
        let found = dir.as_deref().and_then(|d| Self::find(d, name, &SFX_EXTENSIONS));
        if found.is_none() && self.asset_dir.is_some() {
            warn!("Sound '{name}' not found in {}", dir.unwrap_or_default().display());
        }
        self.sfx.insert(name.to_string(), found.clone());
        found
    }
}

impl AudioService for AudioManager {
    fn play_sfx(&mut self, name: &str, volume: Option<f32>) {
        let Some(path) = self.resolve_sfx(name) else {
            return;
        };
        let vol = self.sfx_volume_for(volume.unwrap_or(1.0));
        if vol <= 0.0 {
            return;
        }
        self.output.play_sound(&path, vol);
    }

    fn play_music(&mut self, name: &str, looping: bool, fade_in_ms: u32) {
        let Some(asset_dir) = &self.asset_dir else {
            return;
        };
        let dir = asset_dir.join("music");
        match Self::find(&dir, name, &MUSIC_EXTENSIONS) {
            Some(path) => {
                let level = self.music_level();
                self.output.play_music(&path, looping, fade_in_ms, level);
            }
            None => {
                if !self.missing_music.iter().any(|m| m == name) {
                    warn!("Music '{name}' not found in {}", dir.display());
                    self.missing_music.push(name.to_string());
                }
            }
        }
    }

    fn stop_music(&mut self, fade_out_secs: f32) {
        self.output.stop_music((fade_out_secs.max(0.0) * 1000.0) as u32);
    }

    fn is_music_playing(&self) -> bool {
        self.output.is_music_playing()
    }

    fn volumes(&self) -> AudioVolumes {
        self.volumes
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.volumes.master = volume.clamp(0.0, 1.0);
        self.refresh_music_volume();
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.volumes.music = volume.clamp(0.0, 1.0);
        self.refresh_music_volume();
    }

    fn set_sfx_volume(&mut self, volume: f32) {
        self.volumes.sfx = volume.clamp(0.0, 1.0);
    }
}
