//! Sound card output through Kira
//!
//! Opening the device can fail (no card, CI box); callers fall back to
//! `SilentOutput` in that case.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, Decibels, DefaultBackend, Easing, StartTime, Tween};
use log::{info, warn};

use super::AudioOutput;

pub struct KiraOutput {
    manager: AudioManager<DefaultBackend>,
    cache: HashMap<PathBuf, StaticSoundData>,
    music: Option<StaticSoundHandle>,
}

impl KiraOutput {
    pub fn open() -> Option<Self> {
        match AudioManager::<DefaultBackend>::new(AudioManagerSettings::default()) {
            Ok(manager) => {
                info!("Audio device opened");
                Some(Self {
                    manager,
                    cache: HashMap::new(),
                    music: None,
                })
            }
            Err(e) => {
                warn!("No audio device available ({e}), running silent");
                None
            }
        }
    }

    fn load(&mut self, path: &Path) -> Option<StaticSoundData> {
        if let Some(data) = self.cache.get(path) {
            return Some(data.clone());
        }
        match StaticSoundData::from_file(path) {
            Ok(data) => {
                self.cache.insert(path.to_path_buf(), data.clone());
                Some(data)
            }
            Err(e) => {
                warn!("Failed to decode {}: {e}", path.display());
                None
            }
        }
    }
}

fn tween_ms(ms: u32) -> Tween {
    Tween {
        start_time: StartTime::Immediate,
        duration: Duration::from_millis(u64::from(ms)),
        easing: Easing::Linear,
    }
}

/// Linear gain in [0, 1] to Kira's decibel scale, -60 dB being silence
fn to_decibels(volume: f32) -> Decibels {
    if volume <= 0.0 {
        Decibels(-60.0)
    } else {
        Decibels((20.0 * volume.log10()).max(-60.0))
    }
}

impl AudioOutput for KiraOutput {
    fn play_sound(&mut self, path: &Path, volume: f32) {
        let Some(data) = self.load(path) else {
            return;
        };
        if let Err(e) = self.manager.play(data.volume(to_decibels(volume))) {
            warn!("Failed to play {}: {e}", path.display());
        }
    }

    fn play_music(&mut self, path: &Path, looping: bool, fade_in_ms: u32, volume: f32) {
        self.stop_music(0);
        let Some(data) = self.load(path) else {
            return;
        };
        let mut data = data
            .volume(to_decibels(volume))
            .fade_in_tween(tween_ms(fade_in_ms));
        if looping {
            data = data.loop_region(..);
        }
        match self.manager.play(data) {
            Ok(handle) => self.music = Some(handle),
            Err(e) => warn!("Failed to start music {}: {e}", path.display()),
        }
    }

    fn stop_music(&mut self, fade_out_ms: u32) {
        if let Some(mut handle) = self.music.take() {
            handle.stop(tween_ms(fade_out_ms));
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        if let Some(handle) = self.music.as_mut() {
            handle.set_volume(to_decibels(volume), Tween::default());
        }
    }

    fn is_music_playing(&self) -> bool {
        self.music
            .as_ref()
            .is_some_and(|h| h.state() != PlaybackState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decibel_mapping() {
        assert_eq!(to_decibels(0.0), Decibels(-60.0));
        assert_eq!(to_decibels(1.0), Decibels(0.0));
        assert!((to_decibels(0.5).0 + 6.0206).abs() < 1e-3);
        assert_eq!(to_decibels(1.0e-6), Decibels(-60.0));
    }
}
