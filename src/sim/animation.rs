//! Sprite-frame animation playback
//!
//! Clips are immutable once registered. The player advances a frame index by
//! accumulated time and handles loop, pingpong and one-shot clips, catching up
//! over several frames when a single `dt` spans more than one frame duration.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

/// Pixel rectangle of one frame inside a sprite sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Draw mirrored horizontally
    pub flip_x: bool,
}

/// Grid layout of a sprite sheet (geometry only, pixels live in the renderer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    pub width: u32,
    pub height: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub margin: u32,
    pub spacing: u32,
}

impl SpriteSheet {
    pub fn new(width: u32, height: u32, frame_width: u32, frame_height: u32) -> Self {
        Self {
            width,
            height,
            frame_width,
            frame_height,
            margin: 0,
            spacing: 0,
        }
    }

    pub fn with_margin(mut self, margin: u32, spacing: u32) -> Self {
        self.margin = margin;
        self.spacing = spacing;
        self
    }

    /// Rectangle of the cell at (col, row), validated against the sheet bounds
    pub fn frame(&self, col: u32, row: u32, flip_x: bool) -> Result<FrameRect, AnimationError> {
        let x = self.margin + col * (self.frame_width + self.spacing);
        let y = self.margin + row * (self.frame_height + self.spacing);
        if x + self.frame_width > self.width || y + self.frame_height > self.height {
            return Err(AnimationError::FrameOutOfBounds {
                col,
                row,
                sheet_width: self.width,
                sheet_height: self.height,
            });
        }
        Ok(FrameRect {
            x,
            y,
            w: self.frame_width,
            h: self.frame_height,
            flip_x,
        })
    }

    /// `count` consecutive frames of one row starting at `start_col`
    pub fn row(
        &self,
        row: u32,
        start_col: u32,
        count: u32,
        flip_x: bool,
    ) -> Result<Vec<FrameRect>, AnimationError> {
        (start_col..start_col + count)
            .map(|col| self.frame(col, row, flip_x))
            .collect()
    }
}

/// Per-frame timing of a clip
#[derive(Debug, Clone, PartialEq)]
pub enum FrameTiming {
    /// Same duration (seconds) for every frame
    Uniform(f32),
    /// One duration per frame
    PerFrame(Vec<f32>),
}

/// Named, immutable animation sequence
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub frames: Vec<FrameRect>,
    pub durations: Vec<f32>,
    pub looping: bool,
    pub pingpong: bool,
}

impl AnimationClip {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total time for one forward pass
    pub fn total_duration(&self) -> f32 {
        self.durations.iter().sum()
    }
}

/// Plays one clip at a time out of a registry of clips
#[derive(Debug, Clone, Default)]
pub struct AnimationPlayer {
    clips: HashMap<String, AnimationClip>,
    current: Option<String>,
    frame_index: usize,
    elapsed: f32,
    playing: bool,
    finished: bool,
    reverse: bool,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip. Names are unique; re-registering is an error.
    pub fn register_clip(
        &mut self,
        name: &str,
        frames: Vec<FrameRect>,
        timing: FrameTiming,
        looping: bool,
        pingpong: bool,
    ) -> Result<(), AnimationError> {
        if self.clips.contains_key(name) {
            return Err(AnimationError::DuplicateClip(name.to_string()));
        }
        let durations = match timing {
            FrameTiming::Uniform(d) => vec![d; frames.len()],
            FrameTiming::PerFrame(d) => {
                if d.len() != frames.len() {
                    return Err(AnimationError::InvalidFrameCount {
                        clip: name.to_string(),
                        frames: frames.len(),
                        durations: d.len(),
                    });
                }
                d
            }
        };
        // A non-positive duration would never let the catch-up loop terminate
        if durations.iter().any(|d| !(*d > 0.0)) {
            return Err(AnimationError::InvalidDuration(name.to_string()));
        }
        self.clips.insert(
            name.to_string(),
            AnimationClip {
                name: name.to_string(),
                frames,
                durations,
                looping,
                pingpong,
            },
        );
        Ok(())
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    /// Switch to a clip. Re-selecting the current clip without `reset`
    /// keeps the playback position.
    pub fn play(&mut self, name: &str, reset: bool, reverse: bool) -> Result<(), AnimationError> {
        let clip = self
            .clips
            .get(name)
            .ok_or_else(|| AnimationError::UnknownClip(name.to_string()))?;
        if self.current.as_deref() == Some(name) && !reset {
            return Ok(());
        }
        self.frame_index = if reverse {
            clip.frame_count().saturating_sub(1)
        } else {
            0
        };
        self.current = Some(name.to_string());
        self.elapsed = 0.0;
        self.playing = true;
        self.finished = false;
        self.reverse = reverse;
        Ok(())
    }

    /// Advance playback by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        if !self.playing || self.finished {
            return;
        }
        let Some(clip) = self.current.as_ref().and_then(|n| self.clips.get(n)) else {
            return;
        };
        let count = clip.frame_count();
        if count == 0 {
            return;
        }

        if !dt.is_finite() {
            warn!("ignoring non-finite animation step {dt}");
            return;
        }

        self.elapsed += dt;
        if clip.looping || clip.pingpong {
            let cycle = cycle_duration(clip);
            if self.elapsed >= cycle {
                self.elapsed %= cycle;
            }
        } else if self.elapsed >= remaining_duration(clip, self.frame_index, self.reverse) {
            self.frame_index = if self.reverse { 0 } else { count - 1 };
            self.elapsed = 0.0;
            self.playing = false;
            self.finished = true;
            return;
        }

        while self.elapsed >= clip.durations[self.frame_index] {
            self.elapsed -= clip.durations[self.frame_index];
            let next = if self.reverse {
                self.frame_index as isize - 1
            } else {
                self.frame_index as isize + 1
            };

            if (0..count as isize).contains(&next) {
                self.frame_index = next as usize;
                continue;
            }

            if clip.pingpong {
                // Bounce off the end frame instead of repeating it
                self.reverse = !self.reverse;
                self.frame_index = match (count > 1, self.reverse) {
                    (false, _) => 0,
                    (true, true) => count - 2,
                    (true, false) => 1,
                };
                continue;
            }

            if clip.looping {
                self.frame_index = if next < 0 { count - 1 } else { 0 };
                continue;
            }

            self.frame_index = if next < 0 { 0 } else { count - 1 };
            self.playing = false;
            self.finished = true;
            break;
        }
    }

    /// Frame at the current index, if a non-empty clip is active
    pub fn current_frame(&self) -> Option<FrameRect> {
        let clip = self.clips.get(self.current.as_ref()?)?;
        clip.frames.get(self.frame_index).copied()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn resume(&mut self) {
        if !self.finished {
            self.playing = true;
        }
    }

    /// Rewind the current clip to its first frame
    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.elapsed = 0.0;
        self.finished = false;
        self.playing = true;
    }
}

/// Time after which a repeating clip is back in the same playback state
fn cycle_duration(clip: &AnimationClip) -> f32 {
    let total = clip.total_duration();
    if !clip.pingpong {
        return total;
    }
    match (clip.durations.first(), clip.durations.last()) {
        // One frame flips direction on every bounce
        (Some(only), _) if clip.durations.len() == 1 => 2.0 * only,
        (Some(first), Some(last)) => 2.0 * total - first - last,
        _ => total,
    }
}

/// Time left in a one-shot clip before it lands on its terminal frame
fn remaining_duration(clip: &AnimationClip, index: usize, reverse: bool) -> f32 {
    if reverse {
        clip.durations[..=index].iter().sum()
    } else {
        clip.durations[index..].iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: u32) -> Vec<FrameRect> {
        SpriteSheet::new(32 * n, 32, 32, 32).row(0, 0, n, false).unwrap()
    }

    fn player_with(name: &str, n: u32, looping: bool, pingpong: bool) -> AnimationPlayer {
        let mut p = AnimationPlayer::new();
        p.register_clip(name, frames(n), FrameTiming::Uniform(0.25), looping, pingpong)
            .unwrap();
        p.play(name, true, false).unwrap();
        p
    }

    #[test]
    fn test_loop_returns_to_start_after_full_cycle() {
        let mut p = player_with("walk", 4, true, false);
        p.advance(1.0);
        assert_eq!(p.frame_index(), 0);
        assert!(!p.is_finished());
    }

    #[test]
    fn test_large_dt_catches_up() {
        let mut p = player_with("walk", 4, true, false);
        p.advance(0.25 * 6.0);
        assert_eq!(p.frame_index(), 2);
    }

    #[test]
    fn test_huge_dt_wraps_instead_of_stepping() {
        let mut p = player_with("walk", 4, true, false);
        p.advance(1.0e9);
        assert!(p.frame_index() < 4);
        assert!(p.is_playing());

        let mut p = player_with("hover", 4, false, true);
        p.advance(1.0e9);
        assert!(p.frame_index() < 4);

        let mut p = player_with("attack", 4, false, false);
        p.advance(1.0e9);
        assert_eq!(p.frame_index(), 3);
        assert!(p.is_finished());
    }

    #[test]
    fn test_non_finite_dt_ignored() {
        let mut p = player_with("walk", 4, true, false);
        p.advance(0.3);
        p.advance(f32::INFINITY);
        p.advance(f32::NAN);
        assert_eq!(p.frame_index(), 1);
        p.advance(0.25);
        assert_eq!(p.frame_index(), 2);
    }

    #[test]
    fn test_pingpong_wrap_keeps_phase() {
        // One full bounce cycle of 4 frames is 6 frame lengths
        let mut p = player_with("hover", 4, false, true);
        p.advance(0.25 * 4.0);
        assert_eq!(p.frame_index(), 2);
        assert!(p.is_reversed());
        p.advance(0.25 * 6.0);
        assert_eq!(p.frame_index(), 2);
        assert!(p.is_reversed());
    }

    #[test]
    fn test_pause_holds_frame() {
        let mut p = player_with("walk", 4, true, false);
        p.advance(0.25);
        p.pause();
        p.advance(0.5);
        assert_eq!(p.frame_index(), 1);
        assert!(!p.is_playing());
        p.resume();
        p.advance(0.25);
        assert_eq!(p.frame_index(), 2);
    }

    #[test]
    fn test_one_shot_finishes_on_last_frame() {
        let mut p = player_with("attack", 4, false, false);
        p.advance(5.0);
        assert_eq!(p.frame_index(), 3);
        assert!(p.is_finished());
        assert!(!p.is_playing());
        p.advance(10.0);
        assert_eq!(p.frame_index(), 3);
        p.resume();
        assert!(!p.is_playing());
    }

    #[test]
    fn test_pingpong_bounces_without_repeating_end_frame() {
        let mut p = player_with("hover", 4, false, true);
        let mut seen = vec![p.frame_index()];
        for _ in 0..7 {
            p.advance(0.25);
            seen.push(p.frame_index());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 2, 1, 0, 1]);
        assert!(!p.is_finished());
    }

    #[test]
    fn test_pingpong_single_frame_stays_put() {
        let mut p = player_with("blink", 1, false, true);
        p.advance(2.0);
        assert_eq!(p.frame_index(), 0);
    }

    #[test]
    fn test_reverse_one_shot_ends_at_zero() {
        let mut p = AnimationPlayer::new();
        p.register_clip("fold", frames(3), FrameTiming::Uniform(0.1), false, false)
            .unwrap();
        p.play("fold", true, true).unwrap();
        assert_eq!(p.frame_index(), 2);
        p.advance(1.0);
        assert_eq!(p.frame_index(), 0);
        assert!(p.is_finished());
    }

    #[test]
    fn test_same_clip_without_reset_keeps_position() {
        let mut p = player_with("idle", 4, true, false);
        p.advance(0.5);
        assert_eq!(p.frame_index(), 2);
        p.play("idle", false, false).unwrap();
        assert_eq!(p.frame_index(), 2);
        p.play("idle", true, false).unwrap();
        assert_eq!(p.frame_index(), 0);
    }

    #[test]
    fn test_duplicate_clip_rejected() {
        let mut p = player_with("idle", 2, true, false);
        let err = p
            .register_clip("idle", frames(2), FrameTiming::Uniform(0.1), true, false)
            .unwrap_err();
        assert_eq!(err, AnimationError::DuplicateClip("idle".into()));
    }

    #[test]
    fn test_duration_mismatch_rejected() {
        let mut p = AnimationPlayer::new();
        let err = p
            .register_clip("run", frames(3), FrameTiming::PerFrame(vec![0.1, 0.1]), true, false)
            .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidFrameCount { frames: 3, durations: 2, .. }));
        assert!(!p.has_clip("run"));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut p = AnimationPlayer::new();
        let err = p
            .register_clip("bad", frames(2), FrameTiming::Uniform(0.0), true, false)
            .unwrap_err();
        assert_eq!(err, AnimationError::InvalidDuration("bad".into()));
    }

    #[test]
    fn test_unknown_clip() {
        let mut p = AnimationPlayer::new();
        assert_eq!(
            p.play("ghost", true, false),
            Err(AnimationError::UnknownClip("ghost".into()))
        );
        assert!(p.current_frame().is_none());
    }

    #[test]
    fn test_empty_clip_has_no_frame() {
        let mut p = AnimationPlayer::new();
        p.register_clip("none", Vec::new(), FrameTiming::Uniform(0.1), true, false)
            .unwrap();
        p.play("none", true, false).unwrap();
        p.advance(1.0);
        assert!(p.current_frame().is_none());
    }

    #[test]
    fn test_per_frame_durations() {
        let mut p = AnimationPlayer::new();
        p.register_clip(
            "windup",
            frames(3),
            FrameTiming::PerFrame(vec![0.5, 0.1, 0.1]),
            true,
            false,
        )
        .unwrap();
        p.play("windup", true, false).unwrap();
        p.advance(0.4);
        assert_eq!(p.frame_index(), 0);
        p.advance(0.15);
        assert_eq!(p.frame_index(), 1);
    }

    #[test]
    fn test_sheet_bounds_checked() {
        let sheet = SpriteSheet::new(64, 32, 32, 32);
        assert!(sheet.frame(1, 0, false).is_ok());
        assert!(matches!(
            sheet.frame(2, 0, false),
            Err(AnimationError::FrameOutOfBounds { col: 2, row: 0, .. })
        ));
        let spaced = SpriteSheet::new(70, 34, 32, 32).with_margin(1, 2);
        let f = spaced.frame(1, 0, true).unwrap();
        assert_eq!((f.x, f.y, f.flip_x), (35, 1, true));
    }
}
