//! Asset-backed pixel sources: still images, sprite sheets and frame sequences
//!
//! A "video" is a directory of numbered PNG frames decoded one at a time as
//! playback advances.

use std::path::{Path, PathBuf};

use log::warn;

use super::canvas::Canvas;
use crate::error::{AnimationError, TransitionError};
use crate::sim::SpriteSheet;

fn decode(path: &Path) -> Result<Canvas, String> {
    image::open(path)
        .map(|img| Canvas::from_image(&img.to_rgba8()))
        .map_err(|e| e.to_string())
}

/// Load an image scaled to `width` x `height`
pub fn load_image(path: &Path, width: u32, height: u32) -> Result<Canvas, TransitionError> {
    if !path.exists() {
        return Err(TransitionError::AssetNotFound(path.to_path_buf()));
    }
    let canvas = decode(path).map_err(|reason| TransitionError::Decode {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(canvas.resized(width, height))
}

/// Load a sprite sheet image and describe its frame grid
pub fn load_sprite_sheet(
    path: &Path,
    frame_width: u32,
    frame_height: u32,
) -> Result<(Canvas, SpriteSheet), AnimationError> {
    if !path.exists() {
        return Err(AnimationError::SheetNotFound(path.to_path_buf()));
    }
    let canvas = decode(path).map_err(|reason| AnimationError::SheetDecode {
        path: path.to_path_buf(),
        reason,
    })?;
    let sheet = SpriteSheet::new(canvas.width(), canvas.height(), frame_width, frame_height);
    Ok((canvas, sheet))
}

/// Sequence of PNG frames played back like a video clip
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<PathBuf>,
    cursor: usize,
    width: u32,
    height: u32,
}

impl FrameSequence {
    /// Open a directory of frames, sorted by file name. The first frame is
    /// decoded up front so an unreadable sequence fails here, not mid-playback.
    pub fn open(dir: &Path, width: u32, height: u32) -> Result<Self, TransitionError> {
        if !dir.is_dir() {
            return Err(TransitionError::AssetNotFound(dir.to_path_buf()));
        }
        let entries = std::fs::read_dir(dir).map_err(|e| TransitionError::Decode {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("png"))
            })
            .collect();
        frames.sort();

        let Some(first) = frames.first() else {
            return Err(TransitionError::Decode {
                path: dir.to_path_buf(),
                reason: "no PNG frames".to_string(),
            });
        };
        decode(first).map_err(|reason| TransitionError::Decode {
            path: first.clone(),
            reason,
        })?;

        Ok(Self {
            frames,
            cursor: 0,
            width,
            height,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Skip `steps - 1` frames and decode the next one. At the end the
    /// sequence rewinds when `looping`, otherwise it yields nothing more.
    pub fn advance(&mut self, steps: usize, looping: bool) -> Option<Canvas> {
        let steps = steps.max(1);
        let mut target = self.cursor + steps - 1;
        if target >= self.frames.len() {
            if !looping {
                self.cursor = self.frames.len();
                return None;
            }
            target %= self.frames.len();
        }
        self.cursor = target + 1;
        if self.cursor >= self.frames.len() && looping {
            self.cursor = 0;
        }
        match decode(&self.frames[target]) {
            Ok(frame) => Some(frame.resized(self.width, self.height)),
            Err(reason) => {
                warn!("Skipping frame {}: {reason}", self.frames[target].display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgb;

    fn write_frames(dir: &Path, colors: &[Rgb]) {
        for (i, c) in colors.iter().enumerate() {
            Canvas::filled(4, 4, *c)
                .save_png(&dir.join(format!("frame_{i:03}.png")))
                .unwrap();
        }
    }

    #[test]
    fn test_missing_assets() {
        let missing = Path::new("/definitely/not/here.png");
        assert!(matches!(
            load_image(missing, 10, 10),
            Err(TransitionError::AssetNotFound(_))
        ));
        assert!(matches!(
            load_sprite_sheet(missing, 32, 32),
            Err(AnimationError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(
            load_image(&path, 10, 10),
            Err(TransitionError::Decode { .. })
        ));
    }

    #[test]
    fn test_sprite_sheet_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        Canvas::filled(64, 48, Rgb::WHITE).save_png(&path).unwrap();
        let (canvas, sheet) = load_sprite_sheet(&path, 32, 48).unwrap();
        assert_eq!(canvas.width(), 64);
        assert!(sheet.frame(1, 0, false).is_ok());
        assert!(sheet.frame(2, 0, false).is_err());
    }

    #[test]
    fn test_sequence_steps_and_loops() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &[Rgb::RED, Rgb::GREEN, Rgb::BLUE]);
        let mut seq = FrameSequence::open(dir.path(), 4, 4).unwrap();
        assert_eq!(seq.len(), 3);

        let f = seq.advance(2, true).unwrap();
        assert_eq!(f.pixel(0, 0).unwrap().rgb(), Rgb::GREEN);
        let f = seq.advance(1, true).unwrap();
        assert_eq!(f.pixel(0, 0).unwrap().rgb(), Rgb::BLUE);
        let f = seq.advance(1, true).unwrap();
        assert_eq!(f.pixel(0, 0).unwrap().rgb(), Rgb::RED);
    }

    #[test]
    fn test_sequence_without_loop_runs_out() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &[Rgb::RED, Rgb::GREEN]);
        let mut seq = FrameSequence::open(dir.path(), 4, 4).unwrap();
        assert!(seq.advance(1, false).is_some());
        assert!(seq.advance(1, false).is_some());
        assert!(seq.advance(1, false).is_none());
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FrameSequence::open(dir.path(), 4, 4),
            Err(TransitionError::Decode { .. })
        ));
    }
}
