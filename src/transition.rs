//! Two-phase scene transitions
//!
//! `Inactive -> In -> Out -> Complete`. Progress rises at `speed / 255` per
//! second. Crossing 0.5 during `In` announces the state change (exactly once)
//! and flips to `Out`; reaching 1.0 during `Out` completes the transition and
//! releases any decoded frames. While active, the caller suppresses normal
//! scene updates.

use std::path::PathBuf;

use glam::Vec2;
use log::{info, warn};

use crate::Rgb;
use crate::error::TransitionError;
use crate::renderer::Canvas;
use crate::renderer::frames::{FrameSequence, load_image};
use crate::sim::Easing;

pub const DEFAULT_SPEED: f32 = 300.0;
pub const DEFAULT_VIDEO_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircleMode {
    /// Coloured disc grows from the centre
    Expand,
    /// Colour closes in around a shrinking hole
    Contract,
}

/// Visual style plus its style-specific parameters
#[derive(Debug, Clone)]
pub enum TransitionKind {
    FadeColor {
        color: Rgb,
    },
    FadeImage {
        path: PathBuf,
    },
    /// Directory of numbered PNG frames. `speed` frames are consumed per update.
    FadeVideo {
        path: PathBuf,
        speed: f32,
        looping: bool,
    },
    Slide {
        direction: SlideDirection,
        color: Rgb,
        surface: Option<Canvas>,
    },
    Wipe {
        direction: WipeDirection,
        color: Rgb,
    },
    Circle {
        mode: CircleMode,
        color: Rgb,
        /// Defaults to the screen centre
        center: Option<Vec2>,
    },
}

impl TransitionKind {
    pub fn fade(color: Rgb) -> Self {
        TransitionKind::FadeColor { color }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransitionKind::FadeColor { .. } => "fade_color",
            TransitionKind::FadeImage { .. } => "fade_image",
            TransitionKind::FadeVideo { .. } => "fade_video",
            TransitionKind::Slide { .. } => "slide",
            TransitionKind::Wipe { .. } => "wipe",
            TransitionKind::Circle { .. } => "circle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    Inactive,
    In,
    Out,
    Complete,
}

pub type StateChangeCallback<T> = Box<dyn FnOnce(&T)>;
pub type CompleteCallback = Box<dyn FnOnce()>;

/// Optional knobs for `TransitionMachine::start`
pub struct TransitionOptions<T> {
    /// Overrides the machine's default speed
    pub speed: Option<f32>,
    pub easing: Easing,
    pub on_state_change: Option<StateChangeCallback<T>>,
    pub on_complete: Option<CompleteCallback>,
}

impl<T> Default for TransitionOptions<T> {
    fn default() -> Self {
        Self {
            speed: None,
            easing: Easing::Linear,
            on_state_change: None,
            on_complete: None,
        }
    }
}

/// Result of one `update` call
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStatus<T> {
    /// Whether the transition was running during this update
    pub active: bool,
    /// The target, on the update where the midpoint was crossed
    pub state_changed: Option<T>,
    pub completed: bool,
    pub phase: TransitionPhase,
    pub progress: f32,
}

/// Decoded per-kind payload held only while active
enum Content {
    None,
    Image(Canvas),
    Video {
        sequence: FrameSequence,
        frame: Option<Canvas>,
        speed: f32,
        looping: bool,
    },
    Surface(Canvas),
}

pub struct TransitionMachine<T> {
    width: u32,
    height: u32,
    default_speed: f32,
    phase: TransitionPhase,
    progress: f32,
    speed: f32,
    easing: Easing,
    target: Option<T>,
    kind: Option<TransitionKind>,
    content: Content,
    on_state_change: Option<StateChangeCallback<T>>,
    on_complete: Option<CompleteCallback>,
}

impl<T: Clone> TransitionMachine<T> {
    pub fn new(width: u32, height: u32, default_speed: f32) -> Self {
        Self {
            width,
            height,
            default_speed,
            phase: TransitionPhase::Inactive,
            progress: 0.0,
            speed: default_speed,
            easing: Easing::Linear,
            target: None,
            kind: None,
            content: Content::None,
            on_state_change: None,
            on_complete: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, TransitionPhase::In | TransitionPhase::Out)
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn kind(&self) -> Option<&TransitionKind> {
        self.kind.as_ref()
    }

    /// Begin a transition toward `target`. On `Err` nothing about the machine
    /// changes: an in-flight transition keeps running, an idle one stays idle.
    pub fn start(
        &mut self,
        target: T,
        kind: TransitionKind,
        options: TransitionOptions<T>,
    ) -> Result<(), TransitionError> {
        if self.is_active() {
            warn!("Transition rejected: already active");
            return Err(TransitionError::AlreadyActive);
        }
        let speed = options.speed.unwrap_or(self.default_speed);
        if speed.is_nan() || speed <= 0.0 {
            return Err(TransitionError::InvalidSpeed(speed));
        }
        let content = self.load_content(&kind).inspect_err(|e| {
            warn!("Transition {} rejected: {e}", kind.name());
        })?;

        info!("Transition {} started (speed {speed})", kind.name());
        self.phase = TransitionPhase::In;
        self.progress = 0.0;
        self.speed = speed;
        self.easing = options.easing;
        self.target = Some(target);
        self.kind = Some(kind);
        self.content = content;
        self.on_state_change = options.on_state_change;
        self.on_complete = options.on_complete;
        Ok(())
    }

    fn load_content(&self, kind: &TransitionKind) -> Result<Content, TransitionError> {
        match kind {
            TransitionKind::FadeImage { path } => {
                if path.as_os_str().is_empty() {
                    return Err(TransitionError::MissingParameter("image_path"));
                }
                Ok(Content::Image(load_image(path, self.width, self.height)?))
            }
            TransitionKind::FadeVideo {
                path,
                speed,
                looping,
            } => {
                if path.as_os_str().is_empty() {
                    return Err(TransitionError::MissingParameter("video_path"));
                }
                let sequence = FrameSequence::open(path, self.width, self.height)?;
                Ok(Content::Video {
                    sequence,
                    frame: None,
                    speed: *speed,
                    looping: *looping,
                })
            }
            TransitionKind::Slide {
                surface: Some(surface),
                ..
            } => Ok(Content::Surface(surface.resized(self.width, self.height))),
            _ => Ok(Content::None),
        }
    }

    pub fn update(&mut self, dt: f32) -> TransitionStatus<T> {
        let mut status = TransitionStatus {
            active: self.is_active(),
            state_changed: None,
            completed: false,
            phase: self.phase,
            progress: self.progress,
        };
        if !status.active {
            return status;
        }

        self.progress += self.speed / 255.0 * dt;

        match self.phase {
            TransitionPhase::In if self.progress >= 0.5 => {
                self.phase = TransitionPhase::Out;
                if let Some(target) = self.target.clone() {
                    if let Some(cb) = self.on_state_change.take() {
                        cb(&target);
                    }
                    status.state_changed = Some(target);
                }
            }
            TransitionPhase::Out if self.progress >= 1.0 => {
                self.complete();
                status.completed = true;
            }
            _ => {}
        }

        if let Content::Video {
            sequence,
            frame,
            speed,
            looping,
        } = &mut self.content
        {
            let steps = (*speed as usize).max(1);
            if let Some(next) = sequence.advance(steps, *looping) {
                *frame = Some(next);
            }
        }

        status.phase = self.phase;
        status.progress = self.progress;
        status
    }

    fn complete(&mut self) {
        self.phase = TransitionPhase::Complete;
        self.progress = 1.0;
        self.content = Content::None;
        self.on_state_change = None;
        info!(
            "Transition {} complete",
            self.kind.as_ref().map_or("?", |k| k.name())
        );
        if let Some(cb) = self.on_complete.take() {
            cb();
        }
    }

    /// Drop any loaded content and go idle without firing callbacks
    pub fn clear(&mut self) {
        self.phase = TransitionPhase::Inactive;
        self.progress = 0.0;
        self.content = Content::None;
        self.on_state_change = None;
        self.on_complete = None;
    }

    fn eased(&self) -> f32 {
        self.easing.apply(self.progress)
    }

    /// Triangular alpha: 0 -> 255 over `In`, 255 -> 0 over `Out`
    pub fn alpha(&self) -> u8 {
        let eased = self.eased();
        let alpha = match self.phase {
            TransitionPhase::In => eased * 2.0 * 255.0,
            TransitionPhase::Out => (2.0 - eased * 2.0) * 255.0,
            _ => 0.0,
        };
        alpha.clamp(0.0, 255.0) as u8
    }

    /// Top-left of the sliding surface
    pub fn slide_offset(&self) -> Vec2 {
        let p = self.eased();
        let (w, h) = (self.width as f32, self.height as f32);
        match &self.kind {
            Some(TransitionKind::Slide { direction, .. }) => match direction {
                SlideDirection::Left => Vec2::new(-w + p * w, 0.0),
                SlideDirection::Right => Vec2::new(w - p * w, 0.0),
                SlideDirection::Up => Vec2::new(0.0, -h + p * h),
                SlideDirection::Down => Vec2::new(0.0, h - p * h),
            },
            _ => Vec2::ZERO,
        }
    }

    /// Half the screen diagonal plus a margin so the circle clears the corners
    pub fn max_circle_radius(&self) -> f32 {
        let (w, h) = (self.width as f32, self.height as f32);
        ((w * w + h * h).sqrt() / 2.0).trunc() + 50.0
    }

    pub fn circle_radius(&self) -> f32 {
        let p = self.eased();
        match &self.kind {
            Some(TransitionKind::Circle { mode, .. }) => match mode {
                CircleMode::Expand => (p * self.max_circle_radius()).trunc(),
                CircleMode::Contract => ((1.0 - p) * self.max_circle_radius()).trunc(),
            },
            _ => 0.0,
        }
    }

    /// Covered strip `(x, width)` of a wipe
    pub fn wipe_span(&self) -> (i32, i32) {
        let width = (self.width as f32 * self.eased()) as i32;
        match &self.kind {
            Some(TransitionKind::Wipe {
                direction: WipeDirection::Right,
                ..
            }) => (self.width as i32 - width, width),
            _ => (0, width),
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if !self.is_active() {
            return;
        }
        let alpha = self.alpha();
        let Some(kind) = &self.kind else {
            return;
        };
        match kind {
            TransitionKind::FadeColor { color } => {
                if alpha > 0 {
                    canvas.fill_rect(0, 0, self.width as i32, self.height as i32, *color, alpha);
                }
            }
            TransitionKind::FadeImage { .. } => {
                if let Content::Image(img) = &self.content {
                    canvas.blit(img, 0, 0, alpha);
                }
            }
            TransitionKind::FadeVideo { .. } => {
                if let Content::Video {
                    frame: Some(frame), ..
                } = &self.content
                {
                    canvas.blit(frame, 0, 0, alpha);
                }
            }
            TransitionKind::Slide { color, .. } => {
                let offset = self.slide_offset();
                let (x, y) = (offset.x as i32, offset.y as i32);
                match &self.content {
                    Content::Surface(surface) => canvas.blit(surface, x, y, 255),
                    _ => canvas.fill_rect(x, y, self.width as i32, self.height as i32, *color, 255),
                }
            }
            TransitionKind::Wipe { color, .. } => {
                let (x, width) = self.wipe_span();
                if width > 0 {
                    canvas.fill_rect(x, 0, width, self.height as i32, *color, alpha);
                }
            }
            TransitionKind::Circle {
                mode,
                color,
                center,
            } => {
                let center = center
                    .unwrap_or(Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0));
                let radius = self.circle_radius();
                match mode {
                    CircleMode::Expand => canvas.fill_circle(center, radius, *color, alpha),
                    CircleMode::Contract => {
                        canvas.fill_outside_circle(center, radius, *color, alpha)
                    }
                }
            }
        }
    }
}
