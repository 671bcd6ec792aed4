//! Patrolling guard shown on a security monitor strip

use glam::Vec2;
use log::warn;

use super::animation::{AnimationPlayer, FrameTiming, SpriteSheet};
use super::collision::Aabb;
use super::rng::RandomSource;
use crate::error::AnimationError;
use crate::normalize_degrees;

/// Alert "!" toggles at this period (seconds)
const ALERT_FLASH_PERIOD: f32 = 0.3;

pub const GUARD_FRAME_WIDTH: u32 = 32;
pub const GUARD_FRAME_HEIGHT: u32 = 48;

#[derive(Debug, Clone)]
pub struct Guard {
    pub id: u32,
    /// Seconds for one full patrol loop
    pub period: f32,
    pub elapsed: f32,
    /// Normalized patrol progress in [0, 1)
    pub position: f32,
    pub alert: bool,
    pub alert_time: f32,
    pub alert_flash: bool,
    pub facing_angle: f32,
    pub view_distance: f32,
    pub view_angle: f32,
    /// Monitor strip the guard walks along
    pub route: Aabb,
    animation: Option<AnimationPlayer>,
}

impl Guard {
    pub fn new(id: u32, period: f32, route: Aabb) -> Self {
        Self {
            id,
            period: period.max(0.1),
            elapsed: 0.0,
            position: 0.0,
            alert: false,
            alert_time: 0.0,
            alert_flash: false,
            facing_angle: 0.0,
            view_distance: 220.0,
            view_angle: 60.0,
            route,
            animation: None,
        }
    }

    /// Attach sprite animations. Without them the guard draws as a circle.
    pub fn with_animation(mut self, player: AnimationPlayer) -> Self {
        self.animation = Some(player);
        self
    }

    pub fn set_animation(&mut self, player: Option<AnimationPlayer>) {
        self.animation = player;
    }

    pub fn animation(&self) -> Option<&AnimationPlayer> {
        self.animation.as_ref()
    }

    /// idle / walk / alert clips laid out one per row of a 32x48 guard sheet
    pub fn standard_animations(sheet: &SpriteSheet) -> Result<AnimationPlayer, AnimationError> {
        let mut player = AnimationPlayer::new();
        for (name, row, count, speed) in [("idle", 0, 4, 0.2), ("walk", 1, 6, 0.1), ("alert", 2, 4, 0.15)] {
            player.register_clip(name, sheet.row(row, 0, count, false)?, FrameTiming::Uniform(speed), true, false)?;
        }
        player.play("idle", true, false)?;
        Ok(player)
    }

    /// Start somewhere random along the loop and drop any alert
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.elapsed = rng.range(0.0, self.period);
        self.position = self.elapsed.rem_euclid(self.period) / self.period;
        self.clear_alert();
    }

    pub fn set_alert(&mut self) {
        self.alert = true;
    }

    pub fn clear_alert(&mut self) {
        self.alert = false;
        self.alert_time = 0.0;
        self.alert_flash = false;
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        self.position = self.elapsed.rem_euclid(self.period) / self.period;

        if self.alert {
            self.alert_time += dt;
            self.alert_flash = (self.alert_time / ALERT_FLASH_PERIOD) as u32 % 2 == 0;
        }

        if let Some(anim) = self.animation.as_mut() {
            let wanted = if self.alert { "alert" } else { "idle" };
            if anim.has_clip(wanted) && anim.current_clip() != Some(wanted) {
                if let Err(e) = anim.play(wanted, true, false) {
                    warn!("Guard {} cannot switch animation: {e}", self.id);
                }
            }
            anim.advance(dt);
        }
    }

    /// Point on the monitor strip where the guard currently stands
    pub fn world_position(&self) -> Vec2 {
        Vec2::new(
            self.route.left() + self.position * self.route.size.x,
            self.route.center().y,
        )
    }

    /// Within view distance and half the view cone of the facing angle
    pub fn is_in_sight(&self, point: Vec2) -> bool {
        let delta = point - self.world_position();
        if delta.length() > self.view_distance {
            return false;
        }
        let angle_to_point = delta.y.atan2(delta.x).to_degrees();
        normalize_degrees(angle_to_point - self.facing_angle).abs() <= self.view_angle / 2.0
    }
}
