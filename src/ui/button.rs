//! Clickable button with hover/press easing and a cooldown overlay

use glam::Vec2;

use crate::Rgb;
use crate::renderer::Canvas;
use crate::sim::Aabb;

const HOVER_EASE: f32 = 0.13;
const SCALE_EASE: f32 = 0.08;
const PRESS_DURATION: f32 = 0.12;
const PRESS_SCALE: f32 = 0.92;
const HOVER_GROWTH: f32 = 0.05;
const INACTIVE_COLOR: Rgb = Rgb::GRAY;

#[derive(Debug, Clone)]
pub struct Button {
    pub rect: Aabb,
    pub label: String,
    pub color: Rgb,
    pub hover_color: Rgb,
    pub tooltip: String,
    pub hotkey: String,
    active: bool,
    cooldown: f32,
    max_cooldown: f32,
    hover_t: f32,
    scale_t: f32,
    press_timer: f32,
}

impl Button {
    pub fn new(rect: Aabb, label: impl Into<String>, color: Rgb, hover_color: Rgb) -> Self {
        Self {
            rect,
            label: label.into(),
            color,
            hover_color,
            tooltip: String::new(),
            hotkey: String::new(),
            active: true,
            cooldown: 0.0,
            max_cooldown: 0.0,
            hover_t: 0.0,
            scale_t: 1.0,
            press_timer: 0.0,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn with_hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = hotkey.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn set_cooldown(&mut self, seconds: f32) {
        self.cooldown = seconds.max(0.0);
        self.max_cooldown = self.cooldown;
        self.active = self.cooldown <= 0.0;
    }

    /// Hit test; inactive (cooling down) buttons never report a click
    pub fn is_clicked(&self, pos: Vec2) -> bool {
        self.active && self.rect.contains_point(pos)
    }

    /// Start the press squash
    pub fn press(&mut self) {
        self.press_timer = PRESS_DURATION;
        self.scale_t = (self.scale_t * PRESS_SCALE).max(0.0);
    }

    pub fn update(&mut self, dt: f32, pointer: Vec2) {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
            self.active = false;
            if self.cooldown <= 0.0 {
                self.cooldown = 0.0;
                self.max_cooldown = 0.0;
                self.active = true;
            }
        } else {
            self.active = true;
        }

        let hovering = self.active && self.rect.contains_point(pointer);
        let target = if hovering { 1.0 } else { 0.0 };
        self.hover_t += (target - self.hover_t) * (dt / HOVER_EASE).min(1.0);

        if self.press_timer > 0.0 {
            self.press_timer = (self.press_timer - dt).max(0.0);
        }

        let hover_scale = 1.0 + HOVER_GROWTH * self.hover_t;
        let target_scale = hover_scale * if self.press_timer > 0.0 { PRESS_SCALE } else { 1.0 };
        self.scale_t += (target_scale - self.scale_t) * (dt / SCALE_EASE).min(1.0);
    }

    /// Rectangle after hover/press scaling, centered on the layout rect
    pub fn scaled_rect(&self) -> Aabb {
        let size = self.rect.size * self.scale_t;
        Aabb {
            pos: self.rect.center() - size / 2.0,
            size,
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let fill = if self.active {
            self.color.lerp(self.hover_color, self.hover_t)
        } else {
            INACTIVE_COLOR
        };
        let r = self.scaled_rect();
        let (x, y, w, h) = (r.pos.x as i32, r.pos.y as i32, r.size.x as i32, r.size.y as i32);
        canvas.fill_rect(x, y, w, h, fill, 255);
        canvas.stroke_rect(x, y, w, h, Rgb::WHITE);

        // Remaining cooldown darkens the button from the right
        if self.cooldown > 0.0 && self.max_cooldown > 0.0 {
            let remaining = (self.cooldown / self.max_cooldown).clamp(0.0, 1.0);
            let shade = (w as f32 * remaining) as i32;
            canvas.fill_rect(x + w - shade, y, shade, h, Rgb::BLACK, 180);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> Button {
        Button::new(Aabb::new(10.0, 10.0, 100.0, 40.0), "HACK", Rgb::DARK_BLUE, Rgb::BLUE)
    }

    #[test]
    fn test_click_hit_test() {
        let b = button();
        assert!(b.is_clicked(Vec2::new(50.0, 30.0)));
        assert!(!b.is_clicked(Vec2::new(5.0, 30.0)));
    }

    #[test]
    fn test_cooldown_blocks_clicks_until_expired() {
        let mut b = button();
        b.set_cooldown(1.0);
        assert!(!b.is_clicked(Vec2::new(50.0, 30.0)));
        b.update(0.6, Vec2::ZERO);
        assert!(!b.is_active());
        b.update(0.6, Vec2::ZERO);
        assert!(b.is_active());
        assert_eq!(b.cooldown(), 0.0);
        assert!(b.is_clicked(Vec2::new(50.0, 30.0)));
    }

    #[test]
    fn test_hover_grows_and_press_squashes() {
        let mut b = button();
        let inside = Vec2::new(50.0, 30.0);
        for _ in 0..30 {
            b.update(1.0 / 60.0, inside);
        }
        assert!(b.scaled_rect().size.x > 100.0);
        b.press();
        b.update(1.0 / 60.0, inside);
        assert!(b.scaled_rect().size.x < 105.0);
    }

    #[test]
    fn test_draw_fills_rect() {
        let mut canvas = Canvas::filled(120, 60, Rgb::BLACK);
        button().draw(&mut canvas);
        assert_eq!(canvas.pixel(50, 30).unwrap().rgb(), Rgb::DARK_BLUE);
        assert_eq!(canvas.pixel(10, 10).unwrap().rgb(), Rgb::WHITE);
    }
}
