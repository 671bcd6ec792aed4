//! Short-lived notification banners

use crate::Rgb;
use crate::renderer::Canvas;

const MAX_TOASTS: usize = 5;
const TOAST_ORIGIN: (i32, i32) = (640, 20);
const TOAST_ROW: i32 = 22;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub color: Rgb,
    pub time_left: f32,
    pub duration: f32,
}

impl Toast {
    /// Fades over the last half second
    pub fn alpha(&self) -> u8 {
        (self.time_left / 0.5).clamp(0.0, 1.0).mul_add(255.0, 0.0) as u8
    }
}

#[derive(Debug, Clone, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, text: impl Into<String>, color: Rgb, duration: f32) {
        if self.items.len() == MAX_TOASTS {
            self.items.remove(0);
        }
        self.items.push(Toast {
            text: text.into(),
            color,
            time_left: duration,
            duration,
        });
    }

    pub fn update(&mut self, dt: f32) {
        self.items.retain_mut(|t| {
            t.time_left -= dt;
            t.time_left > 0.0
        });
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn latest(&self) -> Option<&str> {
        self.items.last().map(|t| t.text.as_str())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        for (i, t) in self.items.iter().enumerate() {
            let w = t.text.len() as i32 * 7 + 12;
            let y = TOAST_ORIGIN.1 + i as i32 * TOAST_ROW;
            canvas.fill_rect(TOAST_ORIGIN.0, y, w, TOAST_ROW - 4, Rgb::DARK_GRAY, t.alpha());
            canvas.fill_rect(TOAST_ORIGIN.0, y, 4, TOAST_ROW - 4, t.color, t.alpha());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_and_cap() {
        let mut toasts = Toasts::default();
        for i in 0..7 {
            toasts.push(format!("t{i}"), Rgb::WHITE, 1.0 + i as f32);
        }
        assert_eq!(toasts.items().len(), MAX_TOASTS);
        assert_eq!(toasts.items()[0].text, "t2");
        toasts.update(3.5);
        assert_eq!(toasts.items().len(), 3);
        assert_eq!(toasts.latest(), Some("t6"));
    }

    #[test]
    fn test_fade_tail() {
        let mut toasts = Toasts::default();
        toasts.push("x", Rgb::WHITE, 2.0);
        assert_eq!(toasts.items()[0].alpha(), 255);
        toasts.update(1.75);
        assert_eq!(toasts.items()[0].alpha(), 127);
    }
}
