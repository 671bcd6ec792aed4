//! Horizontal value slider with a change callback

use glam::Vec2;

use crate::Rgb;
use crate::renderer::Canvas;
use crate::sim::Aabb;

const HANDLE_WIDTH: f32 = 20.0;
const TRACK_COLOR: Rgb = Rgb::GRAY;
const FILL_COLOR: Rgb = Rgb(0, 150, 255);

pub type ChangeCallback = Box<dyn FnMut(f32)>;

pub struct Slider {
    pub rect: Aabb,
    pub label: String,
    min: f32,
    max: f32,
    value: f32,
    dragging: bool,
    on_change: Option<ChangeCallback>,
}

impl Slider {
    pub fn new(rect: Aabb, min: f32, max: f32, value: f32, label: impl Into<String>) -> Self {
        Self {
            rect,
            label: label.into(),
            min,
            max,
            value: value.clamp(min, max),
            dragging: false,
            on_change: None,
        }
    }

    pub fn on_change(mut self, callback: impl FnMut(f32) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Position without firing the callback (e.g. after loading settings)
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn progress(&self) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            (self.value - self.min) / span
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn handle_rect(&self) -> Aabb {
        let x = self.rect.left() + self.progress() * (self.rect.size.x - HANDLE_WIDTH);
        Aabb::new(x, self.rect.top() - 5.0, HANDLE_WIDTH, self.rect.size.y + 10.0)
    }

    fn set_from_pointer(&mut self, x: f32) {
        let progress = ((x - self.rect.left()) / self.rect.size.x).clamp(0.0, 1.0);
        self.value = self.min + progress * (self.max - self.min);
        if let Some(cb) = self.on_change.as_mut() {
            cb(self.value);
        }
    }

    /// Returns true when the press landed on the slider
    pub fn pointer_down(&mut self, pos: Vec2) -> bool {
        if self.handle_rect().contains_point(pos) {
            self.dragging = true;
            true
        } else if self.rect.contains_point(pos) {
            self.set_from_pointer(pos.x);
            true
        } else {
            false
        }
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        if self.dragging {
            self.set_from_pointer(pos.x);
        }
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Label with the value as a percentage, e.g. "Music: 50%"
    pub fn caption(&self) -> String {
        format!("{}: {}%", self.label, (self.value * 100.0) as i32)
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let r = self.rect;
        let (x, y, w, h) = (r.pos.x as i32, r.pos.y as i32, r.size.x as i32, r.size.y as i32);
        canvas.fill_rect(x, y, w, h, TRACK_COLOR, 255);
        canvas.fill_rect(x, y, (self.progress() * r.size.x) as i32, h, FILL_COLOR, 255);
        let handle = self.handle_rect();
        let color = if self.dragging { Rgb(200, 200, 200) } else { Rgb::WHITE };
        canvas.fill_rect(
            handle.pos.x as i32,
            handle.pos.y as i32,
            handle.size.x as i32,
            handle.size.y as i32,
            color,
            255,
        );
    }
}
