//! Menu widgets polled once per frame by the scenes

pub mod button;
pub mod slider;

pub use button::Button;
pub use slider::Slider;
