//! Software RGBA surface
//!
//! Everything the scenes and transitions draw lands here. Pixels are plain
//! `#[repr(C)]` RGBA8 so the buffer can be handed to an image encoder or a
//! presentation layer as raw bytes.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use image::{RgbaImage, imageops};

use crate::Rgb;
use crate::sim::FrameRect;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn opaque(c: Rgb) -> Self {
        Self {
            r: c.0,
            g: c.1,
            b: c.2,
            a: 255,
        }
    }

    pub fn rgb(self) -> Rgb {
        Rgb(self.r, self.g, self.b)
    }

    /// Source-over blend of `src` with coverage `alpha` (0-255)
    #[inline]
    fn blend(self, src: Rgb, alpha: u8) -> Pixel {
        if alpha == 255 {
            return Pixel::opaque(src);
        }
        let a = alpha as u32;
        let mix = |d: u8, s: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
        Pixel {
            r: mix(self.r, src.0),
            g: mix(self.g, src.1),
            b: mix(self.b, src.2),
            a: self.a.max(alpha),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Canvas {
    /// Fully transparent canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::default(); (width * height) as usize],
        }
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::opaque(color); (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Raw RGBA8 bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(Pixel::opaque(color));
    }

    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb, alpha: u8) {
        if alpha == 0 || x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.pixels[idx] = self.pixels[idx].blend(color, alpha);
    }

    /// Blend a rectangle, clipped to the canvas
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb, alpha: u8) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color, alpha);
            }
        }
    }

    /// One-pixel outline
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        self.fill_rect(x, y, w, 1, color, 255);
        self.fill_rect(x, y + h - 1, w, 1, color, 255);
        self.fill_rect(x, y, 1, h, color, 255);
        self.fill_rect(x + w - 1, y, 1, h, color, 255);
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        let x0 = (center.x - radius).floor().max(0.0) as i32;
        let y0 = (center.y - radius).floor().max(0.0) as i32;
        let x1 = ((center.x + radius).ceil() as i32).min(self.width as i32 - 1);
        let y1 = ((center.y + radius).ceil() as i32).min(self.height as i32 - 1);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center;
                if d.length_squared() <= r2 {
                    self.blend_pixel(px, py, color, alpha);
                }
            }
        }
    }

    /// Cover everything except a circular hole
    pub fn fill_outside_circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8) {
        let r2 = radius.max(0.0) * radius.max(0.0);
        for py in 0..self.height as i32 {
            for px in 0..self.width as i32 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center;
                if d.length_squared() > r2 {
                    self.blend_pixel(px, py, color, alpha);
                }
            }
        }
    }

    /// Draw `src` at (x, y), scaling each source pixel's alpha by `alpha`
    pub fn blit(&mut self, src: &Canvas, x: i32, y: i32, alpha: u8) {
        let region = FrameRect {
            x: 0,
            y: 0,
            w: src.width,
            h: src.height,
            flip_x: false,
        };
        self.blit_region(src, region, x, y, alpha);
    }

    /// Draw one frame of a sprite sheet at (x, y)
    pub fn blit_region(&mut self, src: &Canvas, region: FrameRect, x: i32, y: i32, alpha: u8) {
        for sy in 0..region.h {
            for sx in 0..region.w {
                let col = if region.flip_x { region.w - 1 - sx } else { sx };
                let Some(p) = src.pixel(region.x + col, region.y + sy) else {
                    continue;
                };
                let a = (p.a as u32 * alpha as u32 / 255) as u8;
                self.blend_pixel(x + sx as i32, y + sy as i32, p.rgb(), a);
            }
        }
    }

    pub fn from_image(img: &RgbaImage) -> Self {
        let pixels = img
            .pixels()
            .map(|p| Pixel {
                r: p[0],
                g: p[1],
                b: p[2],
                a: p[3],
            })
            .collect();
        Self {
            width: img.width(),
            height: img.height(),
            pixels,
        }
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.as_bytes().to_vec())
    }

    /// Bilinear resize
    pub fn resized(&self, width: u32, height: u32) -> Canvas {
        if width == self.width && height == self.height {
            return self.clone();
        }
        match self.to_image() {
            Some(img) => {
                Canvas::from_image(&imageops::resize(&img, width, height, imageops::FilterType::Triangle))
            }
            None => Canvas::new(width, height),
        }
    }

    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        match self.to_image() {
            Some(img) => img.save_with_format(path, image::ImageFormat::Png),
            None => Err(image::ImageError::Parameter(
                image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_read() {
        let mut c = Canvas::new(4, 3);
        assert_eq!(c.pixel(0, 0), Some(Pixel::default()));
        c.fill(Rgb::RED);
        assert_eq!(c.pixel(3, 2), Some(Pixel::opaque(Rgb::RED)));
        assert_eq!(c.pixel(4, 0), None);
        assert_eq!(c.as_bytes().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_half_alpha_blend() {
        let mut c = Canvas::filled(1, 1, Rgb::BLACK);
        c.blend_pixel(0, 0, Rgb::WHITE, 128);
        let p = c.pixel(0, 0).unwrap();
        assert_eq!(p.r, 128);
        assert_eq!(p.a, 255);
    }

    #[test]
    fn test_rect_is_clipped() {
        let mut c = Canvas::filled(10, 10, Rgb::BLACK);
        c.fill_rect(-5, -5, 8, 8, Rgb::GREEN, 255);
        assert_eq!(c.pixel(2, 2).unwrap().rgb(), Rgb::GREEN);
        assert_eq!(c.pixel(3, 3).unwrap().rgb(), Rgb::BLACK);
    }

    #[test]
    fn test_circle_and_hole() {
        let mut disc = Canvas::filled(21, 21, Rgb::BLACK);
        disc.fill_circle(Vec2::new(10.5, 10.5), 5.0, Rgb::WHITE, 255);
        assert_eq!(disc.pixel(10, 10).unwrap().rgb(), Rgb::WHITE);
        assert_eq!(disc.pixel(0, 0).unwrap().rgb(), Rgb::BLACK);

        let mut hole = Canvas::filled(21, 21, Rgb::BLACK);
        hole.fill_outside_circle(Vec2::new(10.5, 10.5), 5.0, Rgb::WHITE, 255);
        assert_eq!(hole.pixel(10, 10).unwrap().rgb(), Rgb::BLACK);
        assert_eq!(hole.pixel(0, 0).unwrap().rgb(), Rgb::WHITE);
    }

    #[test]
    fn test_blit_region_flips() {
        let mut sheet = Canvas::new(2, 1);
        sheet.blend_pixel(0, 0, Rgb::RED, 255);
        sheet.blend_pixel(1, 0, Rgb::BLUE, 255);
        let mut dst = Canvas::filled(2, 1, Rgb::BLACK);
        let region = FrameRect {
            x: 0,
            y: 0,
            w: 2,
            h: 1,
            flip_x: true,
        };
        dst.blit_region(&sheet, region, 0, 0, 255);
        assert_eq!(dst.pixel(0, 0).unwrap().rgb(), Rgb::BLUE);
        assert_eq!(dst.pixel(1, 0).unwrap().rgb(), Rgb::RED);
    }

    #[test]
    fn test_image_round_trip_and_resize() {
        let c = Canvas::filled(4, 4, Rgb::YELLOW);
        let back = Canvas::from_image(&c.to_image().unwrap());
        assert_eq!(back, c);
        let big = c.resized(8, 2);
        assert_eq!((big.width(), big.height()), (8, 2));
        assert_eq!(big.pixel(7, 1).unwrap().rgb(), Rgb::YELLOW);
    }
}
