#![allow(dead_code)]

use ec_core::Image;

/// `left` for columns `< at`, `right` from column `at` on.
pub fn vertical_step(width: usize, height: usize, at: usize, left: u8, right: u8) -> Image<u8> {
    let mut data = vec![left; width * height];
    for y in 0..height {
        for x in at..width {
            data[y * width + x] = right;
        }
    }
    Image::from_vec(width, height, data).expect("valid image")
}

/// Bright disc on a dark background with a mild horizontal ramp.
pub fn disc(width: usize, height: usize, radius: f32) -> Image<u8> {
    let cx = 0.5 * width as f32;
    let cy = 0.5 * height as f32;
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let base = (x * 40 / width.max(1)) as u8;
            data[y * width + x] = if dx * dx + dy * dy <= radius * radius {
                200 + base / 2
            } else {
                10 + base
            };
        }
    }
    Image::from_vec(width, height, data).expect("valid image")
}
