use image::RgbaImage;
use thiserror::Error;

const CHANNELS: usize = 4;
const COLOR_CHANNELS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Mutable RGBA view over a raw row-major byte buffer.
pub struct PixelGrid<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> PixelGrid<'a> {
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Result<Self, GridError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(GridError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width: width as usize,
            height: height as usize,
        })
    }

    fn index(&self, x: usize, y: usize, channel: usize) -> usize {
        (y * self.width + x) * CHANNELS + channel
    }

    fn get(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[self.index(x, y, channel)]
    }

    fn set(&mut self, x: usize, y: usize, channel: usize, value: u8) {
        let i = self.index(x, y, channel);
        self.data[i] = value;
    }

    /// Neighbour-average sharpening.
    ///
    /// For every interior pixel and each colour channel the value is pushed
    /// away from the mean of its four axis neighbours by
    /// `(value - mean) * amount / 10`, rounded half-to-even and clamped to
    /// `0..=255`. This is not a Laplacian kernel: the scan runs in place in
    /// raster order, so the left and upper neighbours have already been
    /// sharpened when a pixel is visited. The one-pixel border and the alpha
    /// channel are never written.
    pub fn sharpen_neighbor_average(&mut self, amount: f32) {
        let factor = amount / 10.0;
        if factor <= 0.0 || self.width < 3 || self.height < 3 {
            return;
        }
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                for c in 0..COLOR_CHANNELS {
                    let current = self.get(x, y, c) as f32;
                    let neighbors = (self.get(x - 1, y, c) as f32
                        + self.get(x + 1, y, c) as f32
                        + self.get(x, y - 1, c) as f32
                        + self.get(x, y + 1, c) as f32)
                        / 4.0;
                    let sharpened = current + (current - neighbors) * factor;
                    self.set(x, y, c, sharpened.clamp(0.0, 255.0).round_ties_even() as u8);
                }
            }
        }
    }
}

/// Sharpens `img` in place; `amount` is the 0..=10 slider value.
pub fn apply(img: &mut RgbaImage, amount: f32) -> Result<(), GridError> {
    if amount <= 0.0 {
        return Ok(());
    }
    let (width, height) = img.dimensions();
    let mut grid = PixelGrid::new(&mut **img, width, height)?;
    grid.sharpen_neighbor_average(amount);
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba, RgbaImage};

    use super::{GridError, PixelGrid, apply};

    fn edge_image() -> RgbaImage {
        ImageBuffer::from_fn(6, 5, |x, _y| {
            if x < 3 {
                Rgba([50, 60, 70, 255])
            } else {
                Rgba([200, 190, 180, 128])
            }
        })
    }

    #[test]
    fn zero_sharpness_is_identity() {
        let mut img = edge_image();
        let before = img.clone();
        apply(&mut img, 0.0).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn flat_regions_are_unchanged() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(5, 5, Rgba([128, 128, 128, 255]));
        let before = img.clone();
        apply(&mut img, 10.0).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn edges_gain_contrast_and_borders_stay() {
        let mut img = edge_image();
        let before = img.clone();
        apply(&mut img, 10.0).unwrap();
        // Dark side of the edge darkens, bright side brightens.
        assert!(img.get_pixel(2, 2)[0] < 50);
        assert!(img.get_pixel(3, 2)[0] > 200);
        for x in 0..6 {
            assert_eq!(img.get_pixel(x, 0), before.get_pixel(x, 0));
            assert_eq!(img.get_pixel(x, 4), before.get_pixel(x, 4));
        }
        for y in 0..5 {
            assert_eq!(img.get_pixel(0, y), before.get_pixel(0, y));
            assert_eq!(img.get_pixel(5, y), before.get_pixel(5, y));
        }
    }

    #[test]
    fn alpha_is_never_touched() {
        let mut img = edge_image();
        apply(&mut img, 7.5).unwrap();
        assert_eq!(img.get_pixel(3, 2)[3], 128);
        assert_eq!(img.get_pixel(2, 2)[3], 255);
    }

    #[test]
    fn scan_reads_already_sharpened_neighbors() {
        // Single bright column at x = 2 in a 5x3 image, factor 1.
        let mut data: Vec<u8> = Vec::new();
        for _y in 0..3 {
            for x in 0..5 {
                let v = if x == 2 { 100 } else { 0 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let mut grid = PixelGrid::new(&mut data, 5, 3).unwrap();
        grid.sharpen_neighbor_average(10.0);
        let red = |x: usize| data[(5 + x) * 4];
        // x=1: 0 + (0 - 25) -> clamped 0.
        assert_eq!(red(1), 0);
        // x=2: neighbours (0 + 0 + 100 + 100) / 4 = 50 -> 100 + 50 = 150.
        assert_eq!(red(2), 150);
        // x=3: left neighbour is now 150 -> (150 + 0 + 0 + 0) / 4 = 37.5 -> 0 - 37.5 -> 0.
        assert_eq!(red(3), 0);
    }

    #[test]
    fn ties_round_to_even() {
        // Centre 2, neighbours 0, 0, 0, 6 -> mean 1.5, factor 1 -> 2.5 -> 2.
        let mut data = vec![0u8; 3 * 3 * 4];
        data[(3 + 1) * 4] = 2;
        data[(6 + 1) * 4] = 6;
        let mut grid = PixelGrid::new(&mut data, 3, 3).unwrap();
        grid.sharpen_neighbor_average(10.0);
        assert_eq!(data[(3 + 1) * 4], 2);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let mut data = vec![0u8; 10];
        let err = PixelGrid::new(&mut data, 2, 2).err();
        assert_eq!(
            err,
            Some(GridError::LengthMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 10
            })
        );
    }
}
