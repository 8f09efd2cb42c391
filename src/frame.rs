// Frame - immutable 8-bit BGR raster consumed by every analysis operation
//
// Pixels are stored row-major as `[blue, green, red]` triples, matching the
// channel order delivered by the capture shell. Conversions to and from the
// `image` crate swap channels at the boundary so analysis code never has to.

use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};

use crate::error::AnalysisError;

/// One pixel in blue, green, red order
pub type Bgr = [u8; 3];

/// Immutable 2-D grid of BGR pixels with width and height >= 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Bgr>,
}

impl Frame {
    /// Build a frame from row-major BGR pixels
    ///
    /// # Errors
    /// * `EmptyFrame` if either dimension is zero
    /// * `BufferMismatch` if `pixels.len() != width * height`
    pub fn new(width: u32, height: u32, pixels: Vec<Bgr>) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyFrame { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(AnalysisError::BufferMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame filled with a single BGR colour
    pub fn filled(width: u32, height: u32, bgr: Bgr) -> Result<Self, AnalysisError> {
        Self::new(width, height, vec![bgr; width as usize * height as usize])
    }

    /// Build a frame from interleaved BGR bytes (3 bytes per pixel)
    pub fn from_bgr_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, AnalysisError> {
        if bytes.len() % 3 != 0 {
            return Err(AnalysisError::BufferMismatch {
                expected: width as usize * height as usize * 3,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::new(width, height, pixels)
    }

    /// Convert an RGB image into a BGR frame
    pub fn from_rgb_image(image: &RgbImage) -> Result<Self, AnalysisError> {
        let pixels = image.pixels().map(|p| [p[2], p[1], p[0]]).collect();
        Self::new(image.width(), image.height(), pixels)
    }

    /// Convert any decoded image into a BGR frame (alpha is discarded)
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, AnalysisError> {
        Self::from_rgb_image(&image.to_rgb8())
    }

    /// Decode an encoded image buffer (PNG, JPEG, ...)
    pub fn decode(bytes: &[u8]) -> Result<Self, AnalysisError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_dynamic(&image)
    }

    /// Convert back to an RGB image for encoding or display
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width, self.height);
        for (dst, src) in out.pixels_mut().zip(&self.pixels) {
            *dst = image::Rgb([src[2], src[1], src[0]]);
        }
        out
    }

    /// Resample to the given size with a triangle filter
    ///
    /// The live installation analysed frames at 640x480; callers that feed
    /// larger captures usually shrink them first.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyFrame { width, height });
        }
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let rgb = image::imageops::resize(&self.to_rgb_image(), width, height, FilterType::Triangle);
        Self::from_rgb_image(&rgb)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total pixel count (always >= 1)
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Frames are never empty; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major pixel slice
    pub fn pixels(&self) -> &[Bgr] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`
    pub fn pixel(&self, x: u32, y: u32) -> Bgr {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

pub(crate) const BLACK: Bgr = [0, 0, 0];
pub(crate) const WHITE: Bgr = [255, 255, 255];
pub(crate) const LIGHT_GRAY: Bgr = [200, 200, 200];
pub(crate) const GREEN: Bgr = [0, 255, 0];
pub(crate) const RED: Bgr = [0, 0, 255];

/// Drawing colour of a BGR pixel
#[inline]
pub(crate) fn rgb(bgr: Bgr) -> Rgb<u8> {
    Rgb([bgr[2], bgr[1], bgr[0]])
}

/// Blank RGB canvas for drawing an artifact with `imageproc`
pub(crate) fn canvas(width: u32, height: u32, fill: Bgr) -> RgbImage {
    RgbImage::from_pixel(width, height, rgb(fill))
}

impl Frame {
    /// Artifact frame from a canvas sized like an analysed frame
    ///
    /// Canvases are always created from a valid frame's dimensions, so the
    /// size checks of [`Frame::new`] cannot fail here.
    pub(crate) fn from_canvas(image: &RgbImage) -> Frame {
        Frame {
            width: image.width(),
            height: image.height(),
            pixels: image.pixels().map(|p| [p[2], p[1], p[0]]).collect(),
        }
    }

    /// Artifact frame with this frame's dimensions
    pub(crate) fn same_size(&self, pixels: Vec<Bgr>) -> Frame {
        debug_assert_eq!(pixels.len(), self.pixels.len());
        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}
