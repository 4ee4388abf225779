//! Provides the heap-allocated image type.

use alloc::vec::Vec;

use crate::{PngError, PngResult, RGBA8};

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
///
/// You don't ever need to call this function yourself, but it's how the image
/// container converts 2d coordinates into index values within its pixel
/// vector.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  (y as usize) * (width as usize) + (x as usize)
}

/// A direct-color image.
///
/// Pixels are stored left to right, top to bottom, with no padding between
/// rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct Bitmap<P> {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<P>,
}
impl<P: Clone> Bitmap<P> {
  /// Allocates a new bitmap with every pixel set to `fill`.
  ///
  /// ## Failure
  /// * `Alloc` if the allocator can't provide the space.
  pub fn try_new_filled(width: u32, height: u32, fill: P) -> PngResult<Self> {
    let count = (width as usize).checked_mul(height as usize).ok_or(PngError::DimensionsTooLarge)?;
    let mut pixels: Vec<P> = Vec::new();
    pixels.try_reserve_exact(count)?;
    pixels.resize(count, fill);
    Ok(Self { width, height, pixels })
  }
}
impl<P> Bitmap<P> {
  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&P> {
    if x < self.width && y < self.height {
      self.pixels.get(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut P> {
    if x < self.width && y < self.height {
      self.pixels.get_mut(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }
}

impl Bitmap<RGBA8> {
  /// Attempts to make an image from PNG bytes.
  ///
  /// This is the same as calling [`decode_png`](crate::decode_png).
  #[inline]
  pub fn try_from_png_bytes(bytes: &[u8]) -> PngResult<Self> {
    crate::decode_png(bytes)
  }

  /// Encodes the image as PNG bytes.
  ///
  /// This is the same as calling [`encode_png`](crate::encode_png).
  #[inline]
  pub fn to_png_bytes(&self) -> PngResult<Vec<u8>> {
    crate::encode_png(self.width, self.height, &self.pixels)
  }
}

#[test]
fn test_bitmap_get() {
  let mut bitmap = Bitmap::try_new_filled(3, 2, 0_u8).unwrap();
  *bitmap.get_mut(2, 1).unwrap() = 7;
  assert_eq!(bitmap.pixels, [0, 0, 0, 0, 0, 7]);
  assert_eq!(bitmap.get(2, 1), Some(&7));
  assert_eq!(bitmap.get(3, 0), None);
  assert_eq!(bitmap.get(0, 2), None);
}
