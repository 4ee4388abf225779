use core::num::TryFromIntError;

/// An error from the `pngsmith` crate.
///
/// Any error aborts the entire decode or encode call that produced it. There
/// are no partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PngError {
  /// The PNG chunk structure is unusable: bad signature, missing or invalid
  /// `IHDR`, an unsupported format (16-bit, interlaced, unknown methods), or
  /// an indexed image without a usable palette.
  MalformedContainer,

  /// The data ended before the decoder had everything it needed.
  TruncatedInput,

  /// The compressed or filtered data is invalid: bad block type, bad stored
  /// block length check, bad Huffman table, unknown filter type, checksum
  /// mismatch, or more (or less) output than the image dimensions allow.
  CorruptStream,

  /// The allocator couldn't give us enough space.
  Alloc,

  /// The declared width and/or height of this image is 0.
  WidthOrHeightZero,

  /// The image is too large.
  ///
  /// Width and height are limited to [`MAX_DIMENSION`](crate::MAX_DIMENSION)
  /// or less.
  DimensionsTooLarge,

  /// The pixel slice given to the encoder isn't `width * height` long.
  PixelCountMismatch,
}

/// Alias for results with a [`PngError`].
pub type PngResult<T> = Result<T, PngError>;

impl core::fmt::Display for PngError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(match self {
      Self::MalformedContainer => "malformed PNG container",
      Self::TruncatedInput => "input data ended unexpectedly",
      Self::CorruptStream => "corrupt compressed or filtered data",
      Self::Alloc => "allocation failure",
      Self::WidthOrHeightZero => "image width or height is zero",
      Self::DimensionsTooLarge => "image dimensions are too large",
      Self::PixelCountMismatch => "pixel count doesn't match the image dimensions",
    })
  }
}

impl core::error::Error for PngError {}

impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
impl From<TryFromIntError> for PngError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::MalformedContainer
  }
}

#[test]
fn test_size_of_png_result_u16() {
  use core::mem::size_of;
  // Huffman symbols travel in registers, keep the error a single byte.
  assert_eq!(size_of::<PngError>(), 1);
  assert!(size_of::<PngResult<u16>>() <= size_of::<u32>());
}
