use super::*;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// If the bit depth is supported by this crate for this color type.
  ///
  /// 16-bit images are valid PNG, but they're not supported.
  #[inline]
  #[must_use]
  pub const fn supports_bit_depth(self, bit_depth: u8) -> bool {
    match self {
      Self::Y | Self::Index => matches!(bit_depth, 1 | 2 | 4 | 8),
      Self::RGB | Self::YA | Self::RGBA => bit_depth == 8,
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(PngError::MalformedContainer),
    })
  }
}

/// Image Header
///
/// Only headers this crate can actually decode are ever made by parsing, so
/// there's no interlace flag or method fields: those must all be 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
}
impl IHDR {
  /// The header for an RGBA8 image, which is what the encoder writes.
  #[inline]
  #[must_use]
  pub const fn rgba8(width: u32, height: u32) -> Self {
    Self { width, height, bit_depth: 8, color_type: PngColorType::RGBA }
  }

  /// Bits used by each pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Bytes in each row of pixel data, rounded up to a whole byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(&self) -> usize {
    (self.bits_per_pixel() * (self.width as usize) + 7) / 8
  }

  /// Bytes in each row of the decompressed data: a filter type byte, then the
  /// scanline.
  #[inline]
  #[must_use]
  pub const fn bytes_per_filterline(&self) -> usize {
    1 + self.bytes_per_scanline()
  }

  /// The distance (in bytes) back to the "left" byte when filtering.
  ///
  /// This is the number of bytes in a complete pixel, rounded up to 1 for
  /// images with less than 8 bits per pixel.
  #[inline]
  #[must_use]
  pub const fn filter_unit(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Gets the exact size of the decompressed image data.
  #[inline]
  #[must_use]
  pub const fn zlib_decompression_requirement(&self) -> usize {
    self.bytes_per_filterline() * (self.height as usize)
  }

  /// The 13 bytes of an `IHDR` chunk's data for this header.
  #[inline]
  #[must_use]
  pub fn to_chunk_data(&self) -> [u8; 13] {
    let [w0, w1, w2, w3] = self.width.to_be_bytes();
    let [h0, h1, h2, h3] = self.height.to_be_bytes();
    [w0, w1, w2, w3, h0, h1, h2, h3, self.bit_depth, self.color_type as u8, 0, 0, 0]
  }
}
impl TryFrom<&[u8]> for IHDR {
  type Error = PngError;
  /// Parses and validates `IHDR` chunk data.
  ///
  /// ## Failure
  /// * `WidthOrHeightZero` or `DimensionsTooLarge` for bad dimensions.
  /// * `MalformedContainer` for anything else this crate can't decode: the
  ///   wrong data length, an unknown color type, a bit depth that isn't
  ///   supported for the color type, non-zero compression or filter methods,
  ///   or interlacing.
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    match value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =>
      {
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        if width == 0 || height == 0 {
          return Err(PngError::WidthOrHeightZero);
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
          return Err(PngError::DimensionsTooLarge);
        }
        let color_type = PngColorType::try_from(*color_type)?;
        if !color_type.supports_bit_depth(*bit_depth) {
          trace!("unsupported bit depth {bit_depth} for {color_type:?}");
          return Err(PngError::MalformedContainer);
        }
        if *compression_method != 0 || *filter_method != 0 || *interlace_method != 0 {
          return Err(PngError::MalformedContainer);
        }
        Ok(Self { width, height, bit_depth: *bit_depth, color_type })
      }
      _ => Err(PngError::MalformedContainer),
    }
  }
}

#[test]
fn test_ihdr_parse() {
  let ihdr = IHDR::try_from(&[0_u8, 0, 1, 0, 0, 0, 0, 3, 2, 3, 0, 0, 0][..]).unwrap();
  assert_eq!(ihdr, IHDR { width: 256, height: 3, bit_depth: 2, color_type: PngColorType::Index });
  assert_eq!(ihdr.bits_per_pixel(), 2);
  assert_eq!(ihdr.bytes_per_scanline(), 64);
  assert_eq!(ihdr.bytes_per_filterline(), 65);
  assert_eq!(ihdr.filter_unit(), 1);
  assert_eq!(ihdr.zlib_decompression_requirement(), 195);
  assert_eq!(IHDR::try_from(&ihdr.to_chunk_data()[..]), Ok(ihdr));

  let rgba = IHDR::rgba8(3, 1);
  assert_eq!(rgba.to_chunk_data(), [0, 0, 0, 3, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
  assert_eq!(rgba.filter_unit(), 4);
  assert_eq!(rgba.zlib_decompression_requirement(), 13);

  // partial bytes round up
  let grey1 = IHDR { width: 9, height: 1, bit_depth: 1, color_type: PngColorType::Y };
  assert_eq!(grey1.bytes_per_scanline(), 2);
}

#[test]
fn test_ihdr_rejects() {
  let check = |bytes: [u8; 13], err: PngError| {
    assert_eq!(IHDR::try_from(&bytes[..]), Err(err), "{bytes:?}");
  };
  check([0, 0, 0, 0, 0, 0, 0, 1, 8, 6, 0, 0, 0], PngError::WidthOrHeightZero);
  check([0, 0, 0, 1, 0, 0, 0, 0, 8, 6, 0, 0, 0], PngError::WidthOrHeightZero);
  check([0, 0, 0x42, 0x69, 0, 0, 0, 1, 8, 6, 0, 0, 0], PngError::DimensionsTooLarge);
  check([0, 0, 0, 1, 0, 0, 0, 1, 16, 6, 0, 0, 0], PngError::MalformedContainer);
  check([0, 0, 0, 1, 0, 0, 0, 1, 16, 0, 0, 0, 0], PngError::MalformedContainer);
  check([0, 0, 0, 1, 0, 0, 0, 1, 4, 2, 0, 0, 0], PngError::MalformedContainer);
  check([0, 0, 0, 1, 0, 0, 0, 1, 8, 5, 0, 0, 0], PngError::MalformedContainer);
  check([0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 1, 0, 0], PngError::MalformedContainer);
  check([0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 1, 0], PngError::MalformedContainer);
  check([0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 1], PngError::MalformedContainer);
  assert_eq!(IHDR::try_from(&[0_u8; 12][..]), Err(PngError::MalformedContainer));

  // exactly the limit is fine
  let limit = MAX_DIMENSION.to_be_bytes();
  let mut at_limit = [0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0];
  at_limit[..4].copy_from_slice(&limit);
  assert!(IHDR::try_from(&at_limit[..]).is_ok());
}
