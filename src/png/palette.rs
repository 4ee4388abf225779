use core::fmt::Debug;

use super::*;

/// Palette data
///
/// Palette entries are always RGB.
///
/// If you want to have a paletted image with transparency then the transparency
/// info goes in a separate transparency chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PLTE<'b>(&'b [RGB8]);
impl<'b> TryFrom<&'b [u8]> for PLTE<'b> {
  type Error = PngError;
  /// ## Failure
  /// * `MalformedContainer` if the data isn't a multiple of 3 bytes, or if it
  ///   has 0 or more than 256 entries.
  #[inline]
  fn try_from(data: &'b [u8]) -> Result<Self, Self::Error> {
    let entries: &[RGB8] =
      bytemuck::try_cast_slice(data).map_err(|_| PngError::MalformedContainer)?;
    if entries.is_empty() || entries.len() > 256 {
      return Err(PngError::MalformedContainer);
    }
    Ok(Self(entries))
  }
}
impl Debug for PLTE<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // currently prints no more than 4 palette entries
    f.debug_tuple("PLTE").field(&&self.0[..self.0.len().min(4)]).field(&self.0.len()).finish()
  }
}
impl<'b> PLTE<'b> {
  /// Gets the entries as a slice.
  #[inline]
  #[must_use]
  pub const fn entries(&self) -> &'b [RGB8] {
    self.0
  }
}

/// Transparency data
///
/// The meaning depends on the image's color type:
/// * Greyscale: one 16-bit sample value that should be fully transparent.
/// * RGB: one 16-bit-per-channel color that should be fully transparent.
/// * Indexed: an alpha value for each palette entry, which can be shorter
///   than the palette (missing entries are opaque).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style)]
pub struct tRNS<'b>(&'b [u8]);
impl<'b> From<&'b [u8]> for tRNS<'b> {
  #[inline]
  #[must_use]
  fn from(data: &'b [u8]) -> Self {
    Self(data)
  }
}
impl Debug for tRNS<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("tRNS").field(&&self.0[..self.0.len().min(8)]).field(&self.0.len()).finish()
  }
}
impl<'b> tRNS<'b> {
  /// Gets the greyscale value that is transparent.
  ///
  /// Fails when the chunk has the wrong length for greyscale.
  #[inline]
  #[must_use]
  pub const fn try_to_grayscale(&self) -> Option<u16> {
    match self.0 {
      [y0, y1] => Some(u16::from_be_bytes([*y0, *y1])),
      _ => None,
    }
  }

  /// Gets the RGB value that is transparent.
  ///
  /// Fails when the chunk has the wrong length for rgb.
  #[inline]
  #[must_use]
  pub const fn try_to_rgb(&self) -> Option<[u16; 3]> {
    match self.0 {
      [r0, r1, g0, g1, b0, b1] => Some([
        u16::from_be_bytes([*r0, *r1]),
        u16::from_be_bytes([*g0, *g1]),
        u16::from_be_bytes([*b0, *b1]),
      ]),
      _ => None,
    }
  }

  /// Gets the alpha value for a palette index, opaque when there isn't one.
  #[inline]
  #[must_use]
  pub fn alpha_for_index(&self, index: usize) -> u8 {
    self.0.get(index).copied().unwrap_or(u8::MAX)
  }
}

#[test]
fn test_plte_parse() {
  let plte = PLTE::try_from(&[1_u8, 2, 3, 4, 5, 6][..]).unwrap();
  assert_eq!(plte.entries(), &[RGB8 { r: 1, g: 2, b: 3 }, RGB8 { r: 4, g: 5, b: 6 }]);
  assert_eq!(PLTE::try_from(&[1_u8, 2, 3, 4][..]), Err(PngError::MalformedContainer));
  assert_eq!(PLTE::try_from(&[0_u8; 0][..]), Err(PngError::MalformedContainer));
  let full = [0_u8; 256 * 3];
  assert!(PLTE::try_from(&full[..]).is_ok());
  let too_many = [0_u8; 257 * 3];
  assert_eq!(PLTE::try_from(&too_many[..]), Err(PngError::MalformedContainer));
}

#[test]
fn test_trns_views() {
  let grey = tRNS::from(&[0x01_u8, 0x02][..]);
  assert_eq!(grey.try_to_grayscale(), Some(0x0102));
  assert_eq!(grey.try_to_rgb(), None);
  let rgb = tRNS::from(&[0_u8, 1, 0, 2, 0, 3][..]);
  assert_eq!(rgb.try_to_rgb(), Some([1, 2, 3]));
  assert_eq!(rgb.try_to_grayscale(), None);
  let alphas = tRNS::from(&[0_u8, 128][..]);
  assert_eq!(alphas.alpha_for_index(0), 0);
  assert_eq!(alphas.alpha_for_index(1), 128);
  assert_eq!(alphas.alpha_for_index(2), 255);
}
