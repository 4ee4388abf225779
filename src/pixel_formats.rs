//! Module for pixel formats.
//!
//! PNG data can be stored in many formats (greyscale, indexed, RGB, with and
//! without alpha, and at several bit depths), but decoding always produces
//! [`RGBA8`] and encoding always consumes [`RGBA8`].
//!
//! ### Between Bit Depths
//! When a source channel has fewer than 8 bits the bit pattern is used as the
//! top bits of the output and then copied down as many times as needed to fill
//! in the rest (so a 1-bit `1` becomes `0xFF`, and a 2-bit `0b10` becomes
//! `0b1010_1010`).

use bytemuck::{Pod, Zeroable};

/// An RGB value, 8-bits per channel.
///
/// This is the format of PNG palette entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// An 8-bits per channel RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl RGBA8 {
  /// Makes a pixel from the four channel values.
  #[inline]
  #[must_use]
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  /// A greyscale pixel with the given alpha.
  #[inline]
  #[must_use]
  pub const fn grey(y: u8, a: u8) -> Self {
    Self { r: y, g: y, b: y, a }
  }
}
impl From<RGB8> for RGBA8 {
  #[inline]
  #[must_use]
  fn from(RGB8 { r, g, b }: RGB8) -> Self {
    Self { r, g, b, a: 0xFF }
  }
}
impl From<[u8; 4]> for RGBA8 {
  #[inline]
  #[must_use]
  fn from([r, g, b, a]: [u8; 4]) -> Self {
    Self { r, g, b, a }
  }
}
impl From<RGBA8> for [u8; 4] {
  #[inline]
  #[must_use]
  fn from(RGBA8 { r, g, b, a }: RGBA8) -> Self {
    [r, g, b, a]
  }
}

#[test]
fn test_rgba8_byte_layout() {
  let pixels = [RGBA8::new(1, 2, 3, 4), RGBA8::new(5, 6, 7, 8)];
  let bytes: &[u8] = bytemuck::cast_slice(&pixels);
  assert_eq!(bytes, &[1, 2, 3, 4, 5, 6, 7, 8]);
  let palette: &[RGB8] = bytemuck::cast_slice(&[9_u8, 8, 7, 6, 5, 4]);
  assert_eq!(palette, &[RGB8 { r: 9, g: 8, b: 7 }, RGB8 { r: 6, g: 5, b: 4 }]);
  assert_eq!(RGBA8::from(palette[0]), RGBA8::new(9, 8, 7, 255));
}
