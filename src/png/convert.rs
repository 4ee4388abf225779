use bitfrob::u8_replicate_bits;

use super::*;

/// Gets the `x`th sample of a packed scanline.
///
/// Depths below 8 pack their samples most significant bits first.
#[inline]
#[must_use]
fn packed_sample(scanline: &[u8], x: usize, bit_depth: u8) -> u8 {
  if bit_depth == 8 {
    scanline[x]
  } else {
    let depth = usize::from(bit_depth);
    let bit = x * depth;
    let shift = 8 - depth - (bit % 8);
    let mask = (1_u8 << depth) - 1;
    (scanline[bit / 8] >> shift) & mask
  }
}

/// Scales a sample up to 8 bits by repeating its bit pattern.
#[inline]
#[must_use]
fn sample_to_u8(sample: u8, bit_depth: u8) -> u8 {
  if bit_depth == 8 {
    sample
  } else {
    u8_replicate_bits(u32::from(bit_depth), sample)
  }
}

/// Converts unfiltered image data into an RGBA8 bitmap.
///
/// `unfiltered` is the output of [`unfilter_in_place`]: each line still has
/// its (now meaningless) filter byte in front.
///
/// * Greyscale becomes `r = g = b`. A pixel whose sample equals the `tRNS`
///   grey value gets alpha 0.
/// * RGB gets alpha 255, or 0 when all three channels equal the `tRNS` color.
///   Only the low byte of each 16-bit `tRNS` channel is compared.
/// * Indexed pixels look up the palette, and take their alpha from `tRNS`
///   (entries past the end of `tRNS` are opaque).
/// * Greyscale + alpha and RGBA carry their own alpha.
///
/// ## Failure
/// * `CorruptStream` if an index is outside the palette, or if the data isn't
///   the size the header calls for.
/// * `Alloc` if the bitmap can't be allocated.
pub fn expand_to_rgba8(
  header: &IHDR, unfiltered: &[u8], palette: Option<PLTE<'_>>, transparency: Option<tRNS<'_>>,
) -> PngResult<Bitmap<RGBA8>> {
  if header.width == 0 || header.height == 0 {
    return Err(PngError::WidthOrHeightZero);
  }
  if unfiltered.len() != header.zlib_decompression_requirement() {
    return Err(PngError::CorruptStream);
  }
  let mut image = Bitmap::try_new_filled(header.width, header.height, RGBA8::default())?;
  let width = header.width as usize;
  let depth = header.bit_depth;
  let filterlines = unfiltered.chunks_exact(header.bytes_per_filterline());
  for (out_row, filterline) in image.pixels.chunks_exact_mut(width).zip(filterlines) {
    let scanline = &filterline[1..];
    match header.color_type {
      PngColorType::Y => {
        let transparent = transparency.and_then(|t| t.try_to_grayscale());
        for (x, p) in out_row.iter_mut().enumerate() {
          let sample = packed_sample(scanline, x, depth);
          let a = if transparent == Some(u16::from(sample)) { 0 } else { u8::MAX };
          *p = RGBA8::grey(sample_to_u8(sample, depth), a);
        }
      }
      PngColorType::YA => {
        for (p, ya) in out_row.iter_mut().zip(scanline.chunks_exact(2)) {
          *p = RGBA8::grey(ya[0], ya[1]);
        }
      }
      PngColorType::RGB => {
        let transparent = transparency.and_then(|t| t.try_to_rgb()).map(|key| key.map(|c| c as u8));
        for (p, rgb) in out_row.iter_mut().zip(scanline.chunks_exact(3)) {
          let a = if transparent == Some([rgb[0], rgb[1], rgb[2]]) { 0 } else { u8::MAX };
          *p = RGBA8::new(rgb[0], rgb[1], rgb[2], a);
        }
      }
      PngColorType::RGBA => {
        out_row.copy_from_slice(bytemuck::cast_slice(scanline));
      }
      PngColorType::Index => {
        let entries = palette.map(|plte| plte.entries()).unwrap_or(&[]);
        for (x, p) in out_row.iter_mut().enumerate() {
          let index = usize::from(packed_sample(scanline, x, depth));
          let RGB8 { r, g, b } = *entries.get(index).ok_or(PngError::CorruptStream)?;
          let a = transparency.map(|t| t.alpha_for_index(index)).unwrap_or(u8::MAX);
          *p = RGBA8::new(r, g, b, a);
        }
      }
    }
  }
  Ok(image)
}

#[test]
fn test_packed_sample() {
  let line = [0b1011_0010, 0b0111_1000];
  assert_eq!(packed_sample(&line, 0, 1), 1);
  assert_eq!(packed_sample(&line, 1, 1), 0);
  assert_eq!(packed_sample(&line, 7, 1), 0);
  assert_eq!(packed_sample(&line, 9, 1), 1);
  assert_eq!(packed_sample(&line, 0, 2), 0b10);
  assert_eq!(packed_sample(&line, 3, 2), 0b10);
  assert_eq!(packed_sample(&line, 4, 2), 0b01);
  assert_eq!(packed_sample(&line, 0, 4), 0b1011);
  assert_eq!(packed_sample(&line, 3, 4), 0b1000);
  assert_eq!(packed_sample(&line, 1, 8), 0b0111_1000);
}

#[test]
fn test_sample_to_u8() {
  assert_eq!(sample_to_u8(1, 1), 0xFF);
  assert_eq!(sample_to_u8(0, 1), 0);
  assert_eq!(sample_to_u8(0b10, 2), 0b1010_1010);
  assert_eq!(sample_to_u8(0b01, 2), 0b0101_0101);
  assert_eq!(sample_to_u8(0xA, 4), 0xAA);
  assert_eq!(sample_to_u8(0x3C, 8), 0x3C);
}

#[test]
fn test_expand_grey() {
  // 3x1 at 2 bits per pixel, with the 2-bit value 1 marked transparent
  let header = IHDR { width: 3, height: 1, bit_depth: 2, color_type: PngColorType::Y };
  let data = [0, 0b11_01_00_00];
  let trns = tRNS::from(&[0_u8, 1][..]);
  let image = expand_to_rgba8(&header, &data, None, Some(trns)).unwrap();
  assert_eq!(image.pixels, [RGBA8::grey(255, 255), RGBA8::grey(0x55, 0), RGBA8::grey(0, 255)]);

  let header = IHDR { width: 2, height: 1, bit_depth: 8, color_type: PngColorType::YA };
  let image = expand_to_rgba8(&header, &[0, 10, 20, 30, 40], None, None).unwrap();
  assert_eq!(image.pixels, [RGBA8::grey(10, 20), RGBA8::grey(30, 40)]);
}

#[test]
fn test_expand_rgb() {
  let header = IHDR { width: 2, height: 2, bit_depth: 8, color_type: PngColorType::RGB };
  let data = [0, 1, 2, 3, 4, 5, 6, 0, 1, 2, 3, 9, 9, 9];
  let trns = tRNS::from(&[0_u8, 1, 0, 2, 0, 3][..]);
  let image = expand_to_rgba8(&header, &data, None, Some(trns)).unwrap();
  assert_eq!(
    image.pixels,
    [RGBA8::new(1, 2, 3, 0), RGBA8::new(4, 5, 6, 255), RGBA8::new(1, 2, 3, 0), RGBA8::new(9, 9, 9, 255)]
  );
  // only the low byte of each key channel counts
  let trns = tRNS::from(&[1_u8, 1, 0, 2, 0, 3][..]);
  let image = expand_to_rgba8(&header, &data, None, Some(trns)).unwrap();
  let alphas: Vec<u8> = image.pixels.iter().map(|p| p.a).collect();
  assert_eq!(alphas, [0, 255, 0, 255]);
  let trns = tRNS::from(&[0xFF_u8, 1, 0xFF, 2, 0xFF, 3][..]);
  let image = expand_to_rgba8(&header, &data, None, Some(trns)).unwrap();
  assert_eq!(image.pixels[0], RGBA8::new(1, 2, 3, 0));
  // any low byte that differs still misses
  let trns = tRNS::from(&[0_u8, 1, 0, 2, 0, 4][..]);
  let image = expand_to_rgba8(&header, &data, None, Some(trns)).unwrap();
  assert!(image.pixels.iter().all(|p| p.a == 255));

  let header = IHDR::rgba8(1, 1);
  let image = expand_to_rgba8(&header, &[0, 7, 6, 5, 4], None, None).unwrap();
  assert_eq!(image.pixels, [RGBA8::new(7, 6, 5, 4)]);
}

#[test]
fn test_expand_indexed() {
  let header = IHDR { width: 5, height: 1, bit_depth: 4, color_type: PngColorType::Index };
  let plte = PLTE::try_from(&[10_u8, 11, 12, 20, 21, 22, 30, 31, 32][..]).unwrap();
  let trns = tRNS::from(&[0_u8, 99][..]);
  let data = [0, 0x01, 0x20, 0x10];
  let image = expand_to_rgba8(&header, &data, Some(plte), Some(trns)).unwrap();
  assert_eq!(
    image.pixels,
    [
      RGBA8::new(10, 11, 12, 0),
      RGBA8::new(20, 21, 22, 99),
      RGBA8::new(30, 31, 32, 255),
      RGBA8::new(10, 11, 12, 0),
      RGBA8::new(20, 21, 22, 99),
    ]
  );
  // index 3 is past the end of the palette
  let data = [0, 0x01, 0x23, 0x00];
  assert_eq!(expand_to_rgba8(&header, &data, Some(plte), None), Err(PngError::CorruptStream));
}
