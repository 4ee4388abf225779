//! PNG scanline filtering.
//!
//! Every row of decompressed image data starts with a filter type byte:
//!
//! * 0: None
//! * 1: Sub, add the byte one pixel to the left ("a").
//! * 2: Up, add the byte in the row above ("b").
//! * 3: Average, add the floor of the average of "a" and "b".
//! * 4: Paeth, add whichever of "a", "b", or the byte above and to the left
//!   ("c") is closest to `a + b - c`.
//!
//! Bytes outside the image (left of the first pixel, or above the first row)
//! are treated as 0.

use alloc::vec::Vec;

use super::*;

/// The Paeth predictor.
#[inline]
#[must_use]
pub const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // the order of these tests is fixed, ties must resolve the same way
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Unfilters one scanline in place.
///
/// `previous` is the already unfiltered line above, or an empty slice for the
/// first line.
fn unfilter_line(filter_type: u8, line: &mut [u8], previous: &[u8], unit: usize) -> PngResult<()> {
  let up = |i: usize| previous.get(i).copied().unwrap_or(0);
  match filter_type {
    0 => (),
    1 => {
      for i in unit..line.len() {
        line[i] = line[i].wrapping_add(line[i - unit]);
      }
    }
    2 => {
      for (p, b) in line.iter_mut().zip(previous.iter().copied()) {
        *p = p.wrapping_add(b);
      }
    }
    3 => {
      for i in 0..line.len() {
        let a = if i >= unit { line[i - unit] } else { 0 };
        let avg = ((u16::from(a) + u16::from(up(i))) / 2) as u8;
        line[i] = line[i].wrapping_add(avg);
      }
    }
    4 => {
      for i in 0..line.len() {
        let (a, c) = if i >= unit { (line[i - unit], up(i - unit)) } else { (0, 0) };
        line[i] = line[i].wrapping_add(paeth_predict(a, up(i), c));
      }
    }
    _ => {
      trace!("unknown filter type {filter_type}");
      return Err(PngError::CorruptStream);
    }
  }
  Ok(())
}

/// Reverses the filtering on decompressed image data, in place.
///
/// Afterwards, each filterline is a 0 byte followed by the raw scanline.
///
/// ## Failure
/// * `CorruptStream` if the data isn't exactly the size the header calls for,
///   or if any line has an unknown filter type.
pub fn unfilter_in_place(header: &IHDR, data: &mut [u8]) -> PngResult<()> {
  let line_len = header.bytes_per_filterline();
  if data.len() != header.zlib_decompression_requirement() {
    return Err(PngError::CorruptStream);
  }
  let unit = header.filter_unit();
  let mut previous: &[u8] = &[];
  for filterline in data.chunks_exact_mut(line_len) {
    let (filter, line) = filterline.split_at_mut(1);
    unfilter_line(filter[0], line, previous, unit)?;
    filter[0] = 0;
    previous = line;
  }
  Ok(())
}

/// Applies the Sub filter to every row of the image data.
///
/// `bytes` is the raw image data, `bytes_per_row` bytes per row, and `unit` is
/// the number of bytes per pixel. The output has a filter type byte of 1 at
/// the start of each row.
///
/// ## Failure
/// * `Alloc` if the output can't be allocated.
pub fn sub_filter(bytes: &[u8], bytes_per_row: usize, unit: usize) -> PngResult<Vec<u8>> {
  let mut out = Vec::new();
  if bytes_per_row == 0 {
    return Ok(out);
  }
  out.try_reserve_exact(bytes.len() + bytes.len() / bytes_per_row)?;
  for row in bytes.chunks_exact(bytes_per_row) {
    out.push(1);
    let first = unit.min(row.len());
    out.extend_from_slice(&row[..first]);
    out.extend(row[first..].iter().zip(row.iter()).map(|(x, a)| x.wrapping_sub(*a)));
  }
  Ok(out)
}

#[test]
fn test_paeth_predict() {
  assert_eq!(paeth_predict(0, 0, 0), 0);
  assert_eq!(paeth_predict(10, 20, 10), 20);
  assert_eq!(paeth_predict(20, 10, 10), 20);
  assert_eq!(paeth_predict(10, 10, 20), 10);
  // p = 50 + 60 - 200 = -90, c is furthest, a is closest
  assert_eq!(paeth_predict(50, 60, 200), 50);
  assert_eq!(paeth_predict(1, 3, 2), 2);
  // b and c tie, b wins
  assert_eq!(paeth_predict(8, 14, 10), 14);
}

#[test]
fn test_unfilter_first_row() {
  // with no previous row, Up is a no-op and Paeth acts like Sub
  let header = IHDR { width: 4, height: 1, bit_depth: 8, color_type: PngColorType::Y };
  let mut up = [2, 5, 6, 7, 8];
  unfilter_in_place(&header, &mut up).unwrap();
  assert_eq!(up, [0, 5, 6, 7, 8]);
  let mut paeth = [4, 5, 1, 1, 1];
  unfilter_in_place(&header, &mut paeth).unwrap();
  assert_eq!(paeth, [0, 5, 6, 7, 8]);
  let mut sub = [1, 5, 1, 1, 1];
  unfilter_in_place(&header, &mut sub).unwrap();
  assert_eq!(sub, [0, 5, 6, 7, 8]);
  // average with a zero row above is half of the left
  let mut avg = [3, 4, 1, 2, 2];
  unfilter_in_place(&header, &mut avg).unwrap();
  assert_eq!(avg, [0, 4, 3, 3, 3]);
}

#[test]
fn test_unfilter_all_types() {
  // 2x2 RGB, so the unit is 3 bytes
  let header = IHDR { width: 2, height: 5, bit_depth: 8, color_type: PngColorType::RGB };
  let raw: [[u8; 6]; 5] = [
    [10, 20, 30, 40, 50, 60],
    [15, 25, 35, 45, 55, 65],
    [200, 100, 0, 255, 128, 1],
    [1, 2, 3, 4, 5, 6],
    [90, 80, 70, 60, 50, 40],
  ];
  // filter each row by hand with a different filter type
  let mut filtered = Vec::new();
  let mut prior = [0_u8; 6];
  for (filter_type, row) in [0_u8, 2, 1, 3, 4].into_iter().zip(raw.iter()) {
    filtered.push(filter_type);
    for i in 0..6 {
      let a = if i >= 3 { row[i - 3] } else { 0 };
      let b = prior[i];
      let c = if i >= 3 { prior[i - 3] } else { 0 };
      let predict = match filter_type {
        0 => 0,
        1 => a,
        2 => b,
        3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
        _ => paeth_predict(a, b, c),
      };
      filtered.push(row[i].wrapping_sub(predict));
    }
    prior = *row;
  }
  unfilter_in_place(&header, &mut filtered).unwrap();
  for (line, row) in filtered.chunks_exact(7).zip(raw.iter()) {
    assert_eq!(line[0], 0);
    assert_eq!(&line[1..], row);
  }
}

#[test]
fn test_unfilter_errors() {
  let header = IHDR { width: 2, height: 1, bit_depth: 8, color_type: PngColorType::Y };
  assert_eq!(unfilter_in_place(&header, &mut [5, 0, 0]), Err(PngError::CorruptStream));
  assert_eq!(unfilter_in_place(&header, &mut [0, 0]), Err(PngError::CorruptStream));
  assert_eq!(unfilter_in_place(&header, &mut [0, 0, 0, 0]), Err(PngError::CorruptStream));
}

#[test]
fn test_sub_filter() {
  let bytes = [10_u8, 20, 30, 40, 5, 25, 30, 50, 1, 2, 3, 4, 1, 1, 1, 1];
  let out = sub_filter(&bytes, 8, 4).unwrap();
  assert_eq!(
    out,
    [1, 10, 20, 30, 40, 251, 5, 0, 10, 1, 1, 2, 3, 4, 0, 255, 254, 253]
  );
  let header = IHDR::rgba8(2, 2);
  let mut out = out;
  unfilter_in_place(&header, &mut out).unwrap();
  assert_eq!(&out[1..9], &bytes[..8]);
  assert_eq!(&out[10..], &bytes[8..]);
}
