//! Zlib and DEFLATE support.
//!
//! * [RFC 1950: ZLIB Compressed Data Format][rfc1950]
//! * [RFC 1951: DEFLATE Compressed Data Format][rfc1951]
//!
//! [rfc1950]: https://www.rfc-editor.org/rfc/rfc1950
//! [rfc1951]: https://www.rfc-editor.org/rfc/rfc1951
//!
//! The decompressor handles all three DEFLATE block types. The compressor is
//! deliberately simple: one fixed-Huffman block where runs of a repeated byte
//! become distance-1 back references and everything else is a literal. The
//! output is always valid, but isn't small the way a real LZ77 matcher would
//! make it.
//!
//! Whole-buffer only, there's no streaming support.

use alloc::vec::Vec;

use crate::{PngError, PngResult};

mod adler32;
pub use adler32::*;

mod bit_source;
pub use bit_source::*;

mod bit_sink;
pub use bit_sink::*;

mod huffman;
pub use huffman::*;

mod inflate;
pub use inflate::*;

mod deflate;
pub use deflate::*;

/// Base lengths for the length symbols 257 through 285.
pub(crate) const LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
  163, 195, 227, 258,
];

/// Extra bits for the length symbols 257 through 285.
pub(crate) const LENGTH_EXTRA: [u8; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

/// Base distances for the distance symbols 0 through 29.
pub(crate) const DIST_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537, 2049,
  3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for the distance symbols 0 through 29.
pub(crate) const DIST_EXTRA: [u8; 30] =
  [0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13];

/// The header this crate writes: deflate with a 32k window, no dictionary,
/// "fastest" compression level.
pub const ZLIB_HEADER: [u8; 2] = [0x78, 0x01];

/// Checks the two byte zlib header.
///
/// * The compression method (low nibble of the first byte) must be 8.
/// * The window size info (high nibble of the first byte) must be 7 or less.
/// * There must not be a preset dictionary.
/// * The header, as a big-endian `u16`, must be a multiple of 31.
#[inline]
pub const fn is_zlib_header_valid(cmf: u8, flg: u8) -> bool {
  let method_ok = (cmf & 0x0F) == 8;
  let window_ok = (cmf >> 4) <= 7;
  let no_dict = (flg & 0b0010_0000) == 0;
  let check_ok = u16::from_be_bytes([cmf, flg]) % 31 == 0;
  method_ok && window_ok && no_dict && check_ok
}

/// Decompresses a zlib stream that should produce exactly `expected_len`
/// bytes.
///
/// ## Failure
/// * `TruncatedInput` if the data ends early (including a missing Adler-32
///   trailer).
/// * `CorruptStream` for a bad header, bad DEFLATE data, an Adler-32
///   mismatch, or output that isn't exactly `expected_len` bytes.
pub fn zlib_decompress(data: &[u8], expected_len: usize) -> PngResult<Vec<u8>> {
  let (cmf, flg, body) = match data {
    [cmf, flg, body @ ..] => (*cmf, *flg, body),
    _ => return Err(PngError::TruncatedInput),
  };
  if !is_zlib_header_valid(cmf, flg) {
    return Err(PngError::CorruptStream);
  }
  let (out, consumed) = inflate(body, expected_len)?;
  if out.len() != expected_len {
    trace!("inflate produced {} bytes, expected {}", out.len(), expected_len);
    return Err(PngError::CorruptStream);
  }
  let declared = match body.get(consumed..) {
    Some([a, b, c, d, ..]) => u32::from_be_bytes([*a, *b, *c, *d]),
    _ => return Err(PngError::TruncatedInput),
  };
  if declared != adler32(&out) {
    return Err(PngError::CorruptStream);
  }
  Ok(out)
}

/// Compresses the data into a zlib stream.
///
/// Header, one fixed-Huffman DEFLATE block (see [`deflate_fixed`]), then the
/// big-endian Adler-32 of `data`.
///
/// ## Failure
/// * `Alloc` if the output buffer can't be allocated.
pub fn zlib_compress(data: &[u8]) -> PngResult<Vec<u8>> {
  let mut out = Vec::new();
  zlib_compress_into(data, &mut out)?;
  Ok(out)
}

/// As [`zlib_compress`], but appends to an existing buffer.
pub fn zlib_compress_into(data: &[u8], out: &mut Vec<u8>) -> PngResult<()> {
  // every byte is at most 9 bits as a literal, plus framing
  out.try_reserve(data.len() + data.len() / 8 + 16)?;
  out.extend_from_slice(&ZLIB_HEADER);
  let mut sink = BitSink::new(out);
  deflate_fixed_to(data, &mut sink);
  sink.finish();
  out.extend_from_slice(&adler32(data).to_be_bytes());
  Ok(())
}

#[test]
fn test_zlib_header_check() {
  assert!(is_zlib_header_valid(ZLIB_HEADER[0], ZLIB_HEADER[1]));
  assert!(is_zlib_header_valid(0x78, 0x9C));
  assert!(is_zlib_header_valid(0x78, 0xDA));
  // wrong method
  assert!(!is_zlib_header_valid(0x77, 0x01));
  // window too large
  assert!(!is_zlib_header_valid(0x88, 0x01));
  // preset dictionary
  assert!(!is_zlib_header_valid(0x78, 0xBB));
  // bad check bits
  assert!(!is_zlib_header_valid(0x78, 0x02));
}

#[test]
fn test_zlib_round_trip() {
  use alloc::vec;
  let mut data = vec![0_u8; 1000];
  data.extend((0..=255_u8).cycle().take(3000));
  data.extend_from_slice(b"abcabcabcabc hello hello hello");
  let packed = zlib_compress(&data).unwrap();
  assert_eq!(&packed[..2], &ZLIB_HEADER);
  assert_eq!(zlib_decompress(&packed, data.len()).unwrap(), data);
  // exact output size is enforced both ways
  assert_eq!(zlib_decompress(&packed, data.len() - 1), Err(PngError::CorruptStream));
  assert_eq!(zlib_decompress(&packed, data.len() + 1), Err(PngError::CorruptStream));
}

#[test]
fn test_zlib_checksum_and_trailer() {
  let packed = zlib_compress(b"some data some data").unwrap();
  let mut bad_sum = packed.clone();
  *bad_sum.last_mut().unwrap() ^= 1;
  assert_eq!(zlib_decompress(&bad_sum, 19), Err(PngError::CorruptStream));
  let no_trailer = &packed[..packed.len() - 4];
  assert_eq!(zlib_decompress(no_trailer, 19), Err(PngError::TruncatedInput));
  assert_eq!(zlib_decompress(&packed[..1], 19), Err(PngError::TruncatedInput));
}
