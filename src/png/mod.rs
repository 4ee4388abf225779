//! Module for working with PNG data.
//!
//! * [Portable Network Graphics Specification (Second
//!   Edition)](https://www.w3.org/TR/2003/REC-PNG-20031110/)
//!
//! ## Decoding
//!
//! [`decode_png`] takes the full bytes of a PNG and gives an RGBA8 [`Bitmap`].
//! The steps are:
//! 1. Check the 8 byte signature.
//! 2. Find and validate the [`IHDR`].
//! 3. Concatenate all `IDAT` chunk data and decompress it with
//!    [`zlib_decompress`], which must produce exactly the number of bytes the
//!    header calls for.
//! 4. [`unfilter_in_place`] the decompressed data.
//! 5. [`expand_to_rgba8`], using the [`PLTE`] and [`tRNS`] chunks if needed.
//!
//! Supported formats are greyscale and indexed at 1, 2, 4, or 8 bits, and
//! greyscale + alpha, RGB, and RGBA at 8 bits. Interlaced and 16-bit images
//! give an error.
//!
//! ## Parsing Errors
//!
//! Quoting [section 13.2 of the PNG
//! spec](https://www.w3.org/TR/2003/REC-PNG-20031110/#13Decoders.Errors):
//!
//! > Errors that have little or no effect on the processing of the image may be
//! > ignored, while those that affect critical data shall be dealt with in a
//! > manner appropriate to the application.
//!
//! Here that means:
//!
//! * Chunk ordering rules are ignored. Everything is in memory at once, so the
//!   decoder just searches for the chunks it needs.
//! * Duplicate chunks are ignored (you get the first one).
//! * Chunk CRCs are not checked. You can check them yourself with
//!   [`RawChunk::crc_matches`]. The Adler-32 of the image data *is* checked,
//!   since a mismatch there means the pixels are wrong.
//! * Ancillary chunks other than `tRNS` are skipped.
//!
//! ## Encoding
//!
//! [`encode_png`] always writes 8-bit RGBA with the Sub filter on every row,
//! one `IDAT` chunk, and no ancillary chunks.

use alloc::vec::Vec;

use crate::{
  zlib::{zlib_compress_into, zlib_decompress},
  Bitmap, PngError, PngResult, MAX_DIMENSION, RGB8, RGBA8,
};

mod crc32;
pub use crc32::*;

mod chunks;
pub use chunks::*;

mod ihdr;
pub use ihdr::*;

mod palette;
pub use palette::*;

mod filter;
pub use filter::*;

mod convert;
pub use convert::*;

/// The first 8 bytes of all PNG data.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Gets the [`IHDR`] out of the PNG bytes.
///
/// ## Failure
/// * `MalformedContainer` if the signature is wrong, or there's no usable
///   `IHDR`.
/// * Whatever the `IHDR` validation gives (see [`IHDR`]'s `TryFrom` impl).
/// * `TruncatedInput` if the data ends before an `IHDR` is found.
pub fn png_get_header(bytes: &[u8]) -> PngResult<IHDR> {
  if !is_png_header_correct(bytes) {
    return Err(PngError::MalformedContainer);
  }
  let chunk = find_chunk(bytes, ChunkType::IHDR)?.ok_or(PngError::MalformedContainer)?;
  IHDR::try_from(chunk.data)
}

/// Decodes PNG bytes into an RGBA8 bitmap.
///
/// See the [module docs](crate::png) for the supported formats.
///
/// ## Failure
/// * `MalformedContainer` for a bad signature, a bad or missing `IHDR`, an
///   unsupported format, or an indexed image without a usable `PLTE`.
/// * `WidthOrHeightZero` or `DimensionsTooLarge` for bad image dimensions.
/// * `TruncatedInput` if the data ends early.
/// * `CorruptStream` if the image data is invalid.
/// * `Alloc` if there's not enough memory.
pub fn decode_png(bytes: &[u8]) -> PngResult<Bitmap<RGBA8>> {
  let header = png_get_header(bytes)?;
  trace!("{header:?}");

  let palette = if header.color_type == PngColorType::Index {
    let chunk = find_chunk(bytes, ChunkType::PLTE)?.ok_or(PngError::MalformedContainer)?;
    Some(PLTE::try_from(chunk.data)?)
  } else {
    None
  };
  let transparency = find_chunk(bytes, ChunkType::tRNS)?.map(|chunk| tRNS::from(chunk.data));

  let compressed = collect_idat(bytes)?;
  trace!("{} bytes of compressed image data", compressed.len());
  let mut filtered = zlib_decompress(&compressed, header.zlib_decompression_requirement())?;
  unfilter_in_place(&header, &mut filtered)?;
  expand_to_rgba8(&header, &filtered, palette, transparency)
}

/// Encodes RGBA8 pixels as PNG bytes.
///
/// The pixels are left to right, top to bottom, with no padding.
///
/// ## Failure
/// * `WidthOrHeightZero` or `DimensionsTooLarge` for bad image dimensions.
/// * `PixelCountMismatch` if `pixels.len()` isn't `width * height`.
/// * `Alloc` if there's not enough memory.
pub fn encode_png(width: u32, height: u32, pixels: &[RGBA8]) -> PngResult<Vec<u8>> {
  if width == 0 || height == 0 {
    return Err(PngError::WidthOrHeightZero);
  }
  if width > MAX_DIMENSION || height > MAX_DIMENSION {
    return Err(PngError::DimensionsTooLarge);
  }
  if pixels.len() != (width as usize) * (height as usize) {
    return Err(PngError::PixelCountMismatch);
  }
  let header = IHDR::rgba8(width, height);
  let filtered = sub_filter(bytemuck::cast_slice(pixels), header.bytes_per_scanline(), 4)?;

  let mut out = Vec::new();
  // signature, the three chunk overheads, IHDR data, and then the
  // compressed data is itself reserved by `zlib_compress_into`
  out.try_reserve(PNG_SIGNATURE.len() + 3 * 12 + 13)?;
  out.extend_from_slice(&PNG_SIGNATURE);
  write_chunk(&mut out, ChunkType::IHDR, &header.to_chunk_data())?;
  let idat = begin_chunk(&mut out, ChunkType::IDAT);
  zlib_compress_into(&filtered, &mut out)?;
  end_chunk(&mut out, idat)?;
  write_chunk(&mut out, ChunkType::IEND, &[])?;
  trace!("encoded {width}x{height} into {} bytes", out.len());
  Ok(out)
}

#[test]
fn test_encode_png_layout() {
  let pixels = [RGBA8::new(255, 0, 0, 255); 6];
  let png = encode_png(3, 2, &pixels).unwrap();
  assert_eq!(&png[..8], &PNG_SIGNATURE);
  let chunks: Vec<RawChunk<'_>> = RawChunkIter::new(&png).map(|c| c.unwrap()).collect();
  assert_eq!(chunks.len(), 3);
  assert_eq!(chunks[0].type_, ChunkType::IHDR);
  assert_eq!(chunks[1].type_, ChunkType::IDAT);
  assert_eq!(chunks[2].type_, ChunkType::IEND);
  assert!(chunks.iter().all(|c| c.crc_matches()));
  assert_eq!(png_get_header(&png), Ok(IHDR::rgba8(3, 2)));
  assert_eq!(decode_png(&png).unwrap().pixels, pixels);
}

#[test]
fn test_encode_png_rejects() {
  let pixels = [RGBA8::default(); 4];
  assert_eq!(encode_png(0, 4, &pixels), Err(PngError::WidthOrHeightZero));
  assert_eq!(encode_png(4, 0, &pixels), Err(PngError::WidthOrHeightZero));
  assert_eq!(encode_png(2, 3, &pixels), Err(PngError::PixelCountMismatch));
  assert_eq!(encode_png(MAX_DIMENSION + 1, 1, &pixels), Err(PngError::DimensionsTooLarge));
}

#[test]
fn test_decode_png_rejects() {
  let png = encode_png(1, 1, &[RGBA8::default()]).unwrap();
  let mut bad_signature = png.clone();
  bad_signature[1] = b'p';
  assert_eq!(decode_png(&bad_signature), Err(PngError::MalformedContainer));
  assert_eq!(decode_png(&png[..4]), Err(PngError::MalformedContainer));
  // signature and then nothing at all
  assert_eq!(decode_png(&png[..8]), Err(PngError::MalformedContainer));

  // indexed, with no palette
  let mut v = Vec::from(PNG_SIGNATURE);
  let ihdr = IHDR { width: 1, height: 1, bit_depth: 8, color_type: PngColorType::Index };
  write_chunk(&mut v, ChunkType::IHDR, &ihdr.to_chunk_data()).unwrap();
  let start = begin_chunk(&mut v, ChunkType::IDAT);
  zlib_compress_into(&[0, 0], &mut v).unwrap();
  end_chunk(&mut v, start).unwrap();
  write_chunk(&mut v, ChunkType::IEND, &[]).unwrap();
  assert_eq!(decode_png(&v), Err(PngError::MalformedContainer));
}
