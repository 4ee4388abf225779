use core::fmt::{Debug, Write};

use alloc::vec::Vec;

use super::*;

/// The largest chunk length that PNG allows.
pub const MAX_CHUNK_LEN: u32 = (1 << 31) - 1;

/// The four byte type code of a chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
#[allow(missing_docs)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for byte in self.0 {
      f.write_char(byte as char)?;
    }
    Ok(())
  }
}

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawChunk<'b> {
  /// The chunk's type code.
  pub type_: ChunkType,
  /// The chunk's payload.
  pub data: &'b [u8],
  /// The CRC stored in the file.
  pub declared_crc: u32,
}
impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("type_", &self.type_)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl RawChunk<'_> {
  /// Computes the CRC of the type and data.
  #[inline]
  #[must_use]
  pub fn actual_crc(&self) -> u32 {
    png_crc(self.type_.0.iter().copied().chain(self.data.iter().copied()))
  }

  /// If the declared CRC matches the actual CRC.
  ///
  /// The decoder doesn't check this, but you can.
  #[inline]
  #[must_use]
  pub fn crc_matches(&self) -> bool {
    self.declared_crc == self.actual_crc()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// * The first 8 bytes are skipped without checking them. Use
///   [`is_png_header_correct`] if you want to check them.
/// * Iteration ends after an `IEND` chunk, or when the input runs out exactly
///   at a chunk boundary. Anything after `IEND` is ignored.
/// * A chunk that runs past the end of the input produces
///   `Err(TruncatedInput)` and ends the iteration. A chunk declaring a length
///   over `2^31 - 1` produces `Err(MalformedContainer)` the same way.
#[derive(Debug, Clone)]
pub struct RawChunkIter<'b> {
  rest: &'b [u8],
  done: bool,
}
impl<'b> RawChunkIter<'b> {
  /// Pass the full PNG bytes, it will remove the PNG signature automatically.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self { rest, done: false },
      _ => Self { rest: &[], done: false },
    }
  }

  fn next_chunk(&mut self) -> PngResult<RawChunk<'b>> {
    let (head, rest) = match self.rest {
      [l0, l1, l2, l3, t0, t1, t2, t3, rest @ ..] => {
        ((u32::from_be_bytes([*l0, *l1, *l2, *l3]), ChunkType([*t0, *t1, *t2, *t3])), rest)
      }
      _ => return Err(PngError::TruncatedInput),
    };
    let (chunk_len, type_) = head;
    if chunk_len > MAX_CHUNK_LEN {
      return Err(PngError::MalformedContainer);
    }
    let chunk_len = chunk_len as usize;
    if rest.len() < chunk_len {
      return Err(PngError::TruncatedInput);
    }
    let (data, rest) = rest.split_at(chunk_len);
    let (declared_crc, rest) = match rest {
      [c0, c1, c2, c3, rest @ ..] => (u32::from_be_bytes([*c0, *c1, *c2, *c3]), rest),
      _ => return Err(PngError::TruncatedInput),
    };
    self.rest = rest;
    Ok(RawChunk { type_, data, declared_crc })
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = PngResult<RawChunk<'b>>;
  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.rest.is_empty() {
      return None;
    }
    let out = self.next_chunk();
    match &out {
      Ok(chunk) if chunk.type_ != ChunkType::IEND => (),
      _ => self.done = true,
    }
    Some(out)
  }
}

/// Checks if the PNG's initial 8 bytes are correct.
///
/// * If this is the case, the rest of the bytes are very likely PNG data.
/// * If this is *not* the case, the rest of the bytes are very likely *not* PNG
///   data.
#[inline]
#[must_use]
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// Finds the first chunk of the given type.
///
/// ## Failure
/// * Any error the [`RawChunkIter`] hits before finding the chunk.
pub fn find_chunk(bytes: &[u8], type_: ChunkType) -> PngResult<Option<RawChunk<'_>>> {
  for chunk in RawChunkIter::new(bytes) {
    let chunk = chunk?;
    if chunk.type_ == type_ {
      return Ok(Some(chunk));
    }
  }
  Ok(None)
}

/// Concatenates the data of every `IDAT` chunk, in order.
///
/// Multiple `IDAT` chunks form a single zlib stream.
///
/// ## Failure
/// * Any error from the [`RawChunkIter`], so truncation anywhere in the image
///   data is caught here.
/// * `Alloc` if the combined data can't be allocated.
pub fn collect_idat(bytes: &[u8]) -> PngResult<Vec<u8>> {
  let mut out = Vec::new();
  for chunk in RawChunkIter::new(bytes) {
    let chunk = chunk?;
    if chunk.type_ == ChunkType::IDAT {
      out.try_reserve(chunk.data.len())?;
      out.extend_from_slice(chunk.data);
    }
  }
  Ok(out)
}

/// Starts a chunk: writes a placeholder length and the type.
///
/// Write the chunk's data directly into `out`, then call [`end_chunk`] with
/// the returned position.
#[inline]
pub fn begin_chunk(out: &mut Vec<u8>, type_: ChunkType) -> usize {
  let start = out.len();
  out.extend_from_slice(&[0; 4]);
  out.extend_from_slice(&type_.0);
  start
}

/// Finishes a chunk started with [`begin_chunk`]: fills in the length and
/// appends the CRC.
///
/// ## Failure
/// * `DimensionsTooLarge` if the chunk data is over `2^31 - 1` bytes.
pub fn end_chunk(out: &mut Vec<u8>, start: usize) -> PngResult<()> {
  let data_len = out.len() - start - 8;
  let len32 = u32::try_from(data_len).map_err(|_| PngError::DimensionsTooLarge)?;
  if len32 > MAX_CHUNK_LEN {
    return Err(PngError::DimensionsTooLarge);
  }
  out[start..start + 4].copy_from_slice(&len32.to_be_bytes());
  let crc = png_crc(out[start + 4..].iter().copied());
  out.extend_from_slice(&crc.to_be_bytes());
  Ok(())
}

/// Writes a complete chunk with the given data.
#[inline]
pub fn write_chunk(out: &mut Vec<u8>, type_: ChunkType, data: &[u8]) -> PngResult<()> {
  let start = begin_chunk(out, type_);
  out.extend_from_slice(data);
  end_chunk(out, start)
}

#[cfg(test)]
fn chunk_test_bytes() -> Vec<u8> {
  let mut v = Vec::from(PNG_SIGNATURE);
  write_chunk(&mut v, ChunkType::IHDR, &[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]).unwrap();
  write_chunk(&mut v, ChunkType::IDAT, b"abc").unwrap();
  write_chunk(&mut v, ChunkType::IDAT, b"").unwrap();
  write_chunk(&mut v, ChunkType::IDAT, b"de").unwrap();
  write_chunk(&mut v, ChunkType::IEND, b"").unwrap();
  v
}

#[test]
fn test_chunk_writing() {
  let mut v = Vec::new();
  write_chunk(&mut v, ChunkType::IEND, b"").unwrap();
  assert_eq!(v, [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);
}

#[test]
fn test_raw_chunk_iter() {
  let v = chunk_test_bytes();
  assert!(is_png_header_correct(&v));
  let types: Vec<ChunkType> = RawChunkIter::new(&v).map(|c| c.unwrap().type_).collect();
  assert_eq!(
    types,
    [ChunkType::IHDR, ChunkType::IDAT, ChunkType::IDAT, ChunkType::IDAT, ChunkType::IEND]
  );
  assert!(RawChunkIter::new(&v).all(|c| c.unwrap().crc_matches()));
  assert_eq!(collect_idat(&v).unwrap(), b"abcde");
  assert_eq!(find_chunk(&v, ChunkType::IHDR).unwrap().unwrap().data.len(), 13);
  assert!(find_chunk(&v, ChunkType::PLTE).unwrap().is_none());

  // bytes after IEND are never looked at
  let mut trailing = v.clone();
  trailing.extend_from_slice(&[0xFF; 7]);
  assert_eq!(RawChunkIter::new(&trailing).count(), 5);
}

#[test]
fn test_raw_chunk_iter_truncation() {
  let v = chunk_test_bytes();
  // cutting the data anywhere inside a chunk gives an error as the last item
  for cut in 9..v.len() - 12 {
    let results: Vec<_> = RawChunkIter::new(&v[..cut]).collect();
    let last = results.last().unwrap();
    if cut == 8 + 25 || cut == 8 + 25 + 15 || cut == 8 + 25 + 15 + 12 {
      assert!(last.is_ok(), "cut: {cut}");
    } else {
      assert_eq!(*last, Err(PngError::TruncatedInput), "cut: {cut}");
    }
  }
  // a chunk claiming more than 2^31-1 bytes
  let mut huge = Vec::from(PNG_SIGNATURE);
  huge.extend_from_slice(&[0x80, 0, 0, 0]);
  huge.extend_from_slice(b"IDAT");
  assert_eq!(find_chunk(&huge, ChunkType::IDAT), Err(PngError::MalformedContainer));
  assert_eq!(collect_idat(&huge), Err(PngError::MalformedContainer));
}
