use super::*;

/// The order that the code length alphabet's own code lengths are stored in.
const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// The most output space reserved before any data is decoded.
///
/// Past this the output grows as needed, still bounded by the limit.
const INITIAL_RESERVE: usize = 1 << 20;

/// Decompression output that refuses to grow past a fixed limit.
struct Output {
  bytes: Vec<u8>,
  limit: usize,
}
impl Output {
  #[inline]
  fn push(&mut self, byte: u8) -> PngResult<()> {
    if self.bytes.len() < self.limit {
      self.bytes.try_reserve(1)?;
      self.bytes.push(byte);
      Ok(())
    } else {
      Err(PngError::CorruptStream)
    }
  }

  /// Copies `len` bytes starting `dist` bytes back from the end.
  ///
  /// The source and destination can overlap (when `dist < len`), which
  /// repeats the last `dist` bytes, so this goes one byte at a time.
  #[inline]
  fn copy_back(&mut self, len: usize, dist: usize) -> PngResult<()> {
    if dist > self.bytes.len() || self.bytes.len() + len > self.limit {
      return Err(PngError::CorruptStream);
    }
    self.bytes.try_reserve(len)?;
    let start = self.bytes.len() - dist;
    for i in start..start + len {
      let byte = self.bytes[i];
      self.bytes.push(byte);
    }
    Ok(())
  }
}

/// Decompresses raw DEFLATE data (no zlib wrapper).
///
/// `max_output` is the most output allowed. Producing any more is an error
/// rather than a silent cut off. Only part of that space is reserved up front,
/// so a large limit on a small stream doesn't allocate the whole limit.
///
/// On success, returns the output and how many bytes of `data` were used
/// (a partially used final byte counts as used). Any bytes after that are not
/// part of the DEFLATE stream.
///
/// ## Failure
/// * `TruncatedInput` if the data ends before the final block does.
/// * `CorruptStream` for any invalid data, or output past `max_output`.
/// * `Alloc` if the output can't grow.
pub fn inflate(data: &[u8], max_output: usize) -> PngResult<(Vec<u8>, usize)> {
  let mut bytes = Vec::new();
  bytes.try_reserve_exact(max_output.min(INITIAL_RESERVE))?;
  let mut output = Output { bytes, limit: max_output };
  let mut bits = BitSource::new(data);
  loop {
    let is_final = bits.consume_bool()?;
    let block_type = bits.consume_bits(2)?;
    trace!("deflate block: final={is_final}, type={block_type}, out={}", output.bytes.len());
    match block_type {
      0 => inflate_stored(&mut bits, &mut output)?,
      1 => {
        let lit_len = HuffTable::build(&FIXED_LIT_LEN_LENGTHS)?;
        let dist = HuffTable::build(&FIXED_DIST_LENGTHS)?;
        inflate_codes(&mut bits, &mut output, &lit_len, &dist)?;
      }
      2 => {
        let (lit_len, dist) = read_dynamic_tables(&mut bits)?;
        inflate_codes(&mut bits, &mut output, &lit_len, &dist)?;
      }
      _ => return Err(PngError::CorruptStream),
    }
    if is_final {
      break;
    }
  }
  Ok((output.bytes, bits.bytes_consumed()))
}

fn inflate_stored(bits: &mut BitSource<'_>, output: &mut Output) -> PngResult<()> {
  bits.align_to_byte();
  let len = bits.consume_bits(16)?;
  let nlen = bits.consume_bits(16)?;
  if len ^ nlen != 0xFFFF {
    return Err(PngError::CorruptStream);
  }
  for _ in 0..len {
    output.push(bits.consume_byte()?)?;
  }
  Ok(())
}

fn inflate_codes(
  bits: &mut BitSource<'_>, output: &mut Output, lit_len: &HuffTable, dist: &HuffTable,
) -> PngResult<()> {
  loop {
    let symbol = lit_len.decode(bits)?;
    match symbol {
      0..=255 => output.push(symbol as u8)?,
      256 => return Ok(()),
      257..=285 => {
        let i = usize::from(symbol - 257);
        let extra = bits.consume_bits(u32::from(LENGTH_EXTRA[i]))?;
        let len = usize::from(LENGTH_BASE[i]) + extra as usize;
        let d = usize::from(dist.decode(bits)?);
        if d >= DIST_BASE.len() {
          return Err(PngError::CorruptStream);
        }
        let extra = bits.consume_bits(u32::from(DIST_EXTRA[d]))?;
        let distance = usize::from(DIST_BASE[d]) + extra as usize;
        output.copy_back(len, distance)?;
      }
      _ => return Err(PngError::CorruptStream),
    }
  }
}

/// Reads the description of a dynamic block's Huffman tables.
fn read_dynamic_tables(bits: &mut BitSource<'_>) -> PngResult<(HuffTable, HuffTable)> {
  let hlit = bits.consume_bits(5)? as usize + 257;
  let hdist = bits.consume_bits(5)? as usize + 1;
  let hclen = bits.consume_bits(4)? as usize + 4;
  if hlit > 286 {
    return Err(PngError::CorruptStream);
  }

  let mut code_length_lengths = [0_u8; 19];
  for i in CODE_LENGTH_ORDER[..hclen].iter().copied() {
    code_length_lengths[i] = bits.consume_bits(3)? as u8;
  }
  let code_length_table = HuffTable::build_complete(&code_length_lengths)?;

  let total = hlit + hdist;
  let mut lengths = [0_u8; 286 + 32];
  let mut code_lengths_acquired = 0_usize;
  while code_lengths_acquired < total {
    let (value, repeat_count) = match code_length_table.decode(bits)? {
      literal @ 0..=15 => (literal as u8, 1),
      16 => {
        // repeat the previous length
        if code_lengths_acquired == 0 {
          return Err(PngError::CorruptStream);
        }
        (lengths[code_lengths_acquired - 1], 3 + bits.consume_bits(2)? as usize)
      }
      // short run of zeros
      17 => (0, 3 + bits.consume_bits(3)? as usize),
      // long run of zeros
      18 => (0, 11 + bits.consume_bits(7)? as usize),
      _ => return Err(PngError::CorruptStream),
    };
    let end = code_lengths_acquired + repeat_count;
    if end > total {
      return Err(PngError::CorruptStream);
    }
    lengths[code_lengths_acquired..end].fill(value);
    code_lengths_acquired = end;
  }

  let (lit_len_lengths, dist_lengths) = lengths[..total].split_at(hlit);
  if lit_len_lengths[256] == 0 {
    // a block with no way to end
    return Err(PngError::CorruptStream);
  }
  let dist = if dist_lengths.iter().all(|&len| len == 0) {
    // only literals in this block
    HuffTable::empty()
  } else {
    HuffTable::build(dist_lengths)?
  };
  Ok((HuffTable::build(lit_len_lengths)?, dist))
}

#[test]
fn test_inflate_stored() {
  let data = [0b001, 5, 0, !5, !0, b'h', b'e', b'l', b'l', b'o', 0xAB];
  assert_eq!(inflate(&data, 5), Ok((b"hello".to_vec(), 10)));
  // bad length check
  let data = [0b001, 5, 0, !4, !0, b'h', b'e', b'l', b'l', b'o'];
  assert_eq!(inflate(&data, 5), Err(PngError::CorruptStream));
  // claims more bytes than there are
  let data = [0b001, 9, 0, !9, !0, b'h', b'e', b'l', b'l', b'o'];
  assert_eq!(inflate(&data, 9), Err(PngError::TruncatedInput));
  // more output than allowed
  let data = [0b001, 5, 0, !5, !0, b'h', b'e', b'l', b'l', b'o'];
  assert_eq!(inflate(&data, 4), Err(PngError::CorruptStream));
}

#[test]
fn test_inflate_huge_limit_small_stream() {
  // a limit far past what could ever be allocated still works when the
  // stream itself is small
  let data = [0b001, 5, 0, !5, !0, b'h', b'e', b'l', b'l', b'o'];
  let (out, used) = inflate(&data, usize::MAX / 2).unwrap();
  assert_eq!(out, b"hello");
  assert_eq!(used, 10);
  assert!(out.capacity() <= INITIAL_RESERVE);

  let data = [0xCB, 0x48, 0xCD, 0xC9, 0xC9, 0x07, 0x00];
  assert_eq!(inflate(&data, isize::MAX as usize), Ok((b"hello".to_vec(), 7)));
}

#[test]
fn test_inflate_fixed() {
  // raw deflate data of zlib's compression of "hello"
  let data = [0xCB, 0x48, 0xCD, 0xC9, 0xC9, 0x07, 0x00];
  assert_eq!(inflate(&data, 5), Ok((b"hello".to_vec(), 7)));
  assert_eq!(inflate(&data, 4), Err(PngError::CorruptStream));
  assert_eq!(inflate(&data[..3], 5), Err(PngError::TruncatedInput));
  assert_eq!(inflate(&[], 5), Err(PngError::TruncatedInput));
}

#[test]
fn test_inflate_bad_block_type() {
  assert_eq!(inflate(&[0b111, 0, 0, 0], 10), Err(PngError::CorruptStream));
}

#[test]
fn test_inflate_back_ref_bounds() {
  let mut codes = [0_u16; 288];
  canonical_codes(&FIXED_LIT_LEN_LENGTHS, &mut codes).unwrap();
  let fixed_block = |body: &dyn Fn(&mut BitSink)| {
    let mut v = Vec::new();
    let mut sink = BitSink::new(&mut v);
    sink.put_bits(1, 1);
    sink.put_bits(1, 2);
    body(&mut sink);
    sink.put_code(codes[256], 7);
    sink.finish();
    v
  };
  // a back reference before any output
  let data = fixed_block(&|sink: &mut BitSink| {
    sink.put_code(codes[257], 7);
    sink.put_code(0, 5);
  });
  assert_eq!(inflate(&data, 100), Err(PngError::CorruptStream));
  // "ab" then length 5 distance 2 overlaps itself into "abababa"
  let data = fixed_block(&|sink: &mut BitSink| {
    sink.put_code(codes[usize::from(b'a')], 8);
    sink.put_code(codes[usize::from(b'b')], 8);
    sink.put_code(codes[259], 7);
    sink.put_code(1, 5);
  });
  assert_eq!(inflate(&data, 100).unwrap().0, b"abababa");
  assert_eq!(inflate(&data, 6), Err(PngError::CorruptStream));
  // distance symbols 30 and 31 don't exist
  let data = fixed_block(&|sink: &mut BitSink| {
    sink.put_code(codes[usize::from(b'a')], 8);
    sink.put_code(codes[257], 7);
    sink.put_code(30, 5);
  });
  assert_eq!(inflate(&data, 100), Err(PngError::CorruptStream));
  // neither do length symbols 286 and 287
  let data = fixed_block(&|sink: &mut BitSink| {
    sink.put_code(codes[usize::from(b'a')], 8);
    sink.put_code(codes[286], 8);
  });
  assert_eq!(inflate(&data, 100), Err(PngError::CorruptStream));
}

#[test]
fn test_inflate_dynamic() {
  // literal/length alphabet: only 'a' and end-of-block, one bit each.
  // distance alphabet: a single unused entry.
  let mut cl_lengths = [0_u8; 19];
  cl_lengths[0] = 2;
  cl_lengths[1] = 2;
  cl_lengths[18] = 1;
  let mut cl_codes = [0_u16; 19];
  canonical_codes(&cl_lengths, &mut cl_codes).unwrap();
  let mut lit_lengths = [0_u8; 257];
  lit_lengths[usize::from(b'a')] = 1;
  lit_lengths[256] = 1;
  let mut lit_codes = [0_u16; 257];
  canonical_codes(&lit_lengths, &mut lit_codes).unwrap();

  let mut v = Vec::new();
  let mut sink = BitSink::new(&mut v);
  sink.put_bits(1, 1);
  sink.put_bits(2, 2);
  sink.put_bits(0, 5); // HLIT = 257
  sink.put_bits(0, 5); // HDIST = 1
  sink.put_bits(14, 4); // HCLEN = 18
  for i in CODE_LENGTH_ORDER[..18].iter().copied() {
    sink.put_bits(u32::from(cl_lengths[i]), 3);
  }
  // 97 zeros, then a 1 for 'a'
  sink.put_code(cl_codes[18], 1);
  sink.put_bits(97 - 11, 7);
  sink.put_code(cl_codes[1], 2);
  // 158 zeros, then a 1 for end-of-block
  sink.put_code(cl_codes[18], 1);
  sink.put_bits(138 - 11, 7);
  sink.put_code(cl_codes[18], 1);
  sink.put_bits(20 - 11, 7);
  sink.put_code(cl_codes[1], 2);
  // the one distance length
  sink.put_code(cl_codes[0], 2);
  // data
  for _ in 0..3 {
    sink.put_code(lit_codes[usize::from(b'a')], 1);
  }
  sink.put_code(lit_codes[256], 1);
  sink.finish();
  assert_eq!(inflate(&v, 3).unwrap().0, b"aaa");

  // the same header, but the code lengths overrun HLIT + HDIST
  let mut v = Vec::new();
  let mut sink = BitSink::new(&mut v);
  sink.put_bits(1, 1);
  sink.put_bits(2, 2);
  sink.put_bits(0, 5);
  sink.put_bits(0, 5);
  sink.put_bits(14, 4);
  for i in CODE_LENGTH_ORDER[..18].iter().copied() {
    sink.put_bits(u32::from(cl_lengths[i]), 3);
  }
  sink.put_code(cl_codes[18], 1);
  sink.put_bits(127, 7);
  sink.put_code(cl_codes[18], 1);
  sink.put_bits(127, 7);
  sink.finish();
  assert_eq!(inflate(&v, 3), Err(PngError::CorruptStream));
}

#[test]
fn test_inflate_dynamic_incomplete_tables() {
  fn dynamic_header(sink: &mut BitSink<'_>, cl_lengths: &[u8; 19]) {
    sink.put_bits(1, 1);
    sink.put_bits(2, 2);
    sink.put_bits(0, 5);
    sink.put_bits(0, 5);
    sink.put_bits(15, 4); // HCLEN = 19
    for i in CODE_LENGTH_ORDER.iter().copied() {
      sink.put_bits(u32::from(cl_lengths[i]), 3);
    }
  }

  // the code length codes only fill three quarters of the code space
  let mut cl_lengths = [0_u8; 19];
  cl_lengths[0] = 2;
  cl_lengths[1] = 2;
  cl_lengths[18] = 2;
  let mut v = Vec::new();
  let mut sink = BitSink::new(&mut v);
  dynamic_header(&mut sink, &cl_lengths);
  sink.put_bits(0, 16);
  sink.finish();
  assert_eq!(inflate(&v, 10), Err(PngError::CorruptStream));

  // a lone 1-bit code length code isn't allowed either
  let mut cl_lengths = [0_u8; 19];
  cl_lengths[1] = 1;
  let mut v = Vec::new();
  let mut sink = BitSink::new(&mut v);
  dynamic_header(&mut sink, &cl_lengths);
  sink.put_bits(0, 16);
  sink.finish();
  assert_eq!(inflate(&v, 10), Err(PngError::CorruptStream));

  // a complete code length code, but the codes it describes are incomplete:
  // two 2-bit literal/length codes (symbols 0 and 256) and one 2-bit distance
  let mut cl_lengths = [0_u8; 19];
  cl_lengths[0] = 1;
  cl_lengths[2] = 1;
  let mut cl_codes = [0_u16; 19];
  canonical_codes(&cl_lengths, &mut cl_codes).unwrap();
  let mut v = Vec::new();
  let mut sink = BitSink::new(&mut v);
  dynamic_header(&mut sink, &cl_lengths);
  sink.put_code(cl_codes[2], 1);
  for _ in 1..256 {
    sink.put_code(cl_codes[0], 1);
  }
  sink.put_code(cl_codes[2], 1);
  // the one distance length
  sink.put_code(cl_codes[2], 1);
  sink.finish();
  assert_eq!(inflate(&v, 10), Err(PngError::CorruptStream));
}
