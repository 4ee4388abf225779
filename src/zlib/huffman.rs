use super::*;

/// The longest code DEFLATE allows.
pub const MAX_CODE_LEN: usize = 15;

/// The most symbols any DEFLATE alphabet has (the fixed literal/length
/// alphabet).
pub const MAX_SYMBOLS: usize = 288;

/// The code lengths of the fixed literal/length alphabet.
pub const FIXED_LIT_LEN_LENGTHS: [u8; 288] = {
  let mut out = [0_u8; 288];
  let mut i = 0;
  while i < 288 {
    out[i] = match i {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
    i += 1;
  }
  out
};

/// The code lengths of the fixed distance alphabet.
pub const FIXED_DIST_LENGTHS: [u8; 32] = [5; 32];

/// Counts how many codes there are of each length, and checks that the
/// lengths don't describe an over-subscribed code.
///
/// Also gives the number of unused 15-bit code slots, which is 0 for a
/// complete code.
fn count_lengths(lengths: &[u8]) -> PngResult<([u16; MAX_CODE_LEN + 1], i32)> {
  if lengths.len() > MAX_SYMBOLS {
    return Err(PngError::CorruptStream);
  }
  let mut bl_count = [0_u16; MAX_CODE_LEN + 1];
  for len in lengths.iter().copied() {
    let len = usize::from(len);
    if len > MAX_CODE_LEN {
      return Err(PngError::CorruptStream);
    }
    bl_count[len] += 1;
  }
  bl_count[0] = 0;
  let mut codes_left: i32 = 1;
  for count in bl_count[1..].iter().copied() {
    codes_left = (codes_left << 1) - i32::from(count);
    if codes_left < 0 {
      return Err(PngError::CorruptStream);
    }
  }
  Ok((bl_count, codes_left))
}

/// The numerical value of the smallest code for each code length.
fn first_codes(bl_count: &[u16; MAX_CODE_LEN + 1]) -> [u16; MAX_CODE_LEN + 1] {
  let mut next_code = [0_u16; MAX_CODE_LEN + 1];
  let mut code = 0_u16;
  for bits in 1..=MAX_CODE_LEN {
    code = (code + bl_count[bits - 1]) << 1;
    next_code[bits] = code;
  }
  next_code
}

/// Given a list of code lengths, computes the canonical code of each symbol.
///
/// * A length of 0 means the symbol doesn't participate, and gets code 0.
/// * `codes` must be at least as long as `lengths`.
/// * Incomplete codes are allowed here, only decoding needs a full code.
///
/// ## Failure
/// * `CorruptStream` if a length is over 15 or the code is over-subscribed.
pub fn canonical_codes(lengths: &[u8], codes: &mut [u16]) -> PngResult<()> {
  let (bl_count, _) = count_lengths(lengths)?;
  let mut next_code = first_codes(&bl_count);
  for (len, code) in lengths.iter().copied().zip(codes.iter_mut()) {
    let len = usize::from(len);
    if len != 0 {
      *code = next_code[len];
      next_code[len] += 1;
    } else {
      *code = 0;
    }
  }
  Ok(())
}

/// A Huffman decoding table.
///
/// Each used symbol has one key:
/// `(code << (32 - len)) | (symbol << 4) | len`
///
/// With the codes left-justified like this, a canonical code's keys come out
/// sorted when they're placed in order of length and then symbol, so the
/// table never needs an explicit sort. Decoding is a binary search.
#[derive(Clone, Copy)]
pub struct HuffTable {
  keys: [u32; MAX_SYMBOLS],
  count: usize,
}
impl core::fmt::Debug for HuffTable {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("HuffTable")
      .field("keys", &&self.keys[..self.count.min(8)])
      .field("count", &self.count)
      .finish()
  }
}
impl HuffTable {
  /// A table with no codes, so every decode fails.
  ///
  /// This is what a dynamic block with all distance lengths 0 gets: the
  /// block is only literals.
  #[inline]
  #[must_use]
  pub const fn empty() -> Self {
    Self { keys: [0; MAX_SYMBOLS], count: 0 }
  }

  /// Builds the table from one code length per symbol.
  ///
  /// The code must use up the whole code space. The one exception is a
  /// single code of length 1, which zlib writes for a block that only uses
  /// one distance.
  ///
  /// ## Failure
  /// * `CorruptStream` if there's more than 288 symbols, a length over 15,
  ///   or the code is over-subscribed or incomplete.
  pub fn build(lengths: &[u8]) -> PngResult<Self> {
    let (bl_count, codes_left) = count_lengths(lengths)?;
    let single_one_bit_code = bl_count[1] == 1 && bl_count[2..].iter().all(|&c| c == 0);
    if codes_left != 0 && !single_one_bit_code {
      trace!("incomplete huffman code, {codes_left} slots unused");
      return Err(PngError::CorruptStream);
    }
    Self::build_unchecked(&bl_count, lengths)
  }

  /// Builds the table from one code length per symbol, with no exception
  /// for incomplete codes.
  ///
  /// ## Failure
  /// * As [`build`](Self::build), but a single 1-bit code is also an error.
  pub fn build_complete(lengths: &[u8]) -> PngResult<Self> {
    let (bl_count, codes_left) = count_lengths(lengths)?;
    if codes_left != 0 {
      return Err(PngError::CorruptStream);
    }
    Self::build_unchecked(&bl_count, lengths)
  }

  fn build_unchecked(bl_count: &[u16; MAX_CODE_LEN + 1], lengths: &[u8]) -> PngResult<Self> {
    let mut next_code = first_codes(bl_count);

    let mut next_slot = [0_usize; MAX_CODE_LEN + 1];
    let mut slot = 0_usize;
    for (len, count) in bl_count.iter().copied().enumerate().skip(1) {
      next_slot[len] = slot;
      slot += usize::from(count);
    }
    let count = slot;

    let mut keys = [0_u32; MAX_SYMBOLS];
    for (symbol, len) in lengths.iter().copied().enumerate() {
      if len == 0 {
        continue;
      }
      let len = usize::from(len);
      let code = u32::from(next_code[len]);
      next_code[len] += 1;
      let key = (code << (32 - len)) | ((symbol as u32) << 4) | (len as u32);
      let slot = next_slot[len];
      if slot >= count {
        return Err(PngError::CorruptStream);
      }
      keys[slot] = key;
      next_slot[len] += 1;
    }
    debug_assert!(keys[..count].windows(2).all(|w| w[0] < w[1]));
    Ok(Self { keys, count })
  }

  /// How many symbols have a code.
  #[inline]
  #[must_use]
  pub const fn len(&self) -> usize {
    self.count
  }

  /// If no symbols have a code.
  #[inline]
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.count == 0
  }

  /// Decodes one symbol.
  ///
  /// ## Failure
  /// * `CorruptStream` if the upcoming bits aren't any symbol's code.
  /// * `TruncatedInput` if the code runs past the end of the input.
  pub fn decode(&self, bits: &mut BitSource<'_>) -> PngResult<u16> {
    // the first bit of the stream ends up as the highest bit
    let search = bits.peek_bits16().reverse_bits() | 0xFFFF;
    let keys = &self.keys[..self.count];
    let i = keys.partition_point(|&key| key <= search);
    if i == 0 {
      return Err(PngError::CorruptStream);
    }
    let key = keys[i - 1];
    let len = key & 0xF;
    if (key ^ search) >> (32 - len) != 0 {
      return Err(PngError::CorruptStream);
    }
    bits.consume_bits(len)?;
    Ok(((key >> 4) & 0x1FF) as u16)
  }
}

#[cfg(test)]
fn assert_every_symbol_decodes(lengths: &[u8]) {
  use alloc::vec;
  let mut codes = vec![0_u16; lengths.len()];
  canonical_codes(lengths, &mut codes).unwrap();
  let table = HuffTable::build(lengths).unwrap();
  assert_eq!(table.len(), lengths.iter().filter(|&&l| l != 0).count());
  let mut buf = Vec::new();
  let mut sink = BitSink::new(&mut buf);
  for (len, code) in lengths.iter().copied().zip(codes.iter().copied()) {
    if len != 0 {
      sink.put_code(code, u32::from(len));
    }
  }
  sink.finish();
  let mut bits = BitSource::new(&buf);
  for (symbol, len) in lengths.iter().copied().enumerate() {
    if len != 0 {
      assert_eq!(table.decode(&mut bits), Ok(symbol as u16), "symbol {symbol}, len {len}");
    }
  }
}

#[test]
fn test_canonical_codes() {
  // the small example in the RFC.
  let mut codes = [0_u16; 4];
  canonical_codes(&[2, 1, 3, 3], &mut codes).unwrap();
  assert_eq!(codes, [0b10, 0b0, 0b110, 0b111]);

  // the bigger example in the RFC.
  let mut codes = [0_u16; 8];
  canonical_codes(&[3, 3, 3, 3, 3, 2, 4, 4], &mut codes).unwrap();
  assert_eq!(codes, [0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111]);

  /* Table from the "compressed with fixed huffman codes"

      Lit Value     Bits    Codes
      ---------     ----    ----
      0 - 143       8       00110000 through
                            10111111
      144 - 255     9       110010000 through
                            111111111
      256 - 279     7       0000000 through
                            0010111
      280 - 287     8       11000000 through
                            11000111
  */
  let mut v = [0_u16; 288];
  canonical_codes(&FIXED_LIT_LEN_LENGTHS, &mut v).unwrap();
  assert_eq!(v[0], 0b00110000);
  assert_eq!(v[143], 0b10111111);
  assert_eq!(v[144], 0b110010000);
  assert_eq!(v[255], 0b111111111);
  assert_eq!(v[256], 0b0000000);
  assert_eq!(v[279], 0b0010111);
  assert_eq!(v[280], 0b11000000);
  assert_eq!(v[287], 0b11000111);
}

#[test]
fn test_huff_table_decodes_every_symbol() {
  assert_every_symbol_decodes(&FIXED_LIT_LEN_LENGTHS);
  assert_every_symbol_decodes(&FIXED_DIST_LENGTHS);
  assert_every_symbol_decodes(&[3, 3, 3, 3, 3, 2, 4, 4]);
  // the longest possible codes
  assert_every_symbol_decodes(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 15]);
  // unused symbols scattered around
  assert_every_symbol_decodes(&[0, 4, 0, 4, 3, 0, 2, 3, 4, 0, 4, 2, 0, 0]);
  // a single code
  assert_every_symbol_decodes(&[0, 0, 1]);
}

#[test]
fn test_huff_table_rejects_bad_lengths() {
  // three 1-bit codes can't exist
  assert_eq!(HuffTable::build(&[1, 1, 1]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build(&[2, 2, 2, 2, 2]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build(&[16, 1]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build(&[1; 289]).unwrap_err(), PngError::CorruptStream);
}

#[test]
fn test_huff_table_incomplete_code() {
  // one 1-bit code: "0" decodes, "1" doesn't
  let table = HuffTable::build(&[0, 1]).unwrap();
  let mut bits = BitSource::new(&[0b0000_0010]);
  assert_eq!(table.decode(&mut bits), Ok(1));
  assert_eq!(table.decode(&mut bits), Err(PngError::CorruptStream));
  assert_eq!(HuffTable::build_complete(&[0, 1]).unwrap_err(), PngError::CorruptStream);

  // any other code that leaves slots unused is rejected
  assert_eq!(HuffTable::build(&[2, 2, 2]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build(&[3, 3, 0, 1]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build(&[0, 2]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build(&[0, 0, 0]).unwrap_err(), PngError::CorruptStream);
  assert_eq!(HuffTable::build_complete(&[2, 2, 2]).unwrap_err(), PngError::CorruptStream);
  assert!(HuffTable::build_complete(&[2, 2, 1]).is_ok());

  // nothing decodes from an empty table
  let empty = HuffTable::empty();
  assert!(empty.is_empty());
  assert_eq!(empty.decode(&mut BitSource::new(&[0])), Err(PngError::CorruptStream));
}
