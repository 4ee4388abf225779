use crate::{PngError, PngResult};

/// Pulls bits out of a byte slice in DEFLATE order.
///
/// DEFLATE packs data starting from the least significant bit of each byte,
/// so the "next" bit is always the lowest of the spare bits.
///
/// At least 16 spare bits are always kept ready so that Huffman decoding can
/// peek ahead. If the input runs out, zero bytes are fed in to keep the peek
/// window full, but those bits can't be consumed: trying to do so is a
/// `TruncatedInput` error.
pub struct BitSource<'b> {
  bytes: &'b [u8],
  position: usize,
  spare_bits: u32,
  spare_bit_count: u32,
  overrun_bit_count: u32,
}

impl core::fmt::Debug for BitSource<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let width = self.spare_bit_count as usize;
    f.debug_struct("BitSource")
      .field("position", &self.position)
      .field("len", &self.bytes.len())
      .field("spare_bits", &format_args!("{bits:0width$b}", bits = self.spare_bits, width = width))
      .field("spare_bit_count", &self.spare_bit_count)
      .field("overrun_bit_count", &self.overrun_bit_count)
      .finish()
  }
}

impl<'b> BitSource<'b> {
  /// Starts reading at the first bit of `bytes`.
  pub fn new(bytes: &'b [u8]) -> Self {
    let mut out =
      Self { bytes, position: 0, spare_bits: 0, spare_bit_count: 0, overrun_bit_count: 0 };
    out.feed();
    out
  }

  fn feed(&mut self) {
    while self.spare_bit_count < 16 {
      let new_byte = match self.bytes.get(self.position) {
        Some(b) => {
          self.position += 1;
          u32::from(*b)
        }
        None => {
          self.overrun_bit_count += 8;
          0
        }
      };
      self.spare_bits |= new_byte << self.spare_bit_count;
      self.spare_bit_count += 8;
    }
  }

  /// Real (not overrun) bits that haven't been consumed yet, including bits
  /// not yet fed into the spare bits.
  #[inline]
  #[must_use]
  pub fn bits_remaining(&self) -> usize {
    let spare_real = (self.spare_bit_count - self.overrun_bit_count) as usize;
    spare_real + (self.bytes.len() - self.position) * 8
  }

  /// How many input bytes have been at least partly consumed.
  #[inline]
  #[must_use]
  pub fn bytes_consumed(&self) -> usize {
    let spare_real = (self.spare_bit_count - self.overrun_bit_count) as usize;
    self.position - spare_real / 8
  }

  /// The next 16 bits, without consuming them.
  ///
  /// The next bit of the stream is bit 0 of the output.
  #[inline]
  #[must_use]
  pub fn peek_bits16(&self) -> u32 {
    self.spare_bits & 0xFFFF
  }

  /// Consumes `count` bits and returns them (first bit in bit 0).
  ///
  /// ## Panics
  /// * In debug builds, if `count` is more than 16.
  #[inline]
  pub fn consume_bits(&mut self, count: u32) -> PngResult<u32> {
    debug_assert!(count <= 16);
    if count > self.spare_bit_count - self.overrun_bit_count {
      return Err(PngError::TruncatedInput);
    }
    let out = self.spare_bits & ((1 << count) - 1);
    self.spare_bits >>= count;
    self.spare_bit_count -= count;
    self.feed();
    Ok(out)
  }

  /// Consumes a single bit as a `bool`.
  #[inline]
  pub fn consume_bool(&mut self) -> PngResult<bool> {
    Ok(self.consume_bits(1)? != 0)
  }

  /// Skips any bits left in the current partial byte.
  #[inline]
  pub fn align_to_byte(&mut self) {
    let partial = self.spare_bit_count % 8;
    self.spare_bits >>= partial;
    self.spare_bit_count -= partial;
    self.feed();
  }

  /// Consumes a whole byte. Only sensible after [`align_to_byte`](Self::align_to_byte).
  #[inline]
  pub fn consume_byte(&mut self) -> PngResult<u8> {
    Ok(self.consume_bits(8)? as u8)
  }
}

#[test]
fn test_bit_source_order() {
  let mut bits = BitSource::new(&[0b1010_1101, 0b0000_0001, 0xFF]);
  assert_eq!(bits.peek_bits16(), 0b0000_0001_1010_1101);
  assert_eq!(bits.consume_bits(1), Ok(1));
  assert_eq!(bits.consume_bits(2), Ok(0b10));
  assert_eq!(bits.consume_bits(5), Ok(0b10101));
  assert_eq!(bits.bytes_consumed(), 1);
  assert_eq!(bits.consume_bits(3), Ok(0b001));
  assert_eq!(bits.bytes_consumed(), 2);
  bits.align_to_byte();
  assert_eq!(bits.bytes_consumed(), 2);
  assert_eq!(bits.consume_byte(), Ok(0xFF));
  assert_eq!(bits.bits_remaining(), 0);
  assert_eq!(bits.consume_bits(1), Err(PngError::TruncatedInput));
}

#[test]
fn test_bit_source_overrun_peek_is_allowed() {
  let mut bits = BitSource::new(&[0x0F]);
  // peeking past the end is fine, the missing bits read as zero
  assert_eq!(bits.peek_bits16(), 0x000F);
  assert_eq!(bits.bits_remaining(), 8);
  assert_eq!(bits.consume_bits(9), Err(PngError::TruncatedInput));
  assert_eq!(bits.consume_bits(8), Ok(0x0F));
  assert_eq!(bits.consume_bits(0), Ok(0));
  assert_eq!(bits.consume_bits(1), Err(PngError::TruncatedInput));
}
