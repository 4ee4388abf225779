use alloc::vec::Vec;

/// Pushes bits onto the end of a byte vector in DEFLATE order (the first bit
/// written goes in the lowest bit of a byte).
///
/// Call [`finish`](Self::finish) to write out any final partial byte.
#[derive(Debug)]
pub struct BitSink<'v> {
  out: &'v mut Vec<u8>,
  spare_bits: u32,
  spare_bit_count: u32,
}
impl<'v> BitSink<'v> {
  /// Appends to the end of `out`.
  #[inline]
  pub fn new(out: &'v mut Vec<u8>) -> Self {
    Self { out, spare_bits: 0, spare_bit_count: 0 }
  }

  /// Writes the low `count` bits of `bits`, lowest bit first.
  ///
  /// ## Panics
  /// * In debug builds, if `count` is more than 16.
  #[inline]
  pub fn put_bits(&mut self, bits: u32, count: u32) {
    debug_assert!(count <= 16);
    debug_assert!(count == 16 || bits < (1 << count));
    self.spare_bits |= bits << self.spare_bit_count;
    self.spare_bit_count += count;
    while self.spare_bit_count >= 8 {
      self.out.push(self.spare_bits as u8);
      self.spare_bits >>= 8;
      self.spare_bit_count -= 8;
    }
  }

  /// Writes a Huffman code.
  ///
  /// Huffman codes are defined most significant bit first, so the code's bits
  /// get reversed before being written.
  #[inline]
  pub fn put_code(&mut self, code: u16, len: u32) {
    let reversed = u32::from(code.reverse_bits()) >> (16 - len);
    self.put_bits(reversed, len);
  }

  /// Pads the last partial byte with zero bits and writes it out.
  #[inline]
  pub fn finish(self) {
    if self.spare_bit_count > 0 {
      self.out.push(self.spare_bits as u8);
    }
  }
}

#[test]
fn test_bit_sink() {
  let mut v = alloc::vec![0xAA];
  let mut sink = BitSink::new(&mut v);
  sink.put_bits(1, 1);
  sink.put_bits(0b10, 2);
  sink.put_bits(0b10101, 5);
  sink.put_code(0b001, 3);
  sink.finish();
  assert_eq!(v, [0xAA, 0b1010_1101, 0b0000_0100]);
}
