const MOD_ADLER: u32 = 65521;

/// The largest number of bytes that can be summed before the `u32` sums need
/// to be reduced.
const NMAX: usize = 5552;

/// A running Adler-32 checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Adler32 {
  a: u32,
  b: u32,
}
impl Default for Adler32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl Adler32 {
  /// A fresh checksum.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { a: 1, b: 0 }
  }

  /// Adds more bytes to the checksum.
  pub fn update(&mut self, bytes: &[u8]) {
    for chunk in bytes.chunks(NMAX) {
      for byte in chunk.iter().copied() {
        self.a += u32::from(byte);
        self.b += self.a;
      }
      self.a %= MOD_ADLER;
      self.b %= MOD_ADLER;
    }
  }

  /// The checksum value so far.
  #[inline]
  #[must_use]
  pub const fn value(&self) -> u32 {
    (self.b << 16) | self.a
  }
}

/// Computes the Adler-32 of the bytes all at once.
#[inline]
#[must_use]
pub fn adler32(bytes: &[u8]) -> u32 {
  let mut adler = Adler32::new();
  adler.update(bytes);
  adler.value()
}

#[test]
fn test_adler32() {
  assert_eq!(adler32(b""), 1);
  assert_eq!(adler32(b"a"), 0x0062_0062);
  assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
  // split updates match the one-shot value, even across the reduction size
  let data: alloc::vec::Vec<u8> = (0..20_000_u32).map(|i| (i * 7 + 3) as u8).collect();
  let mut running = Adler32::new();
  for part in data.chunks(777) {
    running.update(part);
  }
  assert_eq!(running.value(), adler32(&data));
  // all 0xFF is the worst case for overflow
  let ones = [0xFF_u8; NMAX * 3];
  let mut slow = Adler32::new();
  for byte in ones.iter() {
    slow.update(core::slice::from_ref(byte));
  }
  assert_eq!(slow.value(), adler32(&ones));
}
