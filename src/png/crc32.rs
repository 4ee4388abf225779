//! The CRC-32 used by PNG chunks.
//!
//! This uses the 16 entry "nibble" table: each byte is processed as two
//! 4-bit steps, which keeps the table tiny at a small speed cost.

const CRC_NIBBLE_TABLE: [u32; 16] = make_crc_nibble_table();

const fn make_crc_nibble_table() -> [u32; 16] {
  let mut out = [0; 16];
  let mut n = 0;
  while n < 16 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 4 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      k += 1;
    }
    out[n] = c;
    n += 1;
  }
  out
}

fn update_crc(mut crc: u32, iter: impl Iterator<Item = u8>) -> u32 {
  for byte in iter {
    crc ^= u32::from(byte);
    crc = CRC_NIBBLE_TABLE[(crc & 0xF) as usize] ^ (crc >> 4);
    crc = CRC_NIBBLE_TABLE[(crc & 0xF) as usize] ^ (crc >> 4);
  }
  crc
}

/// Computes the CRC-32 of all bytes in the iterator.
///
/// For a PNG chunk, this should be the chunk type followed by the chunk data.
#[inline]
pub fn png_crc(iter: impl Iterator<Item = u8>) -> u32 {
  update_crc(u32::MAX, iter) ^ u32::MAX
}

#[test]
fn test_png_crc() {
  assert_eq!(png_crc(b"".iter().copied()), 0);
  assert_eq!(png_crc(b"123456789".iter().copied()), 0xCBF4_3926);
  assert_eq!(png_crc(b"IEND".iter().copied()), 0xAE42_6082);
  assert_eq!(CRC_NIBBLE_TABLE[1], 0x1DB7_1064);
  assert_eq!(CRC_NIBBLE_TABLE[8], 0xEDB8_8320);
}
