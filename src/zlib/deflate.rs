use super::*;

/// The longest run a single back reference covers.
///
/// This keeps every run inside one length code's range (115 is the base of
/// length symbol 280, with 4 extra bits).
const MAX_RUN: usize = 115;

fn fixed_lit_len_codes() -> [u16; 288] {
  let mut codes = [0_u16; 288];
  let result = canonical_codes(&FIXED_LIT_LEN_LENGTHS, &mut codes);
  debug_assert!(result.is_ok());
  codes
}

#[inline]
fn put_symbol(sink: &mut BitSink<'_>, codes: &[u16; 288], symbol: usize) {
  sink.put_code(codes[symbol], u32::from(FIXED_LIT_LEN_LENGTHS[symbol]));
}

/// Writes `run` more copies of `byte`, which was the last byte written.
fn put_run(sink: &mut BitSink<'_>, codes: &[u16; 288], byte: u8, run: usize) {
  debug_assert!(run <= MAX_RUN);
  match run {
    0 => (),
    1 | 2 => {
      for _ in 0..run {
        put_symbol(sink, codes, usize::from(byte));
      }
    }
    _ => {
      let mut i = LENGTH_BASE.len() - 1;
      while usize::from(LENGTH_BASE[i]) > run {
        i -= 1;
      }
      put_symbol(sink, codes, 257 + i);
      sink.put_bits((run - usize::from(LENGTH_BASE[i])) as u32, u32::from(LENGTH_EXTRA[i]));
      // distance symbol 0 is a distance of 1, with no extra bits
      sink.put_code(0, 5);
    }
  }
}

/// Writes `data` as a single, final, fixed-Huffman DEFLATE block.
///
/// There's no real match searching. The first byte of each run of equal
/// bytes is a literal, and the rest of the run (up to 115 bytes at a time)
/// becomes a distance 1 back reference. Runs of only one or two repeats are
/// cheaper as literals, so they stay literals.
///
/// The sink is *not* finished, so more data can follow the block.
pub fn deflate_fixed_to(data: &[u8], sink: &mut BitSink<'_>) {
  let codes = fixed_lit_len_codes();
  sink.put_bits(1, 1);
  sink.put_bits(1, 2);

  let mut previous: Option<u8> = None;
  let mut run = 0_usize;
  for byte in data.iter().copied() {
    if previous == Some(byte) {
      run += 1;
      if run == MAX_RUN {
        put_run(sink, &codes, byte, run);
        run = 0;
      }
    } else {
      if let Some(p) = previous {
        put_run(sink, &codes, p, run);
      }
      run = 0;
      put_symbol(sink, &codes, usize::from(byte));
      previous = Some(byte);
    }
  }
  if let Some(p) = previous {
    put_run(sink, &codes, p, run);
  }

  put_symbol(sink, &codes, 256);
}

/// Compresses `data` into raw DEFLATE data (no zlib wrapper).
///
/// See [`deflate_fixed_to`] for details.
pub fn deflate_fixed(data: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  let mut sink = BitSink::new(&mut out);
  deflate_fixed_to(data, &mut sink);
  sink.finish();
  out
}

#[cfg(test)]
fn assert_deflate_round_trip(data: &[u8]) -> usize {
  let packed = deflate_fixed(data);
  let (unpacked, consumed) = inflate(&packed, data.len()).unwrap();
  assert_eq!(unpacked, data);
  assert_eq!(consumed, packed.len());
  packed.len()
}

#[test]
fn test_deflate_fixed_small() {
  assert_eq!(assert_deflate_round_trip(b""), 2);
  assert_deflate_round_trip(b"a");
  assert_deflate_round_trip(b"ab");
  assert_deflate_round_trip(b"aab");
  assert_deflate_round_trip(b"aaab");
  assert_deflate_round_trip(b"\xFF\xFF\x00\x90\x90\x90\x90\x8F");
  // literal (8) + length 3 (7) + distance (5) + end (7), after the 3 header
  // bits, is 30 bits
  assert_eq!(assert_deflate_round_trip(b"aaaa"), 4);
}

#[test]
fn test_deflate_fixed_runs() {
  use alloc::vec;
  for run in [3, 4, 10, 11, 18, 19, 34, 35, 66, 67, 130, 131, 257, 258, 259, 260, 1000] {
    let mut data = vec![7_u8; run];
    data.push(200);
    data.extend(core::iter::repeat(200).take(run));
    assert_deflate_round_trip(&data);
  }
  // a long run collapses down to almost nothing
  let size = assert_deflate_round_trip(&vec![0_u8; 100_000]);
  assert!(size < 2_000, "{size}");
}

#[test]
fn test_deflate_fixed_run_cap() {
  use alloc::vec;
  // header (3) + literal (8) + length 115 (8 + 4) + distance (5) + end (7)
  // is 35 bits
  assert_eq!(assert_deflate_round_trip(&vec![7_u8; 1 + 115]), 5);
  // one more repeat is past the cap, so it's a literal of its own
  assert_eq!(assert_deflate_round_trip(&vec![7_u8; 1 + 116]), 6);
  // two capped back references, 52 bits
  assert_eq!(assert_deflate_round_trip(&vec![7_u8; 1 + 230]), 7);
}

#[test]
fn test_deflate_fixed_all_bytes() {
  let data: Vec<u8> = (0..=255_u8).chain((0..=255_u8).rev()).collect();
  let size = assert_deflate_round_trip(&data);
  // every byte is a literal of 8 or 9 bits
  assert!(size <= 2 + data.len() * 9 / 8 + 1, "{size}");
}
