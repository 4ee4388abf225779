use pngsmith::{
  png::{self, ChunkType, PngColorType, RawChunkIter, IHDR, PNG_SIGNATURE},
  zlib, *,
};
use walkdir::WalkDir;

/// Builds a PNG around already filtered image data, compressed by
/// `miniz_oxide` at its best level (so the IDAT uses dynamic Huffman blocks),
/// and split over `idat_count` chunks.
fn png_from_filtered(
  ihdr: IHDR, before_idat: &[(ChunkType, &[u8])], filtered: &[u8], idat_count: usize,
) -> Vec<u8> {
  let compressed = miniz_oxide::deflate::compress_to_vec_zlib(filtered, 9);
  let mut v = Vec::from(PNG_SIGNATURE);
  png::write_chunk(&mut v, ChunkType::IHDR, &ihdr.to_chunk_data()).unwrap();
  for (type_, data) in before_idat {
    png::write_chunk(&mut v, *type_, data).unwrap();
  }
  let per_chunk = compressed.len() / idat_count + 1;
  for part in compressed.chunks(per_chunk) {
    png::write_chunk(&mut v, ChunkType::IDAT, part).unwrap();
  }
  png::write_chunk(&mut v, ChunkType::IEND, &[]).unwrap();
  v
}

fn idat_data_len(png: &[u8]) -> usize {
  RawChunkIter::new(png)
    .map(|c| c.unwrap())
    .filter(|c| c.type_ == ChunkType::IDAT)
    .map(|c| c.data.len())
    .sum()
}

#[test]
fn test_round_trip_small_images() {
  for (width, height) in [(1, 1), (1, 7), (7, 1), (3, 3), (16, 9), (33, 2)] {
    let count = (width * height) as usize;
    let pixels: Vec<RGBA8> =
      (0..count).map(|i| RGBA8::new(i as u8, (i * 3) as u8, 255 - i as u8, (i % 5) as u8)).collect();
    let png = encode_png(width, height, &pixels).unwrap();
    let bitmap = decode_png(&png).unwrap();
    assert_eq!(bitmap.width, width);
    assert_eq!(bitmap.height, height);
    assert_eq!(bitmap.pixels, pixels);
  }
}

#[test]
fn test_round_trip_random_images() {
  for (width, height) in [(1, 1), (5, 4), (64, 64), (200, 3)] {
    let bytes = super::rand_bytes((width * height * 4) as usize);
    let pixels: &[RGBA8] = bytemuck::cast_slice(&bytes[..]);
    let png = encode_png(width, height, pixels).unwrap();
    let bitmap = Bitmap::try_from_png_bytes(&png).unwrap();
    assert_eq!(bitmap.pixels, pixels);
  }
}

#[test]
fn test_encode_is_idempotent() {
  let bytes = super::rand_bytes(20 * 10 * 4);
  let pixels: &[RGBA8] = bytemuck::cast_slice(&bytes[..]);
  let first = encode_png(20, 10, pixels).unwrap();
  let second = decode_png(&first).unwrap().to_png_bytes().unwrap();
  assert_eq!(first, second);
}

#[test]
fn test_two_by_two_scenario() {
  let red = RGBA8::new(255, 0, 0, 255);
  let green = RGBA8::new(0, 255, 0, 255);
  let blue = RGBA8::new(0, 0, 255, 255);
  let yellow = RGBA8::new(255, 255, 0, 255);
  let pixels = [red, green, blue, yellow];
  let png = encode_png(2, 2, &pixels).unwrap();
  assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
  assert_eq!(
    &png[8..29],
    &[0, 0, 0, 13, b'I', b'H', b'D', b'R', 0, 0, 0, 2, 0, 0, 0, 2, 8, 6, 0, 0, 0]
  );
  assert_eq!(&png[png.len() - 12..], &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);
  let bitmap = decode_png(&png).unwrap();
  assert_eq!(bitmap.get(0, 0), Some(&red));
  assert_eq!(bitmap.get(1, 0), Some(&green));
  assert_eq!(bitmap.get(0, 1), Some(&blue));
  assert_eq!(bitmap.get(1, 1), Some(&yellow));
}

#[test]
fn test_hand_built_stored_block_png() {
  // one white pixel: filter byte 0 then RGBA
  let filtered = [0_u8, 255, 255, 255, 255];
  assert_eq!(zlib::adler32(&filtered), 0x09FB_03FD);
  #[rustfmt::skip]
  let zlib_stream = [
    0x78, 0x01,
    // final stored block, LEN 5, NLEN !5
    0x01, 0x05, 0x00, 0xFA, 0xFF,
    0, 255, 255, 255, 255,
    0x09, 0xFB, 0x03, 0xFD,
  ];
  let mut v = Vec::from(PNG_SIGNATURE);
  png::write_chunk(&mut v, ChunkType::IHDR, &IHDR::rgba8(1, 1).to_chunk_data()).unwrap();
  png::write_chunk(&mut v, ChunkType::IDAT, &zlib_stream).unwrap();
  png::write_chunk(&mut v, ChunkType::IEND, &[]).unwrap();
  let bitmap = decode_png(&v).unwrap();
  assert_eq!(bitmap.pixels, [RGBA8::new(255, 255, 255, 255)]);
}

#[test]
fn test_solid_color_compresses() {
  let pixels = vec![RGBA8::new(12, 34, 56, 255); 100 * 100];
  let png = encode_png(100, 100, &pixels).unwrap();
  let idat_len = idat_data_len(&png);
  assert!(idat_len < 40_000, "{idat_len}");
  assert_eq!(decode_png(&png).unwrap().pixels, pixels);
}

#[test]
fn test_truncated_idat_rejected() {
  let bytes = super::rand_bytes(8 * 8 * 4);
  let png = encode_png(8, 8, bytemuck::cast_slice(&bytes[..])).unwrap();
  // signature (8) + IHDR chunk (25) puts the IDAT chunk at 33
  let idat_start = 33;
  let idat_end = idat_start + 12 + idat_data_len(&png);
  for cut in idat_start..idat_end {
    assert_eq!(decode_png(&png[..cut]), Err(PngError::TruncatedInput), "cut: {cut}");
  }
  for cut in 0..idat_end {
    assert!(decode_png(&png[..cut]).is_err(), "cut: {cut}");
  }
  // only IEND missing, the image data is all there
  assert!(decode_png(&png[..idat_end]).is_ok());
}

#[test]
fn test_corrupt_image_data_rejected() {
  let pixels = vec![RGBA8::new(1, 2, 3, 4); 5 * 5];
  let png = encode_png(5, 5, &pixels).unwrap();
  // flip a bit of the Adler-32, which sits just before the IDAT CRC
  let mut bad = png.clone();
  let adler_byte = png.len() - 12 - 4 - 1;
  bad[adler_byte] ^= 0x10;
  assert_eq!(decode_png(&bad), Err(PngError::CorruptStream));
  // a bad chunk CRC on its own is not an error
  let mut bad_crc = png.clone();
  let crc_byte = png.len() - 12 - 1;
  bad_crc[crc_byte] ^= 0x10;
  assert_eq!(decode_png(&bad_crc).unwrap().pixels, pixels);
}

#[test]
fn test_miniz_oxide_interop() {
  let mut data = super::rand_bytes(3000);
  data.extend(b"the quick brown fox jumps over the lazy dog. ".iter().cycle().take(5000));
  data.extend(std::iter::repeat(0).take(2000));

  // miniz_oxide's dynamic blocks, decoded by us
  let theirs = miniz_oxide::deflate::compress_to_vec_zlib(&data, 9);
  assert_eq!(zlib::zlib_decompress(&theirs, data.len()).unwrap(), data);
  for cut in [1, 2, 10, theirs.len() / 2, theirs.len() - 5, theirs.len() - 1] {
    assert!(zlib::zlib_decompress(&theirs[..cut], data.len()).is_err());
  }

  // our fixed block, decoded by miniz_oxide
  let ours = zlib::zlib_compress(&data).unwrap();
  assert_eq!(miniz_oxide::inflate::decompress_to_vec_zlib(&ours).unwrap(), data);
}

#[test]
fn test_decode_other_color_types() {
  // 1-bit greyscale, 10x2, with the 1 value marked transparent
  let ihdr = IHDR { width: 10, height: 2, bit_depth: 1, color_type: PngColorType::Y };
  let filtered = [0, 0b1010_0000, 0b0100_0000, 2, 0b0101_0000, 0b1000_0000];
  let png = png_from_filtered(ihdr, &[(ChunkType::tRNS, &[0_u8, 1][..])], &filtered, 2);
  let bitmap = decode_png(&png).unwrap();
  let on = RGBA8::grey(255, 0);
  let off = RGBA8::grey(0, 255);
  #[rustfmt::skip]
  let expected = [
    on, off, on, off, off, off, off, off, off, on,
    // Up filter: each byte is added to the byte above
    on, on, on, on, off, off, off, off, on, on,
  ];
  assert_eq!(bitmap.pixels, expected);

  // 2-bit indexed with a short tRNS
  let ihdr = IHDR { width: 3, height: 1, bit_depth: 2, color_type: PngColorType::Index };
  let plte = [9_u8, 9, 9, 100, 110, 120, 1, 2, 3];
  let filtered = [0, 0b00_01_10_00];
  let chunks: [(ChunkType, &[u8]); 2] =
    [(ChunkType::PLTE, &plte[..]), (ChunkType::tRNS, &[50_u8][..])];
  let bitmap = decode_png(&png_from_filtered(ihdr, &chunks, &filtered, 1)).unwrap();
  assert_eq!(
    bitmap.pixels,
    [RGBA8::new(9, 9, 9, 50), RGBA8::new(100, 110, 120, 255), RGBA8::new(1, 2, 3, 255)]
  );

  // 8-bit RGB with Paeth on both rows, over several IDAT chunks
  let ihdr = IHDR { width: 2, height: 2, bit_depth: 8, color_type: PngColorType::RGB };
  let filtered = [4, 10, 20, 30, 5, 5, 5, 4, 1, 1, 1, 7, 7, 7];
  let bitmap = decode_png(&png_from_filtered(ihdr, &[], &filtered, 3)).unwrap();
  assert_eq!(
    bitmap.pixels,
    [
      RGBA8::new(10, 20, 30, 255),
      RGBA8::new(15, 25, 35, 255),
      RGBA8::new(11, 21, 31, 255),
      RGBA8::new(22, 32, 42, 255),
    ]
  );

  // 8-bit greyscale + alpha with Average
  let ihdr = IHDR { width: 2, height: 1, bit_depth: 8, color_type: PngColorType::YA };
  let filtered = [3, 100, 200, 10, 10];
  let bitmap = decode_png(&png_from_filtered(ihdr, &[], &filtered, 1)).unwrap();
  assert_eq!(bitmap.pixels, [RGBA8::grey(100, 200), RGBA8::grey(60, 110)]);
}

#[test]
fn test_rgb_transparency_key_low_bytes() {
  // the high byte of each key channel is set, but 8-bit samples only compare
  // against the low byte
  let ihdr = IHDR { width: 2, height: 1, bit_depth: 8, color_type: PngColorType::RGB };
  let filtered = [0, 1, 2, 3, 1, 2, 4];
  let key = [1_u8, 1, 0, 2, 0, 3];
  let png = png_from_filtered(ihdr, &[(ChunkType::tRNS, &key[..])], &filtered, 1);
  let bitmap = decode_png(&png).unwrap();
  assert_eq!(bitmap.pixels, [RGBA8::new(1, 2, 3, 0), RGBA8::new(1, 2, 4, 255)]);
}

#[test]
fn test_wrong_amount_of_image_data() {
  let ihdr = IHDR { width: 2, height: 2, bit_depth: 8, color_type: PngColorType::Y };
  let short = png_from_filtered(ihdr, &[], &[0, 1, 2, 0, 3], 1);
  assert_eq!(decode_png(&short), Err(PngError::CorruptStream));
  let long = png_from_filtered(ihdr, &[], &[0, 1, 2, 0, 3, 4, 5], 1);
  assert_eq!(decode_png(&long), Err(PngError::CorruptStream));
  let bad_filter = png_from_filtered(ihdr, &[], &[0, 1, 2, 9, 3, 4], 1);
  assert_eq!(decode_png(&bad_filter), Err(PngError::CorruptStream));
}

#[test]
fn test_RawChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in RawChunkIter::new(&v) {
      //
    }
    let _ = decode_png(&v);
  }
  // even totally random data should never panic the decoder!
  for _ in 0..10 {
    let mut v = Vec::from(PNG_SIGNATURE);
    v.extend(super::rand_bytes(1024));
    for _ in RawChunkIter::new(&v) {
      //
    }
    let _ = decode_png(&v);
    let _ = zlib::zlib_decompress(&v[8..], 4096);
  }
}
