//! Reads a PNG file, prints what's in it, and optionally writes it back out
//! as a fresh RGBA8 PNG.
//!
//! `pngsmith <in.png> [out.png]`

use pngsmith::*;

use std::path::Path;

#[derive(Debug)]
enum AppError {
  Usage,
  Io(std::io::Error),
  Png(PngError),
}
impl From<std::io::Error> for AppError {
  fn from(e: std::io::Error) -> Self {
    Self::Io(e)
  }
}
impl From<PngError> for AppError {
  fn from(e: PngError) -> Self {
    Self::Png(e)
  }
}
impl core::fmt::Display for AppError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Usage => write!(f, "usage: pngsmith <in.png> [out.png]"),
      Self::Io(e) => write!(f, "IO error: {e}"),
      Self::Png(e) => write!(f, "PNG error: {e}"),
    }
  }
}

fn main() {
  let mut args = std::env::args_os().skip(1);
  let input = args.next();
  let output = args.next();
  let result = match input {
    Some(input) => debug_process_a_png_file(Path::new(&input), output.as_deref().map(Path::new)),
    None => Err(AppError::Usage),
  };
  if let Err(e) = result {
    eprintln!("{e}");
    std::process::exit(1);
  }
}

fn debug_process_a_png_file(path: &Path, out_path: Option<&Path>) -> Result<(), AppError> {
  let bytes = std::fs::read(path)?;
  println!("{}: {} bytes", path.display(), bytes.len());

  for chunk in png::RawChunkIter::new(&bytes) {
    let chunk = chunk?;
    let crc_note = if chunk.crc_matches() { "" } else { " (CRC mismatch)" };
    println!("  {:?}: {} bytes{crc_note}", chunk.type_, chunk.data.len());
  }

  let header = png_get_header(&bytes)?;
  println!("{header:?}");

  let bitmap = decode_png(&bytes)?;
  let transparent = bitmap.pixels.iter().filter(|p| p.a == 0).count();
  println!("decoded {}x{}, {transparent} fully transparent pixels", bitmap.width, bitmap.height);
  if let Some(first) = bitmap.get(0, 0) {
    println!("top left pixel: {first:?}");
  }

  if let Some(out_path) = out_path {
    let png = bitmap.to_png_bytes()?;
    std::fs::write(out_path, &png)?;
    println!("wrote {} bytes to {}", png.len(), out_path.display());
  }
  Ok(())
}
