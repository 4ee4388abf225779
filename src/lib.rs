#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! A small PNG codec.
//!
//! Decodes PNG data into an RGBA8 [`Bitmap`], and encodes an RGBA8 bitmap back
//! into PNG data. The zlib / DEFLATE layer is implemented by this crate (see
//! the [`zlib`] module), so there's no dependency on an outside compression
//! library.
//!
//! ```no_run
//! use pngsmith::*;
//! let png: &[u8] = unimplemented!("data from somewhere");
//! let bitmap: Bitmap<RGBA8> = decode_png(png).unwrap();
//! let again: Vec<u8> = encode_png(bitmap.width, bitmap.height, &bitmap.pixels).unwrap();
//! ```

extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

/// Emits a trace point through the `log` facade when the `log` feature is on.
macro_rules! trace {
  ($($arg:tt)*) => {
    #[cfg(feature = "log")]
    {
      log::trace!($($arg)*);
    }
  };
}

mod error;
pub use error::*;

pub mod pixel_formats;
pub use pixel_formats::*;

pub mod image;
pub use image::*;

pub mod zlib;

pub mod png;
pub use png::{decode_png, encode_png, png_get_header};

/// Images wider or taller than this are rejected by both the decoder and the
/// encoder, to prevent accidental out-of-memory problems.
pub const MAX_DIMENSION: u32 = 17_000;
