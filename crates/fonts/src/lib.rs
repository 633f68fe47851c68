//! Webprep Fonts
//!
//! Converts desktop OpenType fonts (CFF-flavored `.otf` and TrueType `.ttf`)
//! into WOFF2 for the web:
//!
//! - [`sfnt`]: reading and writing the sfnt table directory.
//! - [`woff2`]: the WOFF2 container. Tables are stored untransformed in a
//!   single Brotli stream.
//! - [`convert`]: file-level conversion and batches with per-file outcomes.

pub mod convert;
pub mod sfnt;
pub mod woff2;

pub use convert::{convert_to_woff2, woff2_path, FontBatch, FontEvent, FontOutcome, FontReport};
pub use sfnt::{SfntFont, Table};
pub use woff2::{decode_woff2, encode_woff2, probe_compressor};
