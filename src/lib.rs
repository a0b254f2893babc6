//! # qrforge
//!
//! A Rust library for generating QR codes.
//!
//! `qrforge` encodes text or binary data into QR Code symbols adhering to
//! the QR Code Model 2 specification. It supports versions 1 to 40, all four
//! error correction levels (Low, Medium, Quartile, High), and the numeric,
//! alphanumeric, byte, kanji, and ECI segment modes. The result is an
//! immutable grid of dark and light modules that can be queried directly or
//! rendered to an in-memory image or an SVG document.
//!
//! ## Features
//!
//! - **Encoding modes**: numeric, alphanumeric, byte (UTF-8), kanji
//!   (Shift_JIS byte pairs), and ECI designators, freely mixable through
//!   custom segment lists.
//! - **Error correction**: four levels, with optional automatic boosting to
//!   the strongest level that fits without growing the symbol.
//! - **Masking**: automatic selection of the mask pattern with the lowest
//!   penalty score, or a caller-forced pattern.
//! - **Rendering**: RGB image buffers (via the `image` crate) and SVG
//!   strings with configurable scale, border, and colors.
//! - **Shared artifacts**: per-version templates and Reed-Solomon
//!   generators are built once and shared between encodings, including
//!   across threads.
//!
//! ## Example
//!
//! ```rust
//! use qrforge::{QrCode, QrCodeEcc};
//!
//! fn main() -> Result<(), qrforge::QrError> {
//!     let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Medium)?;
//!     assert_eq!(qr.size(), qr.version().value() as i32 * 4 + 17);
//!     for y in 0..qr.size() {
//!         for x in 0..qr.size() {
//!             let _dark = qr.get_module(x, y);
//!         }
//!     }
//!     let svg = qrforge::render::to_svg_string(&qr, 4, "#FFFFFF", "#000000")?;
//!     assert!(svg.starts_with("<?xml"));
//!     Ok(())
//! }
//! ```
//!
//! Mixed segments can pack text tighter than a single byte-mode segment:
//!
//! ```rust
//! use qrforge::{QrCode, QrCodeEcc, QrSegment};
//!
//! fn main() -> Result<(), qrforge::QrError> {
//!     let segs = vec![
//!         QrSegment::make_alphanumeric("THE SQUARE ROOT OF 2 IS 1.")?,
//!         QrSegment::make_numeric("41421356237309504880168872420969807856967187537694807317667973799")?,
//!     ];
//!     let qr = QrCode::encode_segments(&segs, QrCodeEcc::Low)?;
//!     assert!(qr.version().value() <= 3);
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! Fallible operations return [`QrError`]. Payloads that cannot fit the
//! largest allowed version surface as [`DataTooLong`], which carries the
//! used bit count and capacity when they are known.

#![forbid(unsafe_code)]

mod bits;
mod error;
mod gf;
mod memoize;
mod reed_solomon;
mod segment;
mod template;

mod qrcode;
pub mod render;

pub use bits::BitBuffer;
pub use error::{DataTooLong, QrError};
pub use qrcode::{Mask, QrCode, QrCodeEcc, Version};
pub use reed_solomon::ReedSolomonGenerator;
pub use segment::{QrSegment, QrSegmentMode};
