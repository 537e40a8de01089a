//! Serialization formats for coverage maps.
//!
//! Two formats cover the same logical content (coordinate-frame tag plus the
//! per-order sorted id lists):
//!
//! - [`ascii`]: a brace-delimited text form (`{"1":[2,3],"2":[16-20]}`), with
//!   a legacy line-oriented variant accepted on read.
//! - [`fits`]: a FITS-convention binary container — 80-byte header cards in
//!   2880-byte blocks wrapping big-endian "uniq" records, with an optional
//!   run-length mode.

pub mod ascii;
pub mod fits;
