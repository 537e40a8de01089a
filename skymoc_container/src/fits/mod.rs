//! FITS-convention binary serialization of coverage maps.
//!
//! The container follows the scientific file-format convention so that
//! downstream consumers of the original ecosystem stay compatible: fixed
//! 80-byte header cards, block-padded to 2880 bytes, wrapping a one-column
//! binary table of big-endian "uniq" records (4 bytes while the maximum
//! used order fits 32 bits, 8 bytes beyond). An optional run-length mode
//! stores `(start, ±n)` pairs instead of individual values.

mod header;

mod read;
pub use read::*;

mod write;
pub use write::*;
