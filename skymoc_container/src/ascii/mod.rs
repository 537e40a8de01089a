//! Textual serialization of coverage maps.
//!
//! The written form is a brace-delimited mapping from order to id list,
//! e.g. `{"1":[2,3],"2":[16,17,18,19,20]}`; [`stringify_compact`] folds
//! consecutive ids into `start-end` runs. Reading sniffs the first non-blank
//! character and accepts either this form or the legacy line-oriented form
//! (`ORDER=n` / `NSIDE=n` / `COORDSYS=c` headers followed by ids and runs,
//! `#` comments).

mod read;
pub use read::*;

mod stringify;
pub use stringify::*;
