//! Local signature set.
//!
//! A signature source is a newline-delimited text file of 32-character
//! lowercase hex MD5 digests. Blank lines and lines starting with `#` are
//! skipped; malformed lines are counted and logged but never fail the load.

mod set;

pub use set::{SignatureSet, EICAR_MD5};
