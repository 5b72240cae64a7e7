//! Codec layer: per-type field decoding and codepage lookup.
//!
//! # Submodules
//!
//! - [`fields`][]: The [`FieldDecoder`](fields::FieldDecoder) seam and its default implementation
//! - [`codepages`][]: Language-driver code to `Codepage` (`encoding_rs` or DOS OEM tables)

pub mod codepages;
pub mod fields;
