//! Orthophoto tile alignment and lookup-table selection.
//!
//! Orthophotos are addressed through an opaque numeric URL ID rather than a
//! predictable tile URL, so resolution goes through a lookup table of
//! `(url_id, year, tile_number)` rows produced by the [`crate::crawler`]
//! (or loaded pre-built from CSV). Tile numbering changed in 2019: imagery
//! from 2019 onward covers 1x1 km tiles, older imagery covers 2x2 km
//! blocks, so pre-2019 lookups first snap the AOI's 1x1 km tile numbers to
//! their enclosing even-aligned blocks.

mod aligner;
mod lookup;

pub use aligner::{align_to_block, block_numbers, AlignOutcome};
pub use lookup::{
    load_lookup, relevant_records, save_lookup, split_by_resolution, tile_numbers_from_overlay,
    OrthoUrlRecord, RelevantSelection,
};

use thiserror::Error;

/// First year with 1x1 km orthophoto tiles.
pub const SMALL_TILE_FIRST_YEAR: i32 = 2019;

/// Errors that can occur in orthophoto tile handling.
#[derive(Debug, Error)]
pub enum OrthoError {
    /// A tile number was not of the `A_B` numeric pair form.
    #[error("Invalid tile number '{0}' (expected two underscore-separated integers)")]
    InvalidTileNumber(String),

    /// The lookup table CSV could not be read or written.
    #[error("Lookup table I/O failed: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem access to the lookup table failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
