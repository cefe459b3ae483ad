//! Snapping 1x1 km tile numbers to their enclosing 2x2 km blocks.

use std::collections::HashSet;

use super::OrthoError;

/// Outcome of aligning one 1x1 km tile number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignOutcome {
    /// The tile was snapped to the even-aligned lower corner.
    Snapped(String),
    /// Both axis components are already even; the number already names a
    /// 2x2 km block and needs no further alignment.
    AlreadyAligned,
}

/// Computes the 2x2 km block enclosing a 1x1 km tile number.
///
/// Pre-2019 orthophotos cover 2x2 km blocks whose numbers are the
/// even-aligned lower-left corner of the block. Each axis component is
/// therefore decremented by one when odd; a number with two even components
/// already names a block.
///
/// ```
/// use geoharvest::ortho::{align_to_block, AlignOutcome};
///
/// assert_eq!(
///     align_to_block("563_5617").unwrap(),
///     AlignOutcome::Snapped("562_5616".to_string())
/// );
/// assert_eq!(align_to_block("562_5616").unwrap(), AlignOutcome::AlreadyAligned);
/// ```
///
/// # Errors
///
/// Returns [`OrthoError::InvalidTileNumber`] when the input is not two
/// underscore-separated integers.
pub fn align_to_block(tile: &str) -> Result<AlignOutcome, OrthoError> {
    let (east, north) = parse_pair(tile)?;
    if east % 2 == 0 && north % 2 == 0 {
        return Ok(AlignOutcome::AlreadyAligned);
    }
    let east = east - east % 2;
    let north = north - north % 2;
    Ok(AlignOutcome::Snapped(format!("{east}_{north}")))
}

/// Normalizes a list of 1x1 km tile numbers into the deduplicated set of
/// 2x2 km block numbers.
///
/// Already-aligned numbers are kept verbatim; snapped numbers replace the
/// original, and a tile whose block is already present is dropped rather
/// than duplicated. Input order is preserved for the surviving entries.
pub fn block_numbers(tiles: &[String]) -> Result<Vec<String>, OrthoError> {
    let mut seen: HashSet<String> = tiles.iter().cloned().collect();
    let mut blocks = Vec::new();
    for tile in tiles {
        let block = match align_to_block(tile)? {
            AlignOutcome::AlreadyAligned => tile.clone(),
            AlignOutcome::Snapped(block) => {
                if block != *tile && seen.contains(&block) {
                    // The enclosing block is already covered by another tile.
                    continue;
                }
                block
            }
        };
        if blocks.contains(&block) {
            continue;
        }
        seen.insert(block.clone());
        blocks.push(block);
    }
    Ok(blocks)
}

fn parse_pair(tile: &str) -> Result<(i64, i64), OrthoError> {
    let invalid = || OrthoError::InvalidTileNumber(tile.to_string());
    let (east, north) = tile.split_once('_').ok_or_else(invalid)?;
    let east = east.parse::<i64>().map_err(|_| invalid())?;
    let north = north.parse::<i64>().map_err(|_| invalid())?;
    Ok((east, north))
}
