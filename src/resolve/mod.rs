//! Temporal-spatial tile resolution.
//!
//! Maps an area-of-interest polygon and a year/month window onto the set of
//! elevation tile identifiers to retrieve. The work splits into three parts:
//!
//! - [`filter_by_date`] selects the overlay rows whose acquisition month
//!   falls inside the window and normalizes the two incompatible
//!   tile-naming schemas into one identifier list;
//! - [`Reconciler`] is the finite-state machine that walks the requested
//!   years and schedules the additional adjacent-epoch checks needed at the
//!   three ambiguous campaign boundaries (end of 2013, 2014, end of 2019);
//! - [`resolve_window`] drives epoch resolution, overlay and date filtering
//!   per machine step and collects one [`YearReport`] per requested year.
//!
//! The acquisition campaigns do not respect the declared calendar epoch
//! boundaries, so a year near a boundary may need tiles drawn from the
//! adjacent epoch's metadata. The machine guarantees each boundary year is
//! rechecked at most once and that negative availability findings are held
//! back until the recheck resolves.

mod date_filter;
mod engine;
mod reconciler;

pub use date_filter::{
    filter_by_date, TileFilterResult, TileId, TileSchema, ACQUISITION_FIELD, LEGACY_TILE_FIELD,
    NAMED_TILE_FIELD,
};
pub use engine::{resolve_window, MetadataSource, ShapefileSource};
pub use reconciler::{
    AvailabilityHint, BoundaryYear, CheckPlan, Coverage, Reconciler, Step, YearReport,
};

use thiserror::Error;

/// Errors that can occur while resolving a request window.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Overlay or layer loading failed.
    #[error(transparent)]
    Overlay(#[from] crate::overlay::OverlayError),

    /// The metadata source could not provide an epoch's layer.
    #[error("Metadata source failed for epoch {epoch}: {detail}")]
    Metadata { epoch: String, detail: String },
}
