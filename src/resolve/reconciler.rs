//! Boundary reconciliation state machine.
//!
//! The acquisition campaigns behind the three epochs overlap the declared
//! calendar boundaries: tiles for a year near the end of 2013, either side
//! of 2014, or the end of 2019 may live in the *adjacent* epoch's metadata.
//! This machine walks the requested years and, at each of the three known
//! boundaries, schedules exactly one additional check against the adjacent
//! epoch, combining and deduplicating the two passes before a year is
//! reported.
//!
//! The machine holds immutable per-iteration inputs and returns explicit
//! plans and reports; the request window is never mutated, so the original
//! end-year value is preserved by construction across rechecks. Negative
//! availability findings are held back while a recheck is pending so a year
//! is never reported as empty prematurely.

use tracing::{info, warn};

use crate::epoch::{resolve_epoch, Epoch, EpochLookup, FIRST_COVERED_YEAR};
use crate::window::RequestWindow;

use super::date_filter::{TileFilterResult, TileId};

/// The three epoch boundaries that require a recheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryYear {
    /// End of the 2010-2013 campaign; rechecked against 2014-2019.
    Y2013,
    /// Start of the 2014-2019 campaign; rechecked against 2010-2013.
    Y2014,
    /// End of the 2014-2019 campaign; rechecked against 2020-2025.
    Y2019,
}

impl BoundaryYear {
    /// The boundary year itself.
    pub fn year(&self) -> i32 {
        match self {
            BoundaryYear::Y2013 => 2013,
            BoundaryYear::Y2014 => 2014,
            BoundaryYear::Y2019 => 2019,
        }
    }

    /// The year whose epoch supplies the adjacent metadata layer.
    pub fn adjacent_epoch_year(&self) -> i32 {
        match self {
            BoundaryYear::Y2013 => 2014,
            BoundaryYear::Y2014 => 2013,
            BoundaryYear::Y2019 => 2020,
        }
    }

    /// Whether the window's month bounds already exclude the ambiguous
    /// part of the boundary, making the recheck pointless.
    fn excluded_by(&self, window: &RequestWindow) -> bool {
        match self {
            // Campaign spill-over from 2014 only touches late 2013.
            BoundaryYear::Y2013 => window.end_year() == 2013 && window.end_month() != 12,
            // Spill-over from 2013 only touches the first weeks of 2014.
            BoundaryYear::Y2014 => {
                (window.end_year() == 2014 && window.end_month() == 1)
                    || (window.start_year() == 2014 && window.start_month() > 2)
            }
            // Spill-over from 2020 only touches late 2019.
            BoundaryYear::Y2019 => window.end_year() == 2019 && window.end_month() < 11,
        }
    }

    fn for_year(year: i32) -> Option<Self> {
        match year {
            2013 => Some(BoundaryYear::Y2013),
            2014 => Some(BoundaryYear::Y2014),
            2019 => Some(BoundaryYear::Y2019),
            _ => None,
        }
    }
}

/// User-facing availability hint while a year's checks are in flight.
///
/// Terminal availability is carried by [`Coverage`] in the year's report;
/// the hint exists so that callers polling mid-resolution never see a
/// premature negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityHint {
    /// Nothing observed yet for the year under consideration.
    Unknown,
    /// The primary pass found nothing, but a recheck is still pending.
    ProbablyAbsent,
    /// The primary pass found partial coverage, recheck still pending.
    ProbablyPartial,
}

/// Final per-year availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every intersected footprint yielded a tile.
    Full,
    /// Tiles exist for only part of the area of interest.
    Partial,
    /// No tiles were acquired in the accepted months.
    Absent,
    /// The year predates or postdates all acquisition campaigns.
    NoEpoch,
}

/// Resolved tiles and availability for one requested year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearReport {
    /// The calendar year.
    pub year: i32,
    /// Deduplicated, normalized tile identifiers (primary pass first).
    pub tiles: Vec<TileId>,
    /// Final availability for the year.
    pub coverage: Coverage,
}

/// One planned epoch check the caller must execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPlan {
    /// The calendar year being resolved.
    pub year: i32,
    /// The year used for epoch resolution (differs from `year` during a
    /// boundary recheck).
    pub epoch_year: i32,
    /// The metadata epoch to load.
    pub epoch: Epoch,
    /// Whether this pass reads the adjacent epoch during a recheck.
    pub adjacent: bool,
}

/// Next action from the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Execute this epoch check and feed the outcome to [`Reconciler::record`].
    Check(CheckPlan),
    /// A year resolved without any epoch check (outside all campaigns).
    Report(YearReport),
    /// The window is exhausted.
    Done,
}

/// Outcome of a primary pass held while its recheck runs.
#[derive(Debug, Clone)]
struct PendingPrimary {
    tiles: Vec<TileId>,
    intersected: usize,
    hint: AvailabilityHint,
}

#[derive(Debug, Clone)]
enum State {
    /// Advancing year by year.
    Normal,
    /// A boundary recheck is in flight for the current year.
    Recheck {
        boundary: BoundaryYear,
        primary: PendingPrimary,
    },
    /// Past the window end or past all epochs.
    Finished,
}

/// Finite-state machine driving boundary-aware year resolution.
///
/// Call [`next`](Self::next) for the next action; every [`Step::Check`] must
/// be answered with one [`record`](Self::record) call before asking again.
#[derive(Debug)]
pub struct Reconciler {
    window: RequestWindow,
    year: i32,
    state: State,
    awaiting: Option<CheckPlan>,
}

impl Reconciler {
    /// Creates a machine over the given request window.
    pub fn new(window: RequestWindow) -> Self {
        Self {
            window,
            year: window.start_year(),
            state: State::Normal,
            awaiting: None,
        }
    }

    /// The window this machine resolves. Never mutated.
    pub fn window(&self) -> &RequestWindow {
        &self.window
    }

    /// Availability hint for the year currently under consideration.
    pub fn hint(&self) -> AvailabilityHint {
        match &self.state {
            State::Recheck { primary, .. } => primary.hint,
            _ => AvailabilityHint::Unknown,
        }
    }

    /// Returns the next action.
    ///
    /// Calling `next` again before recording an outstanding check returns
    /// the same plan.
    pub fn next(&mut self) -> Step {
        if let Some(plan) = &self.awaiting {
            return Step::Check(plan.clone());
        }

        if matches!(self.state, State::Finished) || self.year > self.window.end_year() {
            self.state = State::Finished;
            return Step::Done;
        }

        if let State::Recheck { boundary, .. } = &self.state {
            let epoch_year = boundary.adjacent_epoch_year();
            let epoch = match resolve_epoch(epoch_year) {
                EpochLookup::Epoch(epoch) => epoch,
                // Adjacent years of all three boundaries are covered.
                _ => unreachable!("boundary-adjacent year has no epoch"),
            };
            let plan = CheckPlan {
                year: self.year,
                epoch_year,
                epoch,
                adjacent: true,
            };
            self.awaiting = Some(plan.clone());
            return Step::Check(plan);
        }

        match resolve_epoch(self.year) {
            EpochLookup::Epoch(epoch) => {
                let plan = CheckPlan {
                    year: self.year,
                    epoch_year: self.year,
                    epoch,
                    adjacent: false,
                };
                self.awaiting = Some(plan.clone());
                Step::Check(plan)
            }
            EpochLookup::TooEarly => {
                info!("There is no elevation data available prior to 2011");
                let report = YearReport {
                    year: self.year,
                    tiles: Vec::new(),
                    coverage: Coverage::NoEpoch,
                };
                // Fast-forward over the uncovered years instead of checking
                // each one.
                if self.window.end_year() >= FIRST_COVERED_YEAR {
                    self.year = FIRST_COVERED_YEAR;
                } else {
                    self.state = State::Finished;
                }
                Step::Report(report)
            }
            EpochLookup::TooLate => {
                self.state = State::Finished;
                Step::Done
            }
        }
    }

    /// Records the outcome of the outstanding check.
    ///
    /// `intersected` is the number of metadata rows intersecting the AOI
    /// for the checked layer, used for partial-coverage detection. Returns
    /// the year's report once the year fully resolves; returns `None` when
    /// the machine entered a recheck and the year is still open.
    ///
    /// # Panics
    ///
    /// Panics if no check is outstanding.
    pub fn record(&mut self, result: TileFilterResult, intersected: usize) -> Option<YearReport> {
        let plan = self
            .awaiting
            .take()
            .expect("record called without an outstanding check");

        if !plan.adjacent {
            let tiles = result.tiles().to_vec();
            if let Some(boundary) = BoundaryYear::for_year(plan.year) {
                if !boundary.excluded_by(&self.window) {
                    let hint = if tiles.is_empty() {
                        AvailabilityHint::ProbablyAbsent
                    } else if tiles.len() < intersected {
                        AvailabilityHint::ProbablyPartial
                    } else {
                        AvailabilityHint::Unknown
                    };
                    self.state = State::Recheck {
                        boundary,
                        primary: PendingPrimary {
                            tiles,
                            intersected,
                            hint,
                        },
                    };
                    // Findings are suppressed until the recheck resolves.
                    return None;
                }
            }
            let report = self.finalize(plan.year, tiles, intersected);
            self.year += 1;
            return Some(report);
        }

        // Recheck pass: combine with the held primary outcome.
        let State::Recheck { primary, .. } = std::mem::replace(&mut self.state, State::Normal)
        else {
            unreachable!("adjacent check outside recheck state");
        };
        let mut combined = primary.tiles;
        for tile in result.tiles() {
            if !combined.contains(tile) {
                combined.push(tile.clone());
            }
        }
        let total_intersected = primary.intersected.max(intersected);
        let report = self.finalize(plan.year, combined, total_intersected);
        self.year += 1;
        Some(report)
    }

    /// Builds the final report for a fully-resolved year and logs the
    /// user-facing availability message.
    fn finalize(&self, year: i32, tiles: Vec<TileId>, intersected: usize) -> YearReport {
        let coverage = if tiles.is_empty() {
            if self.window.is_clipped(year) {
                info!(
                    year,
                    "No elevation data available for the area, at least for the selected months"
                );
            } else {
                info!(year, "No elevation data available for the area");
            }
            Coverage::Absent
        } else if tiles.len() < intersected {
            warn!(
                year,
                found = tiles.len(),
                intersected,
                "Elevation data covers only part of the area"
            );
            Coverage::Partial
        } else {
            Coverage::Full
        };
        YearReport {
            year,
            tiles,
            coverage,
        }
    }
}
