use crate::calendar::{map_dates, AssignedCell, DateAssignment, ToleranceSweep};
use crate::config::Content;
use crate::geometry::sample;
use crate::render::{
    hide_legacy_marker, render_cell, render_headings, MarkerChain, RunCache, StyleContext,
};
use crate::surface::Surface;
use std::fmt;
use time::Date;
use tracing::{debug, info, warn};

/// One full pass of the calendar over a page: sample the day cells, cluster
/// them into weeks, assign dates, and paint.  Nothing is carried over between
/// runs except what the caller keeps in the [`RunCache`].
#[derive(Debug)]
pub(crate) struct Pipeline<'a> {
    content: &'a Content,
    sweep: ToleranceSweep,
    markers: MarkerChain,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RunOutcome {
    Skipped(SkipReason),
    Rendered(RunReport),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SkipReason {
    Disabled,
    NoTargetDate,
    NoDayCells,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunReport {
    pub(crate) target: Date,
    pub(crate) tolerance: Option<f64>,
    pub(crate) accepted: bool,
    pub(crate) row_lengths: Vec<usize>,
    pub(crate) assignment: DateAssignment,
    pub(crate) failures: usize,
    pub(crate) legacy_marker: Option<String>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(content: &'a Content) -> Pipeline<'a> {
        let sweep = match content.calendar.tolerances.as_deref() {
            Some(tolerances) => ToleranceSweep::new(tolerances),
            None => ToleranceSweep::default(),
        };
        debug!(tolerances = ?sweep.tolerances(), "configured row clustering");
        Pipeline {
            content,
            sweep,
            markers: MarkerChain::for_content(content),
        }
    }

    pub(crate) fn run<S: Surface>(&self, surface: &mut S, cache: &mut RunCache) -> RunOutcome {
        if !self.content.calendar.enabled {
            debug!("calendar disabled; skipping run");
            return RunOutcome::Skipped(SkipReason::Disabled);
        }
        let Some(target) = self.content.target_date() else {
            debug!("no valid target date configured; skipping run");
            return RunOutcome::Skipped(SkipReason::NoTargetDate);
        };
        if let Err(e) = render_headings(surface, self.content, target) {
            warn!(error = %e, "could not write calendar headings");
        }

        let candidates = self.content.day_candidates();
        let cells = sample(surface, &candidates);
        debug!(
            candidates = candidates.len(),
            positioned = cells.len(),
            "sampled day cells"
        );
        if cells.is_empty() {
            return RunOutcome::Skipped(SkipReason::NoDayCells);
        }

        let clustering = self.sweep.run(&cells);
        let row_lengths = clustering
            .grid
            .rows()
            .iter()
            .map(|row| row.len())
            .collect::<Vec<_>>();
        if clustering.accepted {
            debug!(tolerance = ?clustering.tolerance, rows = row_lengths.len(), "clustered day cells");
        } else {
            warn!(
                tolerance = ?clustering.tolerance,
                ?row_lengths,
                "day cells do not form full weeks; using best-effort rows"
            );
        }

        let assignment = map_dates(
            target,
            &clustering.grid,
            self.content.calendar.week_starts_on,
        );
        if assignment.is_empty() {
            warn!(%target, "no dates fit before the start of the calendar");
        }
        let ctx = StyleContext::sample(
            surface,
            assignment.cells().iter().map(|ac| ac.cell.id.as_str()),
            self.content.month_title_id(),
        );
        match cache.ensure_stylesheet(surface) {
            Ok(()) => debug!(stylesheets = cache.installed(), "marker stylesheet in place"),
            Err(e) => warn!(error = %e, "could not install marker stylesheet"),
        }
        let legacy_marker = match hide_legacy_marker(surface, &self.markers) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "could not hide previous marker");
                None
            }
        };

        let mut failures = 0;
        for assigned in assignment.cells() {
            if let Err(e) = render_cell(surface, assigned, &ctx) {
                warn!(
                    cell = %assigned.cell.id,
                    date = %assigned.date,
                    error = %e,
                    "failed to render day cell"
                );
                failures += 1;
            }
        }
        info!(
            %target,
            grid_start = ?assignment.start(),
            target_cell = ?assignment.target_cells().next().map(|ac| ac.cell.id.as_str()),
            cells = assignment.len(),
            failures,
            "calendar rendered"
        );
        RunOutcome::Rendered(RunReport {
            target,
            tolerance: clustering.tolerance,
            accepted: clustering.accepted,
            row_lengths,
            assignment,
            failures,
            legacy_marker,
        })
    }
}

impl AssignedCell {
    /// The day number padded to four columns: bracketed for the target day,
    /// parenthesized for days outside the target month
    pub(crate) fn show(&self) -> String {
        let day = self.date.day();
        if self.style.is_target_day {
            format!("[{day:2}]")
        } else if self.style.in_month {
            format!(" {day:2} ")
        } else {
            format!("({day:2})")
        }
    }
}

impl fmt::Display for RunReport {
    /// One line per reconstructed row, in the same shape as the page's grid
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cells = self.assignment.cells().iter();
        for &len in &self.row_lengths {
            let line = cells
                .by_ref()
                .take(len)
                .map(AssignedCell::show)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "calendar is disabled"),
            SkipReason::NoTargetDate => write!(f, "no valid target date configured"),
            SkipReason::NoDayCells => write!(f, "no day cells found for the configured bucket"),
        }
    }
}
