//! Traversal drivers: the uniform grid scan and the recursive
//! branch-and-bound subdivision of the configuration box.

use crate::accumulate::BoxPoints;
use crate::classify::{BoxClassifier, Classification};
use crate::grid::Grid;
use crate::interval::Interval;

/// Classified cells of one traversal: reachable area and unresolved border.
/// Outside cells are discarded.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScanOutcome {
    pub area: BoxPoints,
    pub border: BoxPoints,
}

impl ScanOutcome {
    fn new(task_dim: usize) -> Self {
        Self {
            area: BoxPoints::new(task_dim),
            border: BoxPoints::new(task_dim),
        }
    }

    fn record(&mut self, cell: &[Interval], classification: Classification) {
        match classification {
            Classification::Inside => self.area.push_cell(cell),
            Classification::Border => self.border.push_cell(cell),
            Classification::Outside => {}
        }
    }
}

/// Classifies every grid cell against the full configuration domain.
#[must_use]
pub fn scan_uniform(grid: &Grid, classifier: &BoxClassifier<'_>) -> ScanOutcome {
    let mut outcome = ScanOutcome::new(classifier.task_dim());
    for cell in grid.cells() {
        outcome.record(&cell, classifier.classify(&cell));
    }
    log::debug!(
        "uniform scan: {} area, {} border of {} cells",
        outcome.area.len(),
        outcome.border.len(),
        grid.resolution() * grid.resolution()
    );
    outcome
}

/// Row-parallel uniform scan; per-row accumulators are merged in row order
/// so the outcome is identical to the sequential scan.
#[cfg(feature = "parallel")]
#[must_use]
pub fn scan_uniform_parallel(grid: &Grid, classifier: &BoxClassifier<'_>) -> ScanOutcome {
    use rayon::prelude::*;

    let rows: Vec<ScanOutcome> = (0..grid.resolution())
        .into_par_iter()
        .map(|row| {
            let mut outcome = ScanOutcome::new(classifier.task_dim());
            for cell in grid.row(row) {
                outcome.record(&cell, classifier.classify(&cell));
            }
            outcome
        })
        .collect();

    let mut merged = ScanOutcome::new(classifier.task_dim());
    for row in rows {
        merged.area.merge(row.area);
        merged.border.merge(row.border);
    }
    merged
}

/// Recursive bisection of the configuration box. Each level classifies the
/// still-unresolved cells against the current sub-box; a cell certified
/// Inside against any sub-box is inside overall. Bisection always follows
/// the longest side and stops once every side is below `span / resolution`.
/// Cells left unresolved are split into border and outside with one final
/// full-domain pass.
#[must_use]
pub fn subdivide(grid: &Grid, classifier: &BoxClassifier<'_>) -> ScanOutcome {
    let resolution = grid.resolution();
    let mut resolved = vec![false; resolution * resolution];
    let mut area = BoxPoints::new(classifier.task_dim());

    let domain = classifier.v_domain().to_vec();
    #[allow(clippy::cast_precision_loss)]
    let stop: Vec<f64> = domain
        .iter()
        .map(|axis| axis.width() / resolution as f64)
        .collect();

    subdivide_box(grid, classifier, &domain, &stop, &mut resolved, &mut area);

    let mut border = BoxPoints::new(classifier.task_dim());
    for (index, cell) in grid.cells().enumerate() {
        if resolved[index] {
            continue;
        }
        if classifier.classify(&cell) != Classification::Outside {
            border.push_cell(&cell);
        }
    }
    log::debug!(
        "subdivision: {} area, {} border of {} cells",
        area.len(),
        border.len(),
        resolution * resolution
    );
    ScanOutcome { area, border }
}

fn subdivide_box(
    grid: &Grid,
    classifier: &BoxClassifier<'_>,
    v_box: &[Interval],
    stop: &[f64],
    resolved: &mut [bool],
    area: &mut BoxPoints,
) {
    let mut any_unresolved = false;
    for (index, cell) in grid.cells().enumerate() {
        if resolved[index] {
            continue;
        }
        if classifier.classify_with_domain(&cell, v_box) == Classification::Inside {
            resolved[index] = true;
            area.push_cell(&cell);
        } else {
            any_unresolved = true;
        }
    }
    if !any_unresolved {
        return;
    }

    let Some(axis) = v_box
        .iter()
        .enumerate()
        .filter(|(axis, side)| side.width() > stop[*axis])
        .max_by(|a, b| a.1.width().total_cmp(&b.1.width()))
        .map(|(axis, _)| axis)
    else {
        return; // every side is below the stop tolerance
    };

    let side = v_box[axis];
    let mid = side.mid();
    let mut lower = v_box.to_vec();
    lower[axis] = Interval::raw(side.lo(), mid);
    let mut upper = v_box.to_vec();
    upper[axis] = Interval::raw(mid, side.hi());

    subdivide_box(grid, classifier, &lower, stop, resolved, area);
    subdivide_box(grid, classifier, &upper, stop, resolved, area);
}
