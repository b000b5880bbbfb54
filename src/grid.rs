//! Uniform vierkant taakraster: `resolution` × `resolution` cellen over een
//! gedeeld bereik per as.

use crate::interval::Interval;

/// Fouten bij rasterconstructie.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("grid resolution must be at least 1")]
    ZeroResolution,
    #[error("grid span [{lo}, {hi}] is empty or not finite")]
    InvalidSpan { lo: f64, hi: f64 },
}

/// Uniform raster over `[lo, hi]²` met `resolution` cellen per as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    lo: f64,
    hi: f64,
    resolution: usize,
    step: f64,
}

impl Grid {
    pub fn uniform(lo: f64, hi: f64, resolution: usize) -> Result<Self, GridError> {
        if resolution == 0 {
            return Err(GridError::ZeroResolution);
        }
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(GridError::InvalidSpan { lo, hi });
        }
        #[allow(clippy::cast_precision_loss)]
        let step = (hi - lo) / resolution as f64;
        Ok(Self {
            lo,
            hi,
            resolution,
            step,
        })
    }

    #[must_use]
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub const fn span(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Cel `(col, row)`; beide indices lopen van `0` tot `resolution`.
    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> [Interval; 2] {
        debug_assert!(col < self.resolution && row < self.resolution);
        [self.axis_interval(col), self.axis_interval(row)]
    }

    /// Alle cellen in rij-na-rij volgorde.
    pub fn cells(&self) -> impl Iterator<Item = [Interval; 2]> + '_ {
        (0..self.resolution)
            .flat_map(move |row| (0..self.resolution).map(move |col| self.cell(col, row)))
    }

    /// Eén rij cellen, voor rij-parallelle verwerking.
    pub fn row(&self, row: usize) -> impl Iterator<Item = [Interval; 2]> + '_ {
        (0..self.resolution).map(move |col| self.cell(col, row))
    }

    fn axis_interval(&self, index: usize) -> Interval {
        #[allow(clippy::cast_precision_loss)]
        let start = self.lo + self.step * index as f64;
        let end = if index + 1 == self.resolution {
            // Laatste cel sluit exact op de bovengrens aan.
            self.hi
        } else {
            start + self.step
        };
        Interval::raw(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, GridError};

    #[test]
    fn cells_tile_the_span() {
        let grid = Grid::uniform(-1.0, 1.0, 4).expect("valid grid");
        assert_eq!(grid.cells().count(), 16);
        let first = grid.cell(0, 0);
        assert!((first[0].lo() - -1.0).abs() < 1e-12);
        assert!((first[0].hi() - -0.5).abs() < 1e-12);
        let last = grid.cell(3, 3);
        assert!((last[0].hi() - 1.0).abs() < 1e-15);
        assert!((last[1].hi() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_degenerate_configurations() {
        assert_eq!(Grid::uniform(0.0, 1.0, 0), Err(GridError::ZeroResolution));
        assert!(matches!(
            Grid::uniform(1.0, 1.0, 4),
            Err(GridError::InvalidSpan { .. })
        ));
        assert!(matches!(
            Grid::uniform(f64::NAN, 1.0, 4),
            Err(GridError::InvalidSpan { .. })
        ));
    }

    #[test]
    fn rows_concatenate_to_full_scan() {
        let grid = Grid::uniform(0.0, 2.0, 3).expect("valid grid");
        let by_rows: Vec<_> = (0..3).flat_map(|row| grid.row(row)).collect();
        let all: Vec<_> = grid.cells().collect();
        assert_eq!(by_rows, all);
    }
}
