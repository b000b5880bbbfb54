#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod accumulate;
pub mod classify;
pub mod grid;
pub mod interval;
pub mod mechanism;
pub mod operator;
pub mod symbolic;
pub mod traverse;

pub use accumulate::{BoxPoints, ExtentTag, Side};
pub use classify::{
    BoxClassifier, Classification, ClassifyConfig, ClassifyError, DEFAULT_BUDGET, Scheme,
};
pub use grid::{Grid, GridError};
pub use interval::{Interval, IntervalError};
pub use mechanism::{Mechanism, presets};
pub use operator::{KrawczykOperator, SynthesisError};
pub use traverse::ScanOutcome;

/// Fouten uit de buitenste laag; elke variant wikkelt een modulefout.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Manier waarop het taakraster wordt afgelopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    UniformScan,
    Subdivision,
}

/// Instellingen voor één karteringsrun.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Cellen per rasteras.
    pub resolution: usize,
    /// Iteratiebudget per cel.
    pub budget: usize,
    pub scheme: Scheme,
    pub traversal: Traversal,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            resolution: 50,
            budget: DEFAULT_BUDGET,
            scheme: Scheme::Classical,
            traversal: Traversal::UniformScan,
        }
    }
}

/// Public entry point for consumers: owns a mechanism and its synthesized
/// operator, and drives complete workspace mappings from one call.
#[derive(Debug)]
pub struct WorkspaceMapper {
    mechanism: Mechanism,
    operator: KrawczykOperator,
}

impl WorkspaceMapper {
    /// Synthesizes the contraction operator for `mechanism` once; every run
    /// afterwards reuses it.
    pub fn new(mechanism: Mechanism) -> Result<Self, EngineError> {
        let operator = KrawczykOperator::synthesize(&mechanism)?;
        Ok(Self {
            mechanism,
            operator,
        })
    }

    #[must_use]
    pub fn mechanism(&self) -> &Mechanism {
        &self.mechanism
    }

    #[must_use]
    pub fn operator(&self) -> &KrawczykOperator {
        &self.operator
    }

    /// Maps the mechanism's default grid span with the given options.
    pub fn run(&self, options: &RunOptions) -> Result<ScanOutcome, EngineError> {
        let (lo, hi) = self.mechanism.grid_span();
        let grid = Grid::uniform(lo, hi, options.resolution)?;
        let config =
            ClassifyConfig::from_mechanism(&self.mechanism).with_budget(options.budget);
        let classifier = BoxClassifier::new(&self.operator, options.scheme, config)?;
        log::debug!(
            "mapping `{}` at resolution {} with scheme {}",
            self.mechanism.name(),
            options.resolution,
            options.scheme.name()
        );
        let outcome = match options.traversal {
            Traversal::UniformScan => scan(&grid, &classifier),
            Traversal::Subdivision => traverse::subdivide(&grid, &classifier),
        };
        Ok(outcome)
    }
}

#[cfg(feature = "parallel")]
fn scan(grid: &Grid, classifier: &BoxClassifier<'_>) -> ScanOutcome {
    traverse::scan_uniform_parallel(grid, classifier)
}

#[cfg(not(feature = "parallel"))]
fn scan(grid: &Grid, classifier: &BoxClassifier<'_>) -> ScanOutcome {
    traverse::scan_uniform(grid, classifier)
}
