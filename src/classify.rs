//! Per-cell classification: the iterative refine/intersect/terminate state
//! machine driven by a synthesized contraction operator.
//!
//! One parameterized n-dimensional loop serves every scheme; the schemes only
//! differ in how linearization centers are chosen and which sub-boxes are
//! tested. An empty intersection during refinement is an expected signal and
//! maps to [`Classification::Outside`]; an exhausted iteration budget maps to
//! [`Classification::Border`]. Neither is an error.

use serde::Serialize;

use crate::interval::Interval;
use crate::mechanism::Mechanism;
use crate::operator::KrawczykOperator;

/// Default iteration budget per cell.
pub const DEFAULT_BUDGET: usize = 10;

/// Terminal state of a cell classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Every task-space point of the cell is reachable.
    Inside,
    /// No task-space point of the cell is reachable.
    Outside,
    /// Unresolved within the iteration budget; treated as boundary.
    Border,
}

/// Beschikbare classificatieschema's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Midpoint-centered contraction on the full hypothesis box.
    Classical,
    /// Classical plus an inside certificate over the 2n degenerate face
    /// sub-boxes, tighter near the true workspace boundary.
    BoundaryEnhanced,
    /// Two sign-pattern-derived centers per iteration; their enclosures are
    /// intersected for a tighter result at one extra operator evaluation.
    Bicentered,
    /// Classical loop stated for an arbitrary number of unknowns; the scheme
    /// that drives mechanisms with more than two configuration variables.
    Unified,
}

impl Scheme {
    pub const ALL: &'static [Self] = &[
        Self::Classical,
        Self::BoundaryEnhanced,
        Self::Bicentered,
        Self::Unified,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Classical => "classical",
            Self::BoundaryEnhanced => "boundary",
            Self::Bicentered => "bicentered",
            Self::Unified => "unified",
        }
    }

    /// Zoekt een schema op naam (hoofdletterongevoelig).
    #[must_use]
    pub fn resolve(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == normalized)
    }
}

/// Immutable per-run configuration for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Iteration budget `p`.
    pub budget: usize,
    /// Full admissible configuration-variable box.
    pub v_domain: Vec<Interval>,
    /// Numeric mechanism constants.
    pub params: Vec<f64>,
}

impl ClassifyConfig {
    /// Configuration from a mechanism's defaults with the default budget.
    #[must_use]
    pub fn from_mechanism(mechanism: &Mechanism) -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            v_domain: mechanism.v_domain(),
            params: mechanism.default_params().to_vec(),
        }
    }

    #[must_use]
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }
}

/// Configuratiefouten bij het opzetten van een classifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("v-domain has {found} axes but the operator expects {expected}")]
    DomainDimension { expected: usize, found: usize },
    #[error("{found} parameters supplied but the operator expects {expected}")]
    ParamCount { expected: usize, found: usize },
    #[error("iteration budget must be at least 1")]
    ZeroBudget,
}

/// Validated classifier: operator plus scheme plus configuration.
///
/// Validation happens once here so the per-cell path stays infallible.
#[derive(Debug)]
pub struct BoxClassifier<'op> {
    operator: &'op KrawczykOperator,
    scheme: Scheme,
    budget: usize,
    v_domain: Vec<Interval>,
    params: Vec<f64>,
}

enum Step {
    Inside,
    Outside,
    Shrunk,
}

impl<'op> BoxClassifier<'op> {
    pub fn new(
        operator: &'op KrawczykOperator,
        scheme: Scheme,
        config: ClassifyConfig,
    ) -> Result<Self, ClassifyError> {
        if config.budget == 0 {
            return Err(ClassifyError::ZeroBudget);
        }
        if config.v_domain.len() != operator.dim() {
            return Err(ClassifyError::DomainDimension {
                expected: operator.dim(),
                found: config.v_domain.len(),
            });
        }
        if config.params.len() != operator.param_count() {
            return Err(ClassifyError::ParamCount {
                expected: operator.param_count(),
                found: config.params.len(),
            });
        }
        Ok(Self {
            operator,
            scheme,
            budget: config.budget,
            v_domain: config.v_domain,
            params: config.params,
        })
    }

    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn v_domain(&self) -> &[Interval] {
        &self.v_domain
    }

    /// Number of task-space coordinates of the underlying operator.
    #[must_use]
    pub const fn task_dim(&self) -> usize {
        self.operator.task_dim()
    }

    /// Classifies a cell against the full admissible V-domain.
    #[must_use]
    pub fn classify(&self, cell: &[Interval]) -> Classification {
        self.classify_with_domain(cell, &self.v_domain)
    }

    /// Classifies a cell against an explicit starting hypothesis box, as the
    /// recursive subdivision traversal does for its child sub-boxes.
    #[must_use]
    pub fn classify_with_domain(&self, cell: &[Interval], v0: &[Interval]) -> Classification {
        debug_assert_eq!(cell.len(), self.operator.task_dim());
        debug_assert_eq!(v0.len(), self.operator.dim());
        match self.scheme {
            Scheme::Classical | Scheme::Unified => self.refine_midpoint(cell, v0),
            Scheme::Bicentered => self.refine_bicentered(cell, v0),
            Scheme::BoundaryEnhanced => self.refine_boundary(cell, v0),
        }
    }

    /// Classical loop: single midpoint center per iteration.
    fn refine_midpoint(&self, cell: &[Interval], v0: &[Interval]) -> Classification {
        let mut v = v0.to_vec();
        for iteration in 0..self.budget {
            let vmid: Vec<f64> = v.iter().map(Interval::mid).collect();
            let enclosure = self
                .operator
                .eval_unchecked(cell, &v, &vmid, &vmid, &self.params);
            match step(&mut v, &enclosure) {
                Step::Inside => {
                    log::trace!("inside after {} iterations", iteration + 1);
                    return Classification::Inside;
                }
                Step::Outside => return Classification::Outside,
                Step::Shrunk => {}
            }
        }
        Classification::Border
    }

    /// Bicentered loop: two centers derived from the sign pattern of the
    /// previous iteration's residual; their enclosures are intersected.
    fn refine_bicentered(&self, cell: &[Interval], v0: &[Interval]) -> Classification {
        let mut v = v0.to_vec();
        let mut residual: Option<Vec<Interval>> = None;
        for _ in 0..self.budget {
            let vmid: Vec<f64> = v.iter().map(Interval::mid).collect();
            let enclosure = match residual.as_deref() {
                None => self
                    .operator
                    .eval_unchecked(cell, &v, &vmid, &vmid, &self.params),
                Some(previous) => {
                    let (c_min, c_max) = bicenters(&v, previous);
                    let k_min = self
                        .operator
                        .eval_unchecked(cell, &v, &vmid, &c_min, &self.params);
                    let k_max = self
                        .operator
                        .eval_unchecked(cell, &v, &vmid, &c_max, &self.params);
                    // Both enclosures contain the range of G over V, so a
                    // solution would have to lie in their intersection.
                    let mut merged = Vec::with_capacity(k_min.len());
                    for (a, b) in k_min.iter().zip(&k_max) {
                        match a.intersect(b) {
                            Ok(overlap) => merged.push(overlap),
                            Err(_) => return Classification::Outside,
                        }
                    }
                    merged
                }
            };
            residual = Some(
                enclosure
                    .iter()
                    .zip(&vmid)
                    .map(|(k_i, mid)| *k_i - *mid)
                    .collect(),
            );
            match step(&mut v, &enclosure) {
                Step::Inside => return Classification::Inside,
                Step::Outside => return Classification::Outside,
                Step::Shrunk => {}
            }
        }
        Classification::Border
    }

    /// Boundary-enhanced: the sound classical test decides Outside; the
    /// Inside certificate additionally requires every degenerate face
    /// sub-box (one axis pinned at a bound) to map into the full box.
    fn refine_boundary(&self, cell: &[Interval], v0: &[Interval]) -> Classification {
        match self.refine_midpoint(cell, v0) {
            Classification::Outside => return Classification::Outside,
            Classification::Inside | Classification::Border => {}
        }
        for axis in 0..v0.len() {
            for bound in [v0[axis].lo(), v0[axis].hi()] {
                if self.face_certificate(cell, v0, axis, bound) != Classification::Inside {
                    // A face that fails to certify leaves the cell
                    // unresolved, not proven unreachable.
                    return Classification::Border;
                }
            }
        }
        Classification::Inside
    }

    /// Runs the contraction seeded from one face, testing containment and
    /// disjointness against the full box.
    fn face_certificate(
        &self,
        cell: &[Interval],
        v0: &[Interval],
        axis: usize,
        bound: f64,
    ) -> Classification {
        let mut v = v0.to_vec();
        v[axis] = Interval::point(bound);
        for _ in 0..self.budget {
            let vmid: Vec<f64> = v.iter().map(Interval::mid).collect();
            let enclosure = self
                .operator
                .eval_unchecked(cell, &v, &vmid, &vmid, &self.params);
            if enclosure
                .iter()
                .zip(v0)
                .all(|(k_i, full_i)| k_i.is_in(full_i))
            {
                return Classification::Inside;
            }
            for ((v_i, k_i), full_i) in v.iter_mut().zip(&enclosure).zip(v0) {
                match full_i.intersect(k_i) {
                    Ok(next) => *v_i = next,
                    Err(_) => return Classification::Outside,
                }
            }
        }
        Classification::Border
    }
}

/// One transition of the shared state machine: inside test, outside test,
/// then the componentwise shrink.
fn step(v: &mut [Interval], enclosure: &[Interval]) -> Step {
    if enclosure.iter().zip(&*v).all(|(k_i, v_i)| k_i.is_in(v_i)) {
        return Step::Inside;
    }
    if enclosure
        .iter()
        .zip(&*v)
        .any(|(k_i, v_i)| v_i.is_no_intersec(k_i))
    {
        return Step::Outside;
    }
    for (v_i, k_i) in v.iter_mut().zip(enclosure) {
        match v_i.intersect(k_i) {
            Ok(next) => *v_i = next,
            // Disjointness is the defined Outside transition, made explicit
            // rather than relying on a caller default.
            Err(_) => return Step::Outside,
        }
    }
    Step::Shrunk
}

/// Per-axis center pair from the sign pattern of the residual enclosure:
/// a non-positive residual prefers the upper bound, a non-negative one the
/// lower bound, and a sign change uses the zero-crossing convex combination.
fn bicenters(v: &[Interval], residual: &[Interval]) -> (Vec<f64>, Vec<f64>) {
    let mut c_min = Vec::with_capacity(v.len());
    let mut c_max = Vec::with_capacity(v.len());
    for (v_i, r_i) in v.iter().zip(residual) {
        if !r_i.lo().is_finite() || !r_i.hi().is_finite() {
            c_min.push(v_i.mid());
            c_max.push(v_i.mid());
            continue;
        }
        let span = r_i.hi() - r_i.lo();
        let (lo_center, hi_center) = if r_i.hi() <= 0.0 {
            (v_i.hi(), v_i.lo())
        } else if r_i.lo() >= 0.0 {
            (v_i.lo(), v_i.hi())
        } else if span > 0.0 {
            let crossing_min = (r_i.hi() * v_i.lo() - r_i.lo() * v_i.hi()) / span;
            let crossing_max = (r_i.hi() * v_i.hi() - r_i.lo() * v_i.lo()) / span;
            (
                crossing_min.clamp(v_i.lo(), v_i.hi()),
                crossing_max.clamp(v_i.lo(), v_i.hi()),
            )
        } else {
            (v_i.mid(), v_i.mid())
        };
        c_min.push(lo_center);
        c_max.push(hi_center);
    }
    (c_min, c_max)
}
