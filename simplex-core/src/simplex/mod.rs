//! The simplex engine.
//!
//! Implements the revised simplex method with:
//! - LU basis factorization with product-form updates
//! - primal and dual drivers behind a common engine surface
//! - cost and bound perturbation against stalling and cycling
//! - backtracking to the last nonsingular basis on factorization failure
//! - synthetic-clock and update-limit reinversion control
#![allow(missing_docs)]

pub mod control;
pub mod diagnostics;
pub mod dual;
pub mod engine;
pub mod primal;
pub mod workspace;

pub use control::BacktrackingBasis;
pub use diagnostics::DiagnosticsConfig;
pub use engine::{EngineError, SimplexEngine, SimplexInfo, SimplexStatus};
pub use workspace::SimplexWorkspace;

/// Which simplex variant is running; some initialisation differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexAlgorithm {
    Primal,
    Dual,
}

/// Phase is not yet determined.
pub const PHASE_UNKNOWN: i32 = -1;
/// Feasibility phase.
pub const PHASE_1: i32 = 1;
/// Optimality phase.
pub const PHASE_2: i32 = 2;

/// Default Markowitz threshold.
pub const DEFAULT_PIVOT_THRESHOLD: f64 = 0.1;
/// Largest Markowitz threshold the trouble recovery will escalate to.
pub const MAX_PIVOT_THRESHOLD: f64 = 0.5;
/// Multiplicative step for threshold escalation.
pub const PIVOT_THRESHOLD_CHANGE_FACTOR: f64 = 5.0;

/// Relative discrepancy between the column-wise and row-wise pivot values
/// beyond which the factorization is considered to be in trouble.
pub const NUMERICAL_TROUBLE_TOLERANCE: f64 = 1e-7;

/// Minimum updates before the synthetic clock may force a reinversion.
pub const SYNTHETIC_TICK_REINVERSION_MIN_UPDATE_COUNT: usize = 50;

/// Reason a driver should rebuild the factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// The update limit was reached
    UpdateLimitReached,
    /// The synthetic clock says a reinversion now costs less than the
    /// accumulated update overhead
    SyntheticClockSaysInvert,
}
