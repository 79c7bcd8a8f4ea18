//! Root-finding and parameter inference.
//!
//! - [`newton`]: bounded Newton–Raphson shared by every iterative solve
//! - [`parameters`]: principal / payment / nominal rate inference

pub mod newton;
pub mod parameters;

pub use newton::{newton_raphson, NewtonConfig, RootSearch};
pub use parameters::{
    solve_missing, solve_missing_detailed, solve_rate, MissingField, PartialTerms, SolveOutcome,
    SolveRequest,
};
