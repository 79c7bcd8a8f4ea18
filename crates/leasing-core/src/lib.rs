//! Leasing and loan calculation engine.
//!
//! Pure, synchronous functions over decimal contract terms:
//!
//! - [`amortization`]: payment formulas and period-by-period schedules
//! - [`solver`]: bounded Newton–Raphson and missing-parameter inference
//! - [`rpmn`]: annual percentage rate of charge from the contract cash flows
//! - [`early_repayment`]: payoff amount at an arbitrary instalment
//! - [`quote`]: one-call completion and pricing of partial terms

pub mod amortization;
pub mod early_repayment;
pub mod error;
pub mod quote;
pub mod rpmn;
pub mod solver;
pub mod time_value;
pub mod types;

pub use amortization::{
    generate_schedule, payment_summary, PaymentSummary, Schedule, ScheduleItem,
};
pub use early_repayment::{
    compute_payoff, compute_payoff_for_terms, PayoffRequest, PayoffResult, PenaltyModel,
};
pub use error::LeasingError;
pub use quote::{build_quote, LeasingQuote, QuoteRequest};
pub use rpmn::{compute_rpmn, Annualization, RpmnInput, RpmnResult};
pub use solver::{
    solve_missing, solve_missing_detailed, MissingField, PartialTerms, SolveOutcome, SolveRequest,
};
pub use types::*;

/// Standard result type for all leasing operations
pub type LeasingResult<T> = Result<T, LeasingError>;
