pub mod math;
pub mod schedule;

pub use schedule::{generate_schedule, payment_summary, PaymentSummary, Schedule, ScheduleItem};
