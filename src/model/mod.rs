//! Types that represent the budget data model, such as `BudgetPlan`, `Envelope` and `Amount`.
mod amount;
mod envelope;
mod id;
mod month;
mod plan;

pub use amount::{format_amount, format_amount_str, parse_amount, to_amount, Amount};
pub use envelope::{
    AmountField, Envelope, EnvelopeMonth, MaintenanceCategory, MonthRecord, NewEnvelope,
};
pub use id::{EnvelopeId, PlanId};
pub use month::Month;
pub use plan::{BudgetPlan, PlanStatus};
