//! Local editing of budget envelopes: month merges, totals, the edit session and saving it.
//!
//! Everything here except `save_session` is synchronous and free of I/O.
mod merge;
mod payload;
mod save;
mod session;
mod totals;

pub use merge::merge_month;
pub use payload::{build_payloads, EnvelopePayload};
pub use save::{save_session, SaveFailure, SaveReport};
pub use session::EditSession;
pub use totals::{envelope_totals, plan_totals, EnvelopeTotals, PlanTotals};
