//! # Domain Models
//!
//! Canonical domain types for pivot resolution.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StockId`] | Validated, digits-only stock code |
//! | [`RawRecord`] | High/low/close as extracted by an adapter |
//! | [`ValidatedRecord`] | Record that passed the OHLC invariants |
//!
//! Session helpers convert between wall-clock time and the Taipei trading
//! date, and parse the ROC calendar dates the exchanges publish.

mod identifier;
mod record;
mod session;

pub use identifier::StockId;
pub use record::{RawRecord, ValidatedRecord};
pub use session::{
    parse_exchange_date, previous_month, session_date_at, session_date_now, TAIPEI_OFFSET_HOURS,
};
