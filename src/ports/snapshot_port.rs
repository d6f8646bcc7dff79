//! Snapshot source port trait.

use crate::domain::error::FlowbandError;
use crate::domain::quote::StockQuote;
use chrono::NaiveDate;

pub trait SnapshotPort {
    /// All quotes stored for `trade_date`. A date with no snapshot is
    /// `FlowbandError::NoData`.
    fn load_snapshot(&self, trade_date: NaiveDate) -> Result<Vec<StockQuote>, FlowbandError>;

    /// Dates with a stored snapshot, ascending.
    fn list_dates(&self) -> Result<Vec<NaiveDate>, FlowbandError>;

    /// Latest stored date strictly before `before`.
    fn previous_date(&self, before: NaiveDate) -> Result<Option<NaiveDate>, FlowbandError> {
        Ok(self
            .list_dates()?
            .into_iter()
            .filter(|d| *d < before)
            .max())
    }
}
