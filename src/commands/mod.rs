pub mod analyze;
pub mod select;
pub mod status;
pub mod tag;

// Re-export command functions for convenience
pub use analyze::analyze;
pub use select::select;
pub use status::status;
pub use tag::tag;

use chrono::NaiveDate;

/// The given date, or today in local time
pub fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}
