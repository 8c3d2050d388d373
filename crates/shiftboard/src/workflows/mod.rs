pub mod reporting;
pub mod shifts;
