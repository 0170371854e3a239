//! Wire-level vocabulary of the Pluslife analyzer: its enumerations and the
//! serde records for persisted testruns, webhooks and the minimal projection.

pub mod enums;
pub mod file_formats;
pub mod number;
pub mod result;
pub mod sample;
