//! Typed model of Pluslife analyzer data and its JSON codec.
//!
//! Persisted testruns decode into [`testrun::Testrun`], device webhooks into
//! [`webhook::WebhookEnvelope`]. Both share the sample and result types but
//! follow different wire conventions for their enumerations.

pub mod codec;
pub mod error;
pub mod flat;
pub mod result;
pub mod sample;
pub mod testrun;
pub mod webhook;

pub use error::PluslifeError;
pub use pluslife_schemas::enums;
