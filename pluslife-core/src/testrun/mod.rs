//! The full record of one test: identity, configuration, sample history and
//! the final result once the analyzer reports one.

pub mod builder;
pub mod views;

use crate::{
    error::PluslifeError,
    result::DetectionResultSet,
    sample::{FluorescenceSample, TemperatureSample},
};
use chrono::{DateTime, Utc};
use pluslife_schemas::{
    enums::{TestType, WireEnum},
    file_formats::TestrunFile,
    sample::TestData,
};
use serde_json::Value;

pub use builder::TestrunBuilder;
pub use views::LatestPoint;

/// Number of optical channels on the analyzer.
pub const CHANNELS: u32 = 7;

/// Reaction temperature in °C used when a document does not specify one.
pub const DEFAULT_TARGET_TEMP: i64 = 63;

#[derive(Debug, Clone, PartialEq)]
pub struct Testrun {
    pub version: i64,
    pub id: String,
    pub start: DateTime<Utc>,
    pub test_type: TestType,
    pub target_temp: i64,
    pub comment: String,
    /// In arrival order.
    pub temperature_samples: Vec<TemperatureSample>,
    /// In arrival order; "latest" queries rely on it.
    pub samples: Vec<FluorescenceSample>,
    pub test_result: Option<DetectionResultSet>,
}

impl Testrun {
    /// Decodes a persisted testrun document with no caller-supplied start or comment.
    pub fn from_value(value: Value) -> Result<Self, PluslifeError> {
        TestrunBuilder::new().decode_value(value)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PluslifeError> {
        TestrunBuilder::new().decode_str(json)
    }

    /// Encodes into the persisted document shape.
    pub fn to_file(&self) -> TestrunFile {
        TestrunFile {
            version: Some(self.version),
            id: Some(self.id.clone()),
            test_type: Some(self.test_type.name().to_string()),
            target_temp: Some(self.target_temp),
            test_data: TestData {
                temperature_samples: self.temperature_samples.iter().map(|t| t.to_record()).collect(),
                samples: self.samples.iter().map(|s| s.to_record()).collect(),
            },
            test_result: self.test_result.as_ref().map(|r| r.to_coded()),
        }
    }

    pub fn to_value(&self) -> Result<Value, PluslifeError> {
        Ok(serde_json::to_value(self.to_file())?)
    }

    pub fn to_json_string(&self) -> Result<String, PluslifeError> {
        Ok(serde_json::to_string(&self.to_file())?)
    }

    pub fn push_temperature_sample(&mut self, sample: TemperatureSample) {
        self.temperature_samples.push(sample);
    }

    pub fn push_sample(&mut self, sample: FluorescenceSample) {
        self.samples.push(sample);
    }

    pub fn extend_samples<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = FluorescenceSample>,
    {
        self.samples.extend(samples);
    }

    /// Attaches the final result, which marks the run as finished.
    pub fn finish(&mut self, result: DetectionResultSet) {
        self.test_result = Some(result);
    }
}
