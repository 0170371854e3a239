use crate::number::serialize_compact_option;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One block-temperature reading as it appears in `testData.temperatureSamples`.
///
/// `time` is kept as raw JSON so a non-string timestamp can be reported as
/// malformed rather than as a generic type error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureSampleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_compact_option"
    )]
    pub temp: Option<f64>,
}

/// One fluorescence reading as it appears in `testData.samples`.
///
/// All fields are optional on the wire; the core decoder decides which are
/// required and which fall back to defaults. Keys outside the schema are kept
/// in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_channel: Option<u32>,
    /// Tenths of a second since the test started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_time: Option<u32>,
    /// Hundredths of a degree Celsius.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_compact_option"
    )]
    pub sampling_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_channel_result: Option<i64>,
    /// Integer test type code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_stream_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_data_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_number_of_samples: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_channels: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `testData` / `test.data` block shared by both payload shapes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestData {
    #[serde(default)]
    pub temperature_samples: Vec<TemperatureSampleRecord>,
    #[serde(default)]
    pub samples: Vec<SampleRecord>,
}

/// Compact per-sample projection used for display and transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimalSample {
    pub time: u32,
    pub channel: u32,
    pub value: i64,
    #[serde(serialize_with = "crate::number::serialize_compact")]
    pub temperature: f64,
}
