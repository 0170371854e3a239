use super::{Testrun, DEFAULT_TARGET_TEMP};
use crate::{
    codec::decode_wire_name,
    error::PluslifeError,
    result::DetectionResultSet,
    sample::{FluorescenceSample, TemperatureSample},
};
use chrono::{DateTime, Utc};
use pluslife_schemas::{enums::TestType, file_formats::TestrunFile};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// A fluent builder for constructing a `Testrun`.
///
/// `build` starts a fresh run with empty histories. The `decode_*` methods read
/// a persisted document; values found in the document take precedence over the
/// builder's id, test type, target temperature and version, which only fill
/// gaps. `start` and `comment` are never part of the document and always come
/// from the builder.
#[derive(Debug, Default)]
pub struct TestrunBuilder {
    start: Option<DateTime<Utc>>,
    comment: String,
    id: Option<String>,
    test_type: Option<TestType>,
    target_temp: Option<i64>,
    version: Option<i64>,
}

impl TestrunBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the start time, overriding anything derived from samples.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_test_type(mut self, test_type: TestType) -> Self {
        self.test_type = Some(test_type);
        self
    }

    pub fn with_target_temp(mut self, target_temp: i64) -> Self {
        self.target_temp = Some(target_temp);
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Starts a new run with no samples and no result.
    pub fn build(self) -> Testrun {
        Testrun {
            version: self.version.unwrap_or(0),
            id: self.id.unwrap_or_else(generate_id),
            start: self.start.unwrap_or_else(Utc::now),
            test_type: self.test_type.unwrap_or_default(),
            target_temp: self.target_temp.unwrap_or(DEFAULT_TARGET_TEMP),
            comment: self.comment,
            temperature_samples: Vec::new(),
            samples: Vec::new(),
            test_result: None,
        }
    }

    pub fn decode_str(self, json: &str) -> Result<Testrun, PluslifeError> {
        self.decode_file(serde_json::from_str(json)?)
    }

    pub fn decode_value(self, value: Value) -> Result<Testrun, PluslifeError> {
        self.decode_file(serde_json::from_value(value)?)
    }

    /// Decodes a persisted document. Any invalid field fails the whole run.
    pub fn decode_file(self, file: TestrunFile) -> Result<Testrun, PluslifeError> {
        let test_type = match file.test_type {
            Some(name) => decode_wire_name(&name)?,
            None => self.test_type.unwrap_or_default(),
        };

        let temperature_samples = file
            .test_data
            .temperature_samples
            .into_iter()
            .map(TemperatureSample::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let samples = file
            .test_data
            .samples
            .into_iter()
            .map(FluorescenceSample::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let test_result = file.test_result.map(DetectionResultSet::from_coded).transpose()?;

        let start = self
            .start
            .or_else(|| temperature_samples.iter().map(|t| t.time).min())
            .unwrap_or_else(Utc::now);

        let testrun = Testrun {
            version: file.version.or(self.version).unwrap_or(0),
            id: file.id.or(self.id).unwrap_or_else(generate_id),
            start,
            test_type,
            target_temp: file.target_temp.or(self.target_temp).unwrap_or(DEFAULT_TARGET_TEMP),
            comment: self.comment,
            temperature_samples,
            samples,
            test_result,
        };

        debug!(
            id = %testrun.id,
            temperature_samples = testrun.temperature_samples.len(),
            samples = testrun.samples.len(),
            finished = testrun.is_finished(),
            "decoded testrun"
        );
        Ok(testrun)
    }
}

/// A random (version 4) UUID in hyphenated lowercase form.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
