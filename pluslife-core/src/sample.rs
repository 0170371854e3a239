use crate::{
    codec::{decode_wire_int, format_timestamp, parse_timestamp_value, required},
    error::PluslifeError,
};
use chrono::{DateTime, Utc};
use pluslife_schemas::{
    enums::{TestType, WireEnum},
    sample::{MinimalSample, SampleRecord, TemperatureSampleRecord},
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Block temperature at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSample {
    pub time: DateTime<Utc>,
    pub temp: f64,
}

impl TemperatureSample {
    pub fn new(time: DateTime<Utc>, temp: f64) -> Self {
        Self { time, temp }
    }

    pub fn from_record(record: TemperatureSampleRecord) -> Result<Self, PluslifeError> {
        let time = required(record.time, "TemperatureSample", "time")?;
        Ok(Self {
            time: parse_timestamp_value(&time)?,
            temp: required(record.temp, "TemperatureSample", "temp")?,
        })
    }

    pub fn to_record(&self) -> TemperatureSampleRecord {
        TemperatureSampleRecord {
            time: Some(Value::String(format_timestamp(&self.time))),
            temp: Some(self.temp),
        }
    }
}

/// One fluorescence reading of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FluorescenceSample {
    pub starting_channel: u32,
    /// Tenths of a second since the test started.
    pub sampling_time: u32,
    /// Hundredths of a degree Celsius.
    pub sampling_temperature: f64,
    /// Raw fluorescence units.
    pub first_channel_result: i64,
    pub sample_type: TestType,
    pub sample_stream_number: u32,
    pub current_data_index: u32,
    pub total_number_of_samples: u32,
    pub number_of_channels: u32,
    /// Keys the analyzer sent that are not part of the sample schema.
    pub extra: Map<String, Value>,
}

impl FluorescenceSample {
    /// Builds a sample from the four measured fields; the rest take their defaults.
    pub fn new(
        starting_channel: u32,
        sampling_time: u32,
        sampling_temperature: f64,
        first_channel_result: i64,
    ) -> Self {
        Self {
            starting_channel,
            sampling_time,
            sampling_temperature,
            first_channel_result,
            sample_type: TestType::SarsCov2,
            sample_stream_number: 0,
            current_data_index: 0,
            total_number_of_samples: 1,
            number_of_channels: 1,
            extra: Map::new(),
        }
    }

    pub fn from_record(record: SampleRecord) -> Result<Self, PluslifeError> {
        const TYPE_NAME: &str = "FluorescenceSample";

        let mut sample = Self::new(
            required(record.starting_channel, TYPE_NAME, "startingChannel")?,
            required(record.sampling_time, TYPE_NAME, "samplingTime")?,
            required(record.sampling_temperature, TYPE_NAME, "samplingTemperature")?,
            required(record.first_channel_result, TYPE_NAME, "firstChannelResult")?,
        );
        if let Some(code) = record.sample_type {
            sample.sample_type = decode_wire_int(code)?;
        }
        if let Some(n) = record.sample_stream_number {
            sample.sample_stream_number = n;
        }
        if let Some(n) = record.current_data_index {
            sample.current_data_index = n;
        }
        if let Some(n) = record.total_number_of_samples {
            sample.total_number_of_samples = n;
        }
        if let Some(n) = record.number_of_channels {
            sample.number_of_channels = n;
        }
        sample.extra = record.extra;
        Ok(sample)
    }

    pub fn to_record(&self) -> SampleRecord {
        SampleRecord {
            starting_channel: Some(self.starting_channel),
            sampling_time: Some(self.sampling_time),
            sampling_temperature: Some(self.sampling_temperature),
            first_channel_result: Some(self.first_channel_result),
            sample_type: Some(self.sample_type.code()),
            sample_stream_number: Some(self.sample_stream_number),
            current_data_index: Some(self.current_data_index),
            total_number_of_samples: Some(self.total_number_of_samples),
            number_of_channels: Some(self.number_of_channels),
            extra: self.extra.clone(),
        }
    }

    pub fn to_minimal(&self) -> MinimalSample {
        MinimalSample {
            time: self.sampling_time,
            channel: self.starting_channel,
            value: self.first_channel_result,
            temperature: self.sampling_temperature,
        }
    }

    pub fn sampling_minutes(&self) -> f64 {
        self.sampling_time as f64 / 600.0
    }
}

impl fmt::Display for FluorescenceSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel: {} time: {:.0}s ({:.1}min), Temperature: {:.1}°C, Value: {}",
            self.starting_channel,
            self.sampling_time as f64 / 10.0,
            self.sampling_minutes(),
            self.sampling_temperature / 100.0,
            self.first_channel_result * 64
        )
    }
}

/// Highest `startingChannel` in the history, 0 when empty.
pub fn highest_channel(samples: &[FluorescenceSample]) -> u32 {
    samples.iter().map(|s| s.starting_channel).max().unwrap_or(0)
}

/// Latest `samplingTime` in the history, 0 when empty.
pub fn latest_sampling_time(samples: &[FluorescenceSample]) -> u32 {
    samples.iter().map(|s| s.sampling_time).max().unwrap_or(0)
}

/// Channels that reported at least once.
pub fn reported_channels(samples: &[FluorescenceSample]) -> BTreeSet<u32> {
    samples.iter().map(|s| s.starting_channel).collect()
}
