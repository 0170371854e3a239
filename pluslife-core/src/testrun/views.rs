//! Read-only views derived from a testrun's sample history.
//!
//! None of these fault on an empty history: counts come back as 0, maps empty
//! and predicates false.

use super::{Testrun, CHANNELS};
use crate::{
    error::PluslifeError,
    sample::{highest_channel, latest_sampling_time, reported_channels},
};
use chrono::{DateTime, Duration, Utc};
use pluslife_schemas::{enums::WireEnum, file_formats::MinimalTestrun};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Most recent reading of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestPoint {
    pub sampling_time: u32,
    pub value: i64,
}

impl Testrun {
    pub fn is_finished(&self) -> bool {
        self.test_result.is_some()
    }

    /// Highest `startingChannel` seen, 0 with no samples.
    pub fn channel_count(&self) -> u32 {
        highest_channel(&self.samples)
    }

    pub fn latest_sample_time(&self) -> u32 {
        latest_sampling_time(&self.samples)
    }

    /// Whether every channel that has reported during this run has a sample
    /// at the newest sampling time.
    pub fn has_all_data_for_current_time(&self) -> bool {
        if self.samples.is_empty() {
            return false;
        }
        let newest = self.latest_sample_time();
        let at_newest: BTreeSet<u32> = self
            .samples
            .iter()
            .filter(|s| s.sampling_time == newest)
            .map(|s| s.starting_channel)
            .collect();
        at_newest.len() == reported_channels(&self.samples).len()
    }

    /// Latest `(samplingTime, firstChannelResult)` per channel.
    ///
    /// Walks the history backwards from the last appended sample and stops as
    /// soon as every known channel has been captured.
    pub fn get_latest_points(&self) -> BTreeMap<u32, LatestPoint> {
        let known = reported_channels(&self.samples).len();
        let mut points = BTreeMap::new();
        for sample in self.samples.iter().rev() {
            if points.len() == known {
                break;
            }
            points.entry(sample.starting_channel).or_insert(LatestPoint {
                sampling_time: sample.sampling_time,
                value: sample.first_channel_result,
            });
        }
        points
    }

    pub fn get_current_human_readable_state(&self) -> String {
        self.human_readable_state_at(Utc::now())
    }

    /// One status line: latest value per channel, or the time spent waiting
    /// for the first sample.
    pub fn human_readable_state_at(&self, now: DateTime<Utc>) -> String {
        let points = self.get_latest_points();
        match points.values().map(|p| p.sampling_time).max() {
            Some(current) => {
                let channels = (0..CHANNELS)
                    .map(|i| match points.get(&i) {
                        Some(point) => format!("{}:{:>5}", i, point.value),
                        None => format!("{}:{:>5}", i, "___"),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{:.1}min: {}", current as f64 / 600.0, channels)
            }
            None => format!(
                "{}: Waiting for first Data...",
                format_elapsed(now.signed_duration_since(self.start))
            ),
        }
    }

    /// Compact projection of a finished run.
    pub fn to_minimal(&self) -> Result<MinimalTestrun, PluslifeError> {
        let result = self
            .test_result
            .as_ref()
            .ok_or(PluslifeError::InvalidAggregateAccess("to_minimal_json"))?;
        Ok(MinimalTestrun {
            start: self.start.timestamp().to_string(),
            test_type: self.test_type.code(),
            samples: self.samples.iter().map(|s| s.to_minimal()).collect(),
            result: result.to_coded(),
        })
    }

    pub fn to_minimal_json(&self) -> Result<Value, PluslifeError> {
        Ok(serde_json::to_value(self.to_minimal()?)?)
    }
}

/// `H:MM:SS`, clamped at zero for clocks that run behind the start time.
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
