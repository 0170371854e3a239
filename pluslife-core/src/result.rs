use crate::{
    codec::{decode_wire_int, decode_wire_name, required},
    error::PluslifeError,
};
use pluslife_schemas::{
    enums::{DetectionResult, TestType, WireEnum},
    result::{CodedResultRecord, NamedResultRecord, ResultRecord},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

const TYPE_NAME: &str = "DetectionResultSet";

/// Final verdict of a test, per channel, per subgroup and overall.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResultSet {
    pub detection_type: TestType,
    pub detection_flow_number: i64,
    pub detection_result: DetectionResult,
    pub number_of_channels: u32,
    pub starting_channel: u32,
    pub channel_results: Vec<DetectionResult>,
    pub number_of_sub_groups: u32,
    pub sub_group_results: Vec<DetectionResult>,
}

/// Display form of a result: verdict names keyed by channel index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumanReadableResult {
    pub channels: BTreeMap<usize, &'static str>,
    pub result: &'static str,
}

/// Fields shared by both result shapes once the verdicts are decoded.
struct Header {
    detection_type: TestType,
    detection_flow_number: i64,
    number_of_channels: u32,
    starting_channel: u32,
    number_of_sub_groups: u32,
}

impl Header {
    fn decode<R, G>(record: &ResultRecord<R, G>) -> Result<Self, PluslifeError> {
        Ok(Self {
            detection_type: decode_wire_int(required(
                record.detection_type,
                TYPE_NAME,
                "detectionType",
            )?)?,
            detection_flow_number: required(record.detection_flow_number, TYPE_NAME, "detectionFlowNumber")?,
            number_of_channels: required(record.number_of_channels, TYPE_NAME, "numberOfChannels")?,
            starting_channel: required(record.starting_channel, TYPE_NAME, "startingChannel")?,
            number_of_sub_groups: required(record.number_of_sub_groups, TYPE_NAME, "numberOfSubGroups")?,
        })
    }

    /// Webhooks may carry only the verdicts. Missing header fields fall back
    /// to `Unknown`, zero, or the length of the matching verdict list.
    fn decode_or_default<R, G>(record: &ResultRecord<R, G>) -> Result<Self, PluslifeError> {
        Ok(Self {
            detection_type: record
                .detection_type
                .map(decode_wire_int::<TestType>)
                .transpose()?
                .unwrap_or_default(),
            detection_flow_number: record.detection_flow_number.unwrap_or(0),
            number_of_channels: record
                .number_of_channels
                .or_else(|| record.channel_results.as_ref().map(|r| r.len() as u32))
                .unwrap_or(0),
            starting_channel: record.starting_channel.unwrap_or(0),
            number_of_sub_groups: record
                .number_of_sub_groups
                .or_else(|| record.sub_group_results.as_ref().map(|r| r.len() as u32))
                .unwrap_or(0),
        })
    }
}

impl DetectionResultSet {
    /// Decodes the integer-coded block stored with persisted testruns.
    pub fn from_coded(record: CodedResultRecord) -> Result<Self, PluslifeError> {
        let header = Header::decode(&record)?;
        let detection_result: DetectionResult = decode_wire_int(required(
            record.detection_result,
            TYPE_NAME,
            "detectionResult",
        )?)?;
        let channel_results = required(record.channel_results, TYPE_NAME, "channelResults")?
            .into_iter()
            .map(decode_wire_int::<DetectionResult>)
            .collect::<Result<Vec<_>, _>>()?;
        let sub_group_results = required(record.sub_group_results, TYPE_NAME, "subGroupResults")?
            .into_iter()
            .map(decode_wire_int::<DetectionResult>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::assemble(header, detection_result, channel_results, sub_group_results))
    }

    /// Decodes the name-coded block carried by webhooks, where each subgroup
    /// verdict sits in an object's `result` field. Only the verdicts are
    /// required.
    pub fn from_named(record: NamedResultRecord) -> Result<Self, PluslifeError> {
        let header = Header::decode_or_default(&record)?;
        let detection_result: DetectionResult = decode_wire_name(&required(
            record.detection_result,
            TYPE_NAME,
            "detectionResult",
        )?)?;
        let channel_results = required(record.channel_results, TYPE_NAME, "channelResults")?
            .iter()
            .map(|name| decode_wire_name::<DetectionResult>(name))
            .collect::<Result<Vec<_>, _>>()?;
        let sub_group_results = required(record.sub_group_results, TYPE_NAME, "subGroupResults")?
            .into_iter()
            .map(|group| {
                let name = required(group.result, "SubGroupResult", "result")?;
                decode_wire_name::<DetectionResult>(&name)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::assemble(header, detection_result, channel_results, sub_group_results))
    }

    fn assemble(
        header: Header,
        detection_result: DetectionResult,
        channel_results: Vec<DetectionResult>,
        sub_group_results: Vec<DetectionResult>,
    ) -> Self {
        let result = Self {
            detection_type: header.detection_type,
            detection_flow_number: header.detection_flow_number,
            detection_result,
            number_of_channels: header.number_of_channels,
            starting_channel: header.starting_channel,
            channel_results,
            number_of_sub_groups: header.number_of_sub_groups,
            sub_group_results,
        };
        if !result.channel_count_matches() {
            warn!(
                declared = result.number_of_channels,
                reported = result.channel_results.len(),
                "result channel count does not match its channel results"
            );
        }
        result
    }

    /// Encodes into the integer-coded block.
    pub fn to_coded(&self) -> CodedResultRecord {
        CodedResultRecord {
            detection_type: Some(self.detection_type.code()),
            detection_flow_number: Some(self.detection_flow_number),
            detection_result: Some(self.detection_result.code()),
            number_of_channels: Some(self.number_of_channels),
            starting_channel: Some(self.starting_channel),
            channel_results: Some(self.channel_results.iter().map(|r| r.code()).collect()),
            number_of_sub_groups: Some(self.number_of_sub_groups),
            sub_group_results: Some(self.sub_group_results.iter().map(|r| r.code()).collect()),
        }
    }

    /// Whether `numberOfChannels` agrees with the channel verdicts received.
    pub fn channel_count_matches(&self) -> bool {
        self.channel_results.len() == self.number_of_channels as usize
    }

    pub fn human_readable(&self) -> HumanReadableResult {
        HumanReadableResult {
            channels: self
                .channel_results
                .iter()
                .enumerate()
                .map(|(i, r)| (i, r.name()))
                .collect(),
            result: self.detection_result.name(),
        }
    }
}
