use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A detection result block.
///
/// The same block is encoded two ways: persisted testruns use integer codes
/// for every verdict, webhooks use symbolic names and wrap each subgroup verdict
/// in an object. `R` is the verdict representation and `G` the subgroup entry.
/// `detectionType` is an integer code in both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord<R, G> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_flow_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_result: Option<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_channel: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_results: Option<Vec<R>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_sub_groups: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_group_results: Option<Vec<G>>,
}

/// Result block of a persisted testrun: every verdict is an integer code.
pub type CodedResultRecord = ResultRecord<i64, i64>;

/// Result block of a webhook: verdicts are names, subgroups are objects.
pub type NamedResultRecord = ResultRecord<String, SubGroupRecord>;

/// One subgroup entry inside a webhook result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGroupRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads a result block where `null` and `{}` both mean "no result yet".
pub fn deserialize_optional_result<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(other) => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Writes a missing result as an empty object, the way finished and unfinished
/// testruns are persisted side by side.
pub fn serialize_result_or_empty<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Serialize,
{
    match value {
        Some(result) => result.serialize(serializer),
        None => Map::new().serialize(serializer),
    }
}
