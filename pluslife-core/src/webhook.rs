//! Notifications pushed by the analyzer's cloud integration.

use crate::{
    codec::{decode_wire_name, required},
    error::PluslifeError,
    result::DetectionResultSet,
    sample::{latest_sampling_time, FluorescenceSample, TemperatureSample},
};
use pluslife_schemas::{
    enums::{TestState, WebhookEvent},
    file_formats::WebhookPayload,
};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

const TYPE_NAME: &str = "WebhookEnvelope";

/// A decoded webhook plus the payload it came from.
///
/// The sample histories are the snapshot carried by this one event and are
/// owned by the envelope alone.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEnvelope {
    pub version: i64,
    pub event: WebhookEvent,
    pub serial_number: i64,
    /// The `device` object as sent.
    pub device_info: Map<String, Value>,
    pub state: TestState,
    pub result: Option<DetectionResultSet>,
    pub temperature_samples: Vec<TemperatureSample>,
    pub samples: Vec<FluorescenceSample>,
    raw: Value,
}

impl WebhookEnvelope {
    pub fn from_json_str(json: &str) -> Result<Self, PluslifeError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_value(raw: Value) -> Result<Self, PluslifeError> {
        let payload: WebhookPayload = serde_json::from_value(raw.clone())?;

        let event = decode_wire_name(&required(payload.event, TYPE_NAME, "event")?)?;
        let serial_number = payload
            .device
            .get("sn")
            .and_then(Value::as_i64)
            .ok_or(PluslifeError::MissingRequiredField(TYPE_NAME, "device.sn"))?;
        let state = decode_wire_name(&required(payload.test.state, TYPE_NAME, "test.state")?)?;
        let result = payload.test.result.map(DetectionResultSet::from_named).transpose()?;

        let temperature_samples = payload
            .test
            .data
            .temperature_samples
            .into_iter()
            .map(TemperatureSample::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let samples = payload
            .test
            .data
            .samples
            .into_iter()
            .map(FluorescenceSample::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        let envelope = Self {
            version: payload.version.unwrap_or(0),
            event,
            serial_number,
            device_info: payload.device,
            state,
            result,
            temperature_samples,
            samples,
            raw,
        };
        debug!(
            serial_number = envelope.serial_number,
            event = %envelope.event,
            state = %envelope.state,
            samples = envelope.samples.len(),
            "decoded webhook"
        );
        Ok(envelope)
    }

    /// The payload exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Looks up a field of the original payload by JSON pointer, e.g.
    /// `/device/firmware`. Reaches fields this model does not know about.
    pub fn field(&self, pointer: &str) -> Option<&Value> {
        self.raw.pointer(pointer)
    }

    pub fn latest_sample_time(&self) -> u32 {
        latest_sampling_time(&self.samples)
    }
}

impl fmt::Display for WebhookEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SN {}: {}", self.serial_number, self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluslife_schemas::enums::DetectionResult;
    use serde_json::json;

    fn finished_payload() -> Value {
        json!({
            "version": 1,
            "event": "TEST_FINISHED",
            "device": { "sn": 240117, "firmware": "2.4.1" },
            "test": {
                "state": "DONE",
                "result": {
                    "detectionType": 1,
                    "detectionFlowNumber": 7,
                    "detectionResult": "POSITIVE",
                    "numberOfChannels": 2,
                    "startingChannel": 0,
                    "channelResults": ["POSITIVE", "NEGATIVE"],
                    "numberOfSubGroups": 1,
                    "subGroupResults": [{ "result": "POSITIVE" }]
                },
                "data": {
                    "temperatureSamples": [{ "time": "2025-01-01T10:00:00.000Z", "temp": 63 }],
                    "samples": [
                        { "startingChannel": 0, "samplingTime": 100, "samplingTemperature": 6300, "firstChannelResult": 20 },
                        { "startingChannel": 1, "samplingTime": 150, "samplingTemperature": 6301, "firstChannelResult": 21 }
                    ]
                }
            }
        })
    }

    #[test]
    fn finished_webhook_decodes_named_result() {
        let envelope = WebhookEnvelope::from_value(finished_payload()).unwrap();
        assert_eq!(envelope.event, WebhookEvent::TestFinished);
        assert_eq!(envelope.state, TestState::Done);
        assert_eq!(envelope.serial_number, 240117);

        let result = envelope.result.as_ref().unwrap();
        assert_eq!(result.detection_result, DetectionResult::Positive);
        assert_eq!(
            result.channel_results,
            vec![DetectionResult::Positive, DetectionResult::Negative]
        );
        assert_eq!(result.sub_group_results, vec![DetectionResult::Positive]);
        assert_eq!(envelope.latest_sample_time(), 150);
        assert_eq!(envelope.temperature_samples.len(), 1);
    }

    #[test]
    fn raw_payload_is_kept_for_unknown_fields() {
        let envelope = WebhookEnvelope::from_value(finished_payload()).unwrap();
        assert_eq!(envelope.raw(), &finished_payload());
        assert_eq!(envelope.field("/device/firmware"), Some(&json!("2.4.1")));
        assert_eq!(envelope.device_info.get("firmware"), Some(&json!("2.4.1")));
        assert_eq!(envelope.to_string(), "SN 240117: TEST_FINISHED");
    }

    #[test]
    fn running_webhook_has_no_result() {
        let envelope = WebhookEnvelope::from_value(json!({
            "version": 1,
            "event": "NEW_DATA",
            "device": { "sn": 5 },
            "test": { "state": "TESTING", "result": {}, "data": {} }
        }))
        .unwrap();
        assert!(envelope.result.is_none());
        assert!(envelope.samples.is_empty());
        assert_eq!(envelope.latest_sample_time(), 0);
    }

    #[test]
    fn missing_event_is_reported() {
        let mut payload = finished_payload();
        payload.as_object_mut().unwrap().remove("event");
        let err = WebhookEnvelope::from_value(payload).unwrap_err();
        assert!(matches!(err, PluslifeError::MissingRequiredField(_, "event")));
    }

    #[test]
    fn unknown_event_is_rejected() {
        let mut payload = finished_payload();
        payload["event"] = json!("TEST_ABORTED");
        let err = WebhookEnvelope::from_value(payload).unwrap_err();
        assert!(matches!(err, PluslifeError::UnknownEnumValue("WebhookEvent", _)));
    }

    #[test]
    fn integer_verdicts_are_not_accepted_in_webhooks() {
        let mut payload = finished_payload();
        payload["test"]["result"]["detectionResult"] = json!(2);
        assert!(matches!(
            WebhookEnvelope::from_value(payload),
            Err(PluslifeError::JsonParsing(_))
        ));
    }

    #[test]
    fn finished_webhook_with_bare_verdicts() {
        let envelope = WebhookEnvelope::from_value(json!({
            "event": "TEST_FINISHED",
            "device": { "sn": 1 },
            "test": {
                "state": "DONE",
                "result": {
                    "detectionResult": "POSITIVE",
                    "channelResults": ["POSITIVE", "NEGATIVE"],
                    "subGroupResults": [{ "result": "POSITIVE" }]
                }
            }
        }))
        .unwrap();

        assert_eq!(envelope.event, WebhookEvent::TestFinished);
        assert_eq!(envelope.state, TestState::Done);
        let result = envelope.result.unwrap();
        assert_eq!(result.detection_result, DetectionResult::Positive);
        assert_eq!(
            result.channel_results,
            vec![DetectionResult::Positive, DetectionResult::Negative]
        );
        assert_eq!(result.sub_group_results, vec![DetectionResult::Positive]);
        assert!(envelope.samples.is_empty());
    }
}
