use pluslife_core::{
    codec::{first_difference, semantically_equal},
    enums::{DetectionResult, TestState, TestType, WebhookEvent},
    flat::{from_flat_line, to_flat_line},
    testrun::{Testrun, TestrunBuilder},
    webhook::WebhookEnvelope,
    PluslifeError,
};
use serde_json::{json, Value};

fn sample(channel: u32, time: u32, temperature: Value, value: i64) -> Value {
    json!({
        "startingChannel": channel,
        "samplingTime": time,
        "samplingTemperature": temperature,
        "firstChannelResult": value,
        "sampleType": 1,
        "sampleStreamNumber": 0,
        "currentDataIndex": time / 50,
        "totalNumberOfSamples": 1,
        "numberOfChannels": 1
    })
}

fn finished_document() -> Value {
    json!({
        "version": 1,
        "id": "6f1c2b8e-3d4a-4b5c-8e9f-0a1b2c3d4e5f",
        "testType": "SARS-CoV-2",
        "targetTemp": 63,
        "testData": {
            "temperatureSamples": [
                { "time": "2025-02-14T08:30:00.000Z", "temp": 25.5 },
                { "time": "2025-02-14T08:30:01.500Z", "temp": 31 },
                { "time": "2025-02-14T08:30:03.000Z", "temp": 40.25 }
            ],
            "samples": [
                sample(0, 50, json!(6300), 101),
                sample(1, 50, json!(6300), 99),
                sample(0, 100, json!(6312.5), 140),
                sample(1, 100, json!(6312.5), 97)
            ]
        },
        "testResult": {
            "detectionType": 1,
            "detectionFlowNumber": 3,
            "detectionResult": 2,
            "numberOfChannels": 2,
            "startingChannel": 0,
            "channelResults": [2, 1],
            "numberOfSubGroups": 1,
            "subGroupResults": [2]
        }
    })
}

fn running_document() -> Value {
    let mut document = finished_document();
    document["testResult"] = json!({});
    document["testData"]["samples"]
        .as_array_mut()
        .unwrap()
        .push(sample(0, 150, json!(6299), 180));
    document
}

#[test]
fn finished_document_round_trips() {
    let document = finished_document();
    let testrun = Testrun::from_value(document.clone()).unwrap();
    assert_eq!(testrun.to_value().unwrap(), document);
    assert!(testrun.is_finished());
}

#[test]
fn running_document_round_trips_with_empty_result() {
    let document = running_document();
    let testrun = Testrun::from_value(document.clone()).unwrap();
    assert!(!testrun.is_finished());
    assert_eq!(testrun.to_value().unwrap(), document);
}

#[test]
fn round_trip_through_text() {
    let text = serde_json::to_string(&finished_document()).unwrap();
    let testrun = Testrun::from_json_str(&text).unwrap();
    let reparsed: Value = serde_json::from_str(&testrun.to_json_string().unwrap()).unwrap();
    assert_eq!(reparsed, finished_document());
}

#[test]
fn unknown_sample_keys_survive_round_trip() {
    let mut document = finished_document();
    document["testData"]["samples"][0]["opticalGain"] = json!(12);
    let testrun = Testrun::from_value(document.clone()).unwrap();
    assert_eq!(testrun.to_value().unwrap(), document);
}

#[test]
fn decoded_views_of_a_running_document() {
    let testrun = Testrun::from_value(running_document()).unwrap();
    assert_eq!(testrun.channel_count(), 1);
    assert_eq!(testrun.latest_sample_time(), 150);
    assert!(!testrun.has_all_data_for_current_time());
    assert_eq!(testrun.start.timestamp(), 1_739_521_800);

    let points = testrun.get_latest_points();
    assert_eq!(points[&0].value, 180);
    assert_eq!(points[&1].value, 97);
    assert!(matches!(
        testrun.to_minimal_json(),
        Err(PluslifeError::InvalidAggregateAccess(_))
    ));
}

#[test]
fn caller_start_and_comment_are_not_persisted() {
    let start = chrono::DateTime::parse_from_rfc3339("2025-02-14T08:29:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let testrun = TestrunBuilder::new()
        .with_start(start)
        .with_comment("lot 2025-07")
        .decode_value(finished_document())
        .unwrap();
    assert_eq!(testrun.start, start);
    assert_eq!(testrun.comment, "lot 2025-07");
    assert_eq!(testrun.to_value().unwrap(), finished_document());
}

#[test]
fn one_bad_sample_fails_the_whole_document() {
    let mut document = finished_document();
    document["testData"]["temperatureSamples"][1]["time"] = json!("14/02/2025 08:30");
    assert!(matches!(
        Testrun::from_value(document),
        Err(PluslifeError::MalformedTimestamp(raw)) if raw == "14/02/2025 08:30"
    ));
}

#[test]
fn both_formats_agree_on_verdicts() {
    let testrun = Testrun::from_value(finished_document()).unwrap();
    let webhook = WebhookEnvelope::from_value(json!({
        "version": 1,
        "event": "TEST_FINISHED",
        "device": { "sn": 1024 },
        "test": {
            "state": "DONE",
            "result": {
                "detectionType": 1,
                "detectionFlowNumber": 3,
                "detectionResult": "POSITIVE",
                "numberOfChannels": 2,
                "startingChannel": 0,
                "channelResults": ["POSITIVE", "NEGATIVE"],
                "numberOfSubGroups": 1,
                "subGroupResults": [{ "result": "POSITIVE" }]
            },
            "data": finished_document()["testData"].clone()
        }
    }))
    .unwrap();

    assert_eq!(webhook.event, WebhookEvent::TestFinished);
    assert_eq!(webhook.state, TestState::Done);
    assert_eq!(webhook.result, testrun.test_result);
    assert_eq!(webhook.samples, testrun.samples);
    assert_eq!(webhook.latest_sample_time(), testrun.latest_sample_time());

    let result = webhook.result.unwrap();
    assert_eq!(result.detection_type, TestType::SarsCov2);
    assert_eq!(result.detection_result, DetectionResult::Positive);
}

#[test]
fn flat_lines_of_a_decoded_run() {
    let testrun = Testrun::from_value(finished_document()).unwrap();
    let lines: Vec<String> = testrun.samples.iter().map(to_flat_line).collect();
    assert_eq!(lines, vec!["50;0;101;6300", "50;1;99;6300", "100;0;140;6312.5", "100;1;97;6312.5"]);

    let back = from_flat_line(&lines[2]).unwrap();
    assert_eq!(back.first_channel_result, 140);
    assert_eq!(back.current_data_index, 0);
}

#[test]
fn decimal_spelling_of_whole_numbers_round_trips_by_value() {
    let mut document = finished_document();
    document["testData"]["temperatureSamples"][0]["temp"] = json!(38.0);
    document["testData"]["samples"][0]["samplingTemperature"] = json!(6300.0);

    let encoded = Testrun::from_value(document.clone()).unwrap().to_value().unwrap();
    assert!(semantically_equal(&document, &encoded));
    assert_eq!(encoded["testData"]["temperatureSamples"][0]["temp"], json!(38));
}

#[test]
fn changed_values_are_located() {
    let document = finished_document();
    let mut testrun = Testrun::from_value(document.clone()).unwrap();
    testrun.samples[2].first_channel_result = 141;
    assert_eq!(
        first_difference(&document, &testrun.to_value().unwrap()),
        Some("/testData/samples/2/firstChannelResult".to_string())
    );
}

