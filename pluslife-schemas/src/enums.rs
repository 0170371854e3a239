//! Closed value sets reported by the Pluslife analyzer and its cloud integration.
//!
//! Every enumeration carries a lookup table pairing each variant with its integer
//! wire code and its symbolic wire name. Persisted testruns mostly use the codes,
//! webhooks use the names; both lookups land on the same variant.

use std::fmt;

/// Lookup tables shared by every wire enumeration.
pub trait WireEnum: Copy + PartialEq + Sized + 'static {
    /// Name used when reporting an unknown wire value.
    const ENUM_NAME: &'static str;

    /// All variants with their wire code and wire name.
    fn table() -> &'static [(Self, i64, &'static str)];

    fn from_code(code: i64) -> Option<Self> {
        Self::table().iter().find(|(_, c, _)| *c == code).map(|(v, _, _)| *v)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::table().iter().find(|(_, _, n)| *n == name).map(|(v, _, _)| *v)
    }

    fn code(self) -> i64 {
        Self::table()
            .iter()
            .find(|(v, _, _)| *v == self)
            .map(|(_, c, _)| *c)
            .unwrap_or_default()
    }

    fn name(self) -> &'static str {
        Self::table()
            .iter()
            .find(|(v, _, _)| *v == self)
            .map(|(_, _, n)| *n)
            .unwrap_or_default()
    }
}

/// Status the analyzer reports for itself when a test is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Ready,
    Started,
    AlreadyRunning,
    NotReady,
    Abnormal,
    UnsupportedTest,
}

impl WireEnum for DeviceStatus {
    const ENUM_NAME: &'static str = "DeviceStatus";

    fn table() -> &'static [(Self, i64, &'static str)] {
        &[
            (DeviceStatus::Ready, 0, "READY"),
            (DeviceStatus::Started, 1, "STARTED"),
            (DeviceStatus::AlreadyRunning, 2, "ALREADY_RUNNING"),
            (DeviceStatus::NotReady, 3, "NOT_READY"),
            (DeviceStatus::Abnormal, 4, "ABNORMAL"),
            (DeviceStatus::UnsupportedTest, 5, "UNSUPPORTED_TEST"),
        ]
    }
}

/// State of the test slot as carried in webhook snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestState {
    Uninitialized,
    Idle,
    Testing,
    Done,
    BlockedAlreadyTesting,
    BlockedNotReady,
}

impl WireEnum for TestState {
    const ENUM_NAME: &'static str = "TestState";

    fn table() -> &'static [(Self, i64, &'static str)] {
        &[
            (TestState::Uninitialized, 0, "UNINITIALIZED"),
            (TestState::Idle, 1, "IDLE"),
            (TestState::Testing, 2, "TESTING"),
            (TestState::Done, 3, "DONE"),
            (TestState::BlockedAlreadyTesting, 4, "BLOCKED_ALREADY_TESTING"),
            (TestState::BlockedNotReady, 5, "BLOCKED_NOT_READY"),
        ]
    }
}

/// Qualitative verdict for a channel, a subgroup or a whole test.
///
/// There is no zero code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionResult {
    Negative,
    Positive,
    Invalid,
}

impl WireEnum for DetectionResult {
    const ENUM_NAME: &'static str = "DetectionResult";

    fn table() -> &'static [(Self, i64, &'static str)] {
        &[
            (DetectionResult::Negative, 1, "NEGATIVE"),
            (DetectionResult::Positive, 2, "POSITIVE"),
            (DetectionResult::Invalid, 3, "INVALID"),
        ]
    }
}

/// Disease target of a test cartridge.
///
/// New targets get a new variant and a new table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TestType {
    #[default]
    Unknown,
    SarsCov2,
}

impl WireEnum for TestType {
    const ENUM_NAME: &'static str = "TestType";

    fn table() -> &'static [(Self, i64, &'static str)] {
        &[(TestType::Unknown, 0, "Unknown"), (TestType::SarsCov2, 1, "SARS-CoV-2")]
    }
}

/// Kind of notification pushed by the device's cloud integration.
///
/// The codes are internal ordinals; webhooks only ever carry the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    TestStarted,
    ContinueTest,
    TestFinished,
    NewData,
    DeviceReady,
    AlreadyTesting,
}

impl WireEnum for WebhookEvent {
    const ENUM_NAME: &'static str = "WebhookEvent";

    fn table() -> &'static [(Self, i64, &'static str)] {
        &[
            (WebhookEvent::TestStarted, 1, "TEST_STARTED"),
            (WebhookEvent::ContinueTest, 2, "CONTINUE_TEST"),
            (WebhookEvent::TestFinished, 3, "TEST_FINISHED"),
            (WebhookEvent::NewData, 4, "NEW_DATA"),
            (WebhookEvent::DeviceReady, 5, "DEVICE_READY"),
            (WebhookEvent::AlreadyTesting, 6, "ALREADY_TESTING"),
        ]
    }
}

macro_rules! display_wire_name {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        })*
    };
}

display_wire_name!(DeviceStatus, TestState, DetectionResult, TestType, WebhookEvent);
