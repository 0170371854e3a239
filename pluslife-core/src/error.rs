use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluslifeError {
    #[error("Unknown {0} value '{1}'")]
    UnknownEnumValue(&'static str, String),

    #[error("Malformed timestamp '{0}'")]
    MalformedTimestamp(String),

    #[error("{0} is missing required field '{1}'")]
    MissingRequiredField(&'static str, &'static str),

    #[error("'{0}' requires a finished testrun")]
    InvalidAggregateAccess(&'static str),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Malformed flat sample line '{0}': {1}")]
    FlatLine(String, #[source] csv::Error),

    #[error("Invalid {0} '{1}' in flat sample line")]
    InvalidFlatField(&'static str, String),

    #[error("Failed to write flat sample log: {0}")]
    FlatLog(#[source] csv::Error),
}
