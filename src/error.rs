use thiserror::Error;

/// A packet that could not be turned into a `SensorPacket`.
/// Always recoverable: the packet is dropped, kernel state is untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("duplicate action name `{0}` in probability vector")]
    DuplicateAction(String),

    #[error("audio top3 carries {0} classes (max 3)")]
    TooManyAudioClasses(usize),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

/// The packet decoded but its action vector cannot yield a decision.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidPacketError {
    #[error("action probability vector is empty")]
    EmptyActionProbs,

    #[error("action `{name}` has a non-finite probability")]
    NonFiniteProbability { name: String },
}

/// Everything the kernel can reject a single packet for.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    InvalidPacket(#[from] InvalidPacketError),
}

impl IngestError {
    pub fn kind(&self) -> DropKind {
        match self {
            IngestError::Decode(_) => DropKind::Decode,
            IngestError::InvalidPacket(_) => DropKind::InvalidPacket,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DropKind {
    Decode,
    InvalidPacket,
}

/// Transport-level failure. Triggers the reconnect policy.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {addr} timed out after {timeout_ms}ms")]
    Timeout { addr: String, timeout_ms: u64 },

    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream closed by peer")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
