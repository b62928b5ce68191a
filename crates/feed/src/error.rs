/// Failures of the transport client.
///
/// None of these are fatal to a session: a failed fetch leaves the store
/// empty and a failed or closed channel leaves the feed stale. The session
/// reports them through `FeedHealth` instead of propagating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Bulk fetch answered with a non-success status.
    Fetch { status: u16 },
    /// Bulk fetch could not be sent or completed.
    Request(String),
    /// Bulk fetch body is not a JSON array of spot records.
    Body(String),
    /// Update channel could not be opened.
    Connect(String),
    ChannelClosed,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Fetch { status } => write!(f, "failed to fetch spots: HTTP {status}"),
            TransportError::Request(msg) => write!(f, "spot request failed: {msg}"),
            TransportError::Body(msg) => write!(f, "invalid spot list: {msg}"),
            TransportError::Connect(msg) => write!(f, "update channel connect failed: {msg}"),
            TransportError::ChannelClosed => write!(f, "update channel closed"),
        }
    }
}

impl std::error::Error for TransportError {}
