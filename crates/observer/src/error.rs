use core_types::WatchHandle;
use std::fmt;

/// Error type subscribers return to abort delivery.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug)]
pub enum ObserverError {
    /// A subscriber failed. The rest of that tick was skipped; the next tick
    /// compares against the snapshots left in place.
    Subscriber {
        handle: WatchHandle,
        source: SubscriberError,
    },
}

impl fmt::Display for ObserverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverError::Subscriber { handle, source } => {
                write!(f, "subscriber for watch {} failed: {source}", handle.0)
            }
        }
    }
}

impl std::error::Error for ObserverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ObserverError::Subscriber { source, .. } => Some(source.as_ref()),
        }
    }
}
