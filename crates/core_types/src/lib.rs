use std::time::Duration;

/// Default poll period between observer ticks.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(30);

/// Handle returned when a watch is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(pub u64);

/// Process-unique identity tag for an observed node.
///
/// Tags are handed out monotonically and never reused, so a tag seen in an old
/// snapshot can be compared against one read from the live tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeTag(pub u64);

impl NodeTag {
    /// Reserved sentinel; never assigned to a node.
    pub const INVALID: NodeTag = NodeTag(0);
}
