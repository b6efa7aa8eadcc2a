use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReplicationConfig {
    /// Number of rows the follower already holds. `None` streams from the top.
    #[serde(default)]
    pub from_row: Option<u64>,
    /// Stop after this many frames.
    #[serde(default)]
    pub max_frames: Option<usize>,
}
