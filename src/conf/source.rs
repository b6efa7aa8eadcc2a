use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default = "SourceConfig::default_dir")]
    pub dir: PathBuf,
}

impl SourceConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("/var/lib/pageframe/table")
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}
