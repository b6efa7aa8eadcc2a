mod config;
mod replication;
mod source;

pub use config::Config;
pub use replication::ReplicationConfig;
pub use source::SourceConfig;
