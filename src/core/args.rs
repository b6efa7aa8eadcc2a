use std::path::PathBuf;

use clap::Parser;
use log::kv::{ToValue, Value};

/// Dump the page frames a replication sender would stream for a table.
#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    #[arg(short, long)]
    pub config: Option<String>,

    /// Table directory, overrides `source.dir`.
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Global row to resume from, overrides `replication.from_row`.
    #[arg(short, long)]
    pub from: Option<u64>,

    #[arg(long)]
    pub max_frames: Option<usize>,
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}
