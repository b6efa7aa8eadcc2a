use anyhow::Context;
use chrono::DateTime;
use clap::Parser;
use log::info;
use serde::Serialize;

use pageframe::conf::Config;
use pageframe::core::{CliArgs, setup_logging};
use pageframe::{LocalTable, PageFrame, PageFrameCursor, TableReader};

#[derive(Serialize)]
struct ColumnSummary<'a> {
    name: &'a str,
    offset: u64,
    len: u64,
}

#[derive(Serialize)]
struct FrameSummary<'a> {
    partition: usize,
    rows: u64,
    first_timestamp: Option<String>,
    last_timestamp: Option<String>,
    columns: Vec<ColumnSummary<'a>>,
}

fn render_micros(micros: i64) -> String {
    DateTime::from_timestamp_micros(micros)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| micros.to_string())
}

fn summarize<'a, R: TableReader>(frame: &PageFrame<'_, R>, names: &'a [String]) -> FrameSummary<'a> {
    FrameSummary {
        partition: frame.partition_index(),
        rows: frame.row_count(),
        first_timestamp: frame.first_timestamp().map(render_micros),
        last_timestamp: frame.last_timestamp().map(render_micros),
        columns: names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let span = frame.column_span(i);
                ColumnSummary {
                    name,
                    offset: span.offset,
                    len: span.len,
                }
            })
            .collect(),
    }
}

fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();
    info!(args:? = args; "Pageframe started.");

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {path}"))?,
        None => Config::default(),
    };
    if let Some(dir) = args.dir {
        config.source.dir = dir;
    }
    if let Some(from) = args.from {
        config.replication.from_row = Some(from);
    }
    if args.max_frames.is_some() {
        config.replication.max_frames = args.max_frames;
    }

    let table = LocalTable::open(&config.source.dir)
        .with_context(|| format!("opening table {}", config.source.dir.display()))?;

    let mut cursor = PageFrameCursor::new();
    match config.replication.from_row {
        Some(row) => cursor.reset_from(table, row)?,
        None => cursor.reset(table),
    }
    let names: Vec<String> = cursor
        .metadata()
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    info!(
        "Streaming {} rows from row {}",
        cursor.size(),
        config.replication.from_row.unwrap_or(0)
    );

    let limit = config.replication.max_frames.unwrap_or(usize::MAX);
    let mut frames = 0usize;
    let mut rows = 0u64;
    while frames < limit {
        let Some(frame) = cursor.advance()? else {
            break;
        };
        rows += frame.row_count();
        println!("{}", serde_json::to_string(&summarize(&frame, &names))?);
        frames += 1;
    }
    cursor.close();

    info!("Produced {frames} frames covering {rows} rows.");
    Ok(())
}
