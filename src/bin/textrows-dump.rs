use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use textrows::{ColumnInfo, TextRows, TextRowsBuilder, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "textrows-dump")]
#[command(about = "Decode a tab-separated result with names and types into JSON lines", long_about = None)]
struct Args {
    /// Input file (if not specified, reads from stdin)
    input: Option<String>,

    /// Output file (if not specified, writes to stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Reject lines longer than this many bytes
    #[arg(long)]
    max_line_bytes: Option<usize>,

    /// Print the column metadata and stop
    #[arg(long)]
    columns_only: bool,

    /// Stop after this many rows
    #[arg(short, long)]
    limit: Option<u64>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "textrows=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut output = BufWriter::new(output);

    let mut builder = TextRowsBuilder::new();
    if let Some(limit) = args.max_line_bytes {
        builder = builder.max_line_bytes(limit);
    }
    let mut rows = builder.build(input).context("Failed to read result header")?;

    let columns: Vec<ColumnInfo<'_>> = rows.descriptors().iter().map(|c| c.info()).collect();
    write_json(&mut output, &serde_json::json!({ "columns": columns }), args.pretty)?;

    let result = if args.columns_only {
        Ok(0)
    } else {
        dump_rows(&mut rows, &mut output, &args)
    };
    rows.close()?;
    output.flush()?;

    let count = result?;
    tracing::info!("Wrote {} rows", count);
    Ok(())
}

fn dump_rows<R: BufRead, W: Write>(
    rows: &mut TextRows<R>,
    output: &mut W,
    args: &Args,
) -> Result<u64> {
    let mut dest = vec![Value::Null; rows.column_count()];
    let mut count = 0u64;

    while args.limit.map_or(true, |limit| count < limit) {
        let more = rows
            .next(&mut dest)
            .with_context(|| format!("Failed to decode row {}", count + 1))?;
        if !more {
            break;
        }
        write_json(output, &dest, args.pretty)?;
        count += 1;
    }

    Ok(count)
}

fn write_json<W: Write, T: serde::Serialize + ?Sized>(
    output: &mut W,
    value: &T,
    pretty: bool,
) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *output, value)?;
    } else {
        serde_json::to_writer(&mut *output, value)?;
    }
    writeln!(output)?;
    Ok(())
}
