use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use heapdb::{
    catalog::{schema::Schema, ty::Type},
    config::{check_page_size, DEFAULT_PAGE_SIZE},
    error::{DbResult, Error},
    exec::query::{OpIterator, SeqScan},
    io::{encoder::HeapFileEncoder, heap_file::HeapFile},
    tx::TransactionId,
    Db,
};
use tracing::{error, info};

const USAGE: &str = "\
usage:
    heapdb-cli convert <input.txt> <output.dat> <types> [--page-size N]
    heapdb-cli print <file.dat> <types> [--page-size N]

<types> is a comma-separated list of `int` and `string`, e.g. `int,string`.";

enum Command {
    Convert {
        input: PathBuf,
        output: PathBuf,
        schema: Schema,
        page_size: usize,
    },
    Print {
        file: PathBuf,
        schema: Schema,
        page_size: usize,
    },
}

fn main() -> ExitCode {
    setup_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(error) => {
            eprintln!("{error}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "command failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> DbResult<()> {
    match command {
        Command::Convert {
            input,
            output,
            schema,
            page_size,
        } => {
            let encoder = HeapFileEncoder::with_page_size(&schema, page_size);
            let pages = encoder.convert(&input, &output)?;
            println!("wrote {pages} pages to {}", output.display());
        }
        Command::Print {
            file,
            schema,
            page_size,
        } => {
            let db = Db::new();
            let file = HeapFile::with_page_size(&file, Arc::new(schema), page_size)?;
            let name = file
                .path()
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "table".into());
            let table_id = db.add_table(file, name)?;

            let mut scan = SeqScan::new(&db.ctx(), TransactionId::new(), table_id)?;
            let mut out = io::stdout().lock();
            writeln!(out, "{}", header(scan.schema()))?;
            let mut count = 0_u64;
            db.execute(&mut scan, |tuple| {
                count += 1;
                writeln!(out, "{tuple}")
            })??;
            info!(count, "printed tuples");
        }
    }
    Ok(())
}

fn header(schema: &Schema) -> String {
    schema
        .fields()
        .map(|field| field.name.as_deref().unwrap_or("null"))
        .collect::<Vec<_>>()
        .join("\t")
}

fn parse_args(args: &[String]) -> DbResult<Command> {
    let mut positional = Vec::new();
    let mut page_size = DEFAULT_PAGE_SIZE;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--page-size" {
            page_size = iter
                .next()
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| invalid("--page-size expects a positive integer"))
                .and_then(check_page_size)?;
        } else {
            positional.push(arg.as_str());
        }
    }

    match positional.as_slice() {
        ["convert", input, output, types] => Ok(Command::Convert {
            input: input.into(),
            output: output.into(),
            schema: parse_schema(types)?,
            page_size,
        }),
        ["print", file, types] => Ok(Command::Print {
            file: file.into(),
            schema: parse_schema(types)?,
            page_size,
        }),
        _ => Err(invalid("unexpected arguments")),
    }
}

/// Parses a comma-separated type list, naming the fields `f0`, `f1`, ...
fn parse_schema(types: &str) -> DbResult<Schema> {
    let types = types
        .split(',')
        .map(Type::from_name)
        .collect::<DbResult<Vec<_>>>()?;
    let names = (0..types.len()).map(|i| Some(format!("f{i}"))).collect();
    Schema::new(types, names)
}

fn invalid(msg: &'static str) -> Error {
    Error::InvalidArgument(msg.into())
}

/// Sets up tracing subscriber.
fn setup_tracing() {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or("warn".into());
    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
