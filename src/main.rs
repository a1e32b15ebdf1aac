use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use proguard_retrace::{MappingModel, Retrace, Template, STACK_TRACE_TEMPLATE};

/// Deobfuscates stack traces with a proguard mapping file.
#[derive(Debug, Parser)]
#[command(name = "retrace", version, about)]
struct Cli {
    /// The proguard mapping file.
    #[arg(short, long, value_name = "PATH")]
    mapping: PathBuf,

    /// The obfuscated text to retrace, standard input if omitted.
    #[arg(short, long, value_name = "PATH")]
    stacktrace: Option<PathBuf>,

    /// The template lines are matched against.
    #[arg(short, long, value_name = "TEMPLATE", default_value = STACK_TRACE_TEMPLATE)]
    regex: String,

    /// Print types next to resolved fields and methods.
    #[arg(short, long)]
    verbose: bool,

    /// Print the size of the mapping as JSON and exit.
    #[arg(long)]
    summary: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // warn+ on stderr; --debug enables debug; RUST_LOG overrides
    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();

    let mapping = MappingModel::from_path(&cli.mapping)
        .with_context(|| format!("failed to load mapping {}", cli.mapping.display()))?;

    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    if cli.summary {
        serde_json::to_writer_pretty(&mut output, &mapping.summary())
            .context("failed to write summary")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    let template = Template::compile(&cli.regex).context("invalid template")?;
    let retrace = Retrace::new(&mapping, &template).verbose(cli.verbose);

    let result = match &cli.stacktrace {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            retrace.retrace_reader(BufReader::new(file), output)
        }
        None => retrace.retrace_reader(io::stdin().lock(), output),
    };

    result.context("failed to retrace input")
}
