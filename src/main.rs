use clap::{ArgAction, Parser as ClapParser};
use dq_lang::{
    cli::{self, CliError, OutputFormat, RunOptions, RunOutcome},
    loader::Format,
};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(ClapParser)]
#[command(name = "dq")]
#[command(about = "dq - A pipeline query language for CSV, JSON, Avro and Parquet files")]
#[command(version)]
#[command(after_help = "Examples:\n  dq 'users.csv | filter { age > 20 } | select name age'\n  \
                        dq -f csv 'mydata | select name age'\n  \
                        cat users.jsonl | dq -f jsonl '- | group city | reduce n = count()'")]
struct Cli {
    /// The query: a source file followed by `| operation` stages
    query: String,

    /// File format, overriding the file extension
    #[arg(short, long, value_parser = ["csv", "json", "jsonl", "ndjson", "avro", "parquet"])]
    format: Option<String>,

    /// Print the result as a JSON array of objects
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long)]
    pretty: bool,

    /// Only validate syntax, don't read or execute anything
    #[arg(long)]
    check: bool,

    /// Log more to stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let format = cli
        .format
        .as_deref()
        .map(str::parse::<Format>)
        .transpose()?;

    let output = if cli.pretty {
        OutputFormat::JsonPretty
    } else if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let options = RunOptions {
        query: cli.query,
        format,
        check: cli.check,
        output,
    };

    match cli::execute(&options)? {
        RunOutcome::SyntaxValid => println!("Syntax is valid"),
        RunOutcome::Rendered(text) => {
            print!("{}", text);
            if !text.is_empty() && !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
