use anyhow::{Context, Result, bail};
use runlog_logger::{HandlerRegistry, compose_run_name, configure};
use runlog_parser::{JsonLogParser, Severity};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: runlog [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Summarize a runlog JSON log file (one JSON object per line).");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --summary, -s           Print level/module/function counts (default)");
    eprintln!("  --table, -t             Print all records as an aligned table");
    eprintln!("  --top N                 Print the N most frequent messages");
    eprintln!("  --emit-demo             Emit a demo run, then summarize its own output");
    eprintln!("  --help, -h              Print this help message");
}

enum UsageOptions {
    Summary(PathBuf),
    Table(PathBuf),
    Top(PathBuf, usize),
    EmitDemo,
    Help,
}

impl UsageOptions {
    fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [] => {
                print_usage();
                bail!("a FILE argument is required");
            }
            [flag] if flag == "--help" || flag == "-h" => Ok(Self::Help),
            [flag] if flag == "--emit-demo" => Ok(Self::EmitDemo),
            [file] => Ok(Self::Summary(PathBuf::from(file))),
            [flag, file] if flag == "--summary" || flag == "-s" => {
                Ok(Self::Summary(PathBuf::from(file)))
            }
            [flag, file] if flag == "--table" || flag == "-t" => {
                Ok(Self::Table(PathBuf::from(file)))
            }
            [flag, n, file] if flag == "--top" => {
                let n: usize = n.parse().context("--top expects a number")?;
                Ok(Self::Top(PathBuf::from(file), n))
            }
            _ => {
                print_usage();
                bail!("unrecognized arguments");
            }
        }
    }
}

fn main() -> Result<()> {
    TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let args: Vec<String> = env::args().skip(1).collect();
    match UsageOptions::from_args(&args)? {
        UsageOptions::Help => {
            print_usage();
            Ok(())
        }
        UsageOptions::Summary(file) => print_summary(&load_parser(file)?),
        UsageOptions::Table(file) => {
            let parser = load_parser(file)?;
            print!("{}", parser.to_table()?);
            Ok(())
        }
        UsageOptions::Top(file, n) => {
            let parser = load_parser(file)?;
            for (message, count) in parser.top_messages(n)? {
                println!("{count:>6}  {message}");
            }
            Ok(())
        }
        UsageOptions::EmitDemo => emit_demo(),
    }
}

fn load_parser(file: PathBuf) -> Result<JsonLogParser> {
    let mut parser = JsonLogParser::new(&file);
    parser
        .load()
        .with_context(|| format!("failed to load {}", file.display()))?;
    Ok(parser)
}

fn print_summary(parser: &JsonLogParser) -> Result<()> {
    println!("records: {}", parser.records()?.len());
    if parser.skipped_lines() > 0 {
        println!("skipped: {} malformed line(s)", parser.skipped_lines());
    }

    println!();
    println!("by level:");
    let level_counts = parser.level_counts()?;
    for level in Severity::ALL {
        if let Some(count) = level_counts.get(&level) {
            println!("  {:<12} {}", level.to_string(), count);
        }
    }

    println!();
    println!("by module:");
    for (module, count) in sorted_counts(parser.module_counts()?) {
        println!("  {:<24} {}", module, count);
    }

    println!();
    println!("by function:");
    for (function, count) in sorted_counts(parser.func_counts()?) {
        println!("  {:<24} {}", function, count);
    }

    println!();
    println!("top messages:");
    for (message, count) in parser.top_messages(10)? {
        println!("{count:>6}  {message}");
    }
    Ok(())
}

fn sorted_counts(
    counts: std::collections::HashMap<String, usize>,
) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// configure a logger, emit a handful of events, then parse the run's own
/// JSON file back to show the full round trip
fn emit_demo() -> Result<()> {
    let base_dir = dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("runlog");

    let registry = HandlerRegistry::global();
    registry
        .set_run_identity(compose_run_name("demo"), &base_dir)
        .context("could not establish run identity")?;

    let logger = configure("main")?;
    logger
        .info("demo run started")
        .module("demo")
        .function("emit_demo")
        .emit()?;
    logger
        .debug("warming up")
        .module("demo")
        .function("emit_demo")
        .extra("attempt", 1)
        .emit()?;
    logger
        .performance("warm-up finished")
        .module("demo")
        .function("emit_demo")
        .extra("elapsed_ms", 12.5)
        .emit()?;
    logger
        .warning("nothing left to do")
        .module("demo")
        .function("emit_demo")
        .emit()?;

    let json_path = registry.json_file_path()?;
    println!("wrote {}", json_path.display());
    println!();

    print_summary(&load_parser(json_path)?)
}
