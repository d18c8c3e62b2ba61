use std::io::{self, Write};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use cxxviz_core::memory::sample::{self, SampleObject, INT_BLOCK_SIZE};
use cxxviz_core::memory::Snapshot;
use cxxviz_core::{PatternRegistry, ValueHandle, Visualizer};
use cxxviz_utils::{debug, init_logging, init_logging_with_level, LogFormat, LogLevel};

/// Inspect libc++ container visualizers against synthesized process images.
#[derive(Parser, Debug)]
#[command(name = "cxxviz")]
#[command(version)]
#[command(about = "Inspect libc++ container visualizers against synthesized process images", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Log format (pretty or json); overrides CXXVIZ_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// List the registered type-name patterns in dispatch order
    Patterns,
    /// Show which visualizer a type name dispatches to
    Match
    {
        /// Fully qualified type name, e.g. "std::__1::vector<int, std::__1::allocator<int> >"
        type_name: String,
    },
    /// Lay out a container in a memory image and visualize it
    Demo
    {
        /// Container to build
        #[arg(value_enum)]
        container: Container,
        /// Elements, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [1, 2, 3])]
        values: Vec<i32>,
        /// Contents of a string container
        #[arg(long, default_value = "hello, world")]
        text: String,
        /// Elements per deque block
        #[arg(long, default_value_t = INT_BLOCK_SIZE)]
        block_size: u64,
        /// Absolute position of the first deque element
        #[arg(long, default_value_t = 0)]
        start: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Container
{
    String,
    Vector,
    List,
    Deque,
    Stack,
    Queue,
}

fn main()
{
    let cli = Cli::parse();

    let logging = if cli.log_level.is_some() || cli.log_format.is_some() {
        init_logging_with_level(
            cli.log_level.unwrap_or(LogLevel::Warn),
            cli.log_format.unwrap_or(LogFormat::Pretty),
        )
    } else {
        init_logging()
    };
    let _guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = run_command(cli.command, &mut stdout) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Commands, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>>
{
    let registry = PatternRegistry::with_builtins()?;

    match command {
        Commands::Patterns => {
            for (position, entry) in registry.entries().iter().enumerate() {
                writeln!(out, "{position}  {:<8} {}", entry.kind().name(), entry.matcher().pattern())?;
            }
        }
        Commands::Match { type_name } => match registry.resolve(&type_name) {
            Some(kind) => writeln!(out, "{kind}")?,
            None => writeln!(out, "no visualizer (host default rendering)")?,
        },
        Commands::Demo {
            container,
            values,
            text,
            block_size,
            start,
        } => {
            let mut snapshot = Snapshot::new();
            let object = build(&mut snapshot, &registry, container, &values, &text, block_size, start)?;
            debug!(type_name = %object.type_name, address = %object.address, "sample built");

            let value = object.value(&snapshot);
            match registry.lookup(&value)? {
                Some(visualizer) => render(&visualizer, out)?,
                None => writeln!(out, "{}", value.render()?)?,
            }
        }
    }

    Ok(())
}

fn build(
    snapshot: &mut Snapshot,
    registry: &PatternRegistry,
    container: Container,
    values: &[i32],
    text: &str,
    block_size: u64,
    start: u64,
) -> cxxviz_core::Result<SampleObject>
{
    match container {
        Container::String => sample::string(snapshot, text, &registry.string_layout()),
        Container::Vector => sample::vector(snapshot, values),
        Container::List => sample::list(snapshot, values),
        Container::Deque => sample::deque(snapshot, values, block_size, start),
        Container::Stack => sample::stack(snapshot, values),
        Container::Queue => sample::queue(snapshot, values),
    }
}

/// Print a visualizer the way a debugger's variables view would.
///
/// A failing child ends the listing with an error line; the summary and the
/// children already printed stay.
fn render<V: ValueHandle>(visualizer: &Visualizer<V>, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>>
{
    writeln!(out, "type:    {}", visualizer.type_name())?;
    writeln!(out, "kind:    {}", visualizer.kind())?;
    match visualizer.summary() {
        Ok(summary) => writeln!(out, "summary: {summary}")?,
        Err(e) => writeln!(out, "summary: <error: {e}>")?,
    }
    if let Some(hint) = visualizer.display_hint() {
        writeln!(out, "hint:    {hint}")?;
    }

    let Some(children) = visualizer.children()? else {
        return Ok(());
    };
    for child in children {
        match child {
            Ok(child) => writeln!(out, "  {} = {}", child.label, child.value.render()?)?,
            Err(e) => writeln!(out, "  <error: {e}>")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn run(args: &[&str]) -> String
    {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run_command(cli.command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_patterns_lists_five_entries()
    {
        let output = run(&["cxxviz", "patterns"]);
        assert_eq!(output.lines().count(), 5);
        assert!(output.lines().next().unwrap().contains("string"));
    }

    #[test]
    fn test_match_reports_kind_or_fallback()
    {
        assert_eq!(run(&["cxxviz", "match", "std::__1::deque<int>"]), "deque\n");
        assert!(run(&["cxxviz", "match", "std::__1::map<int, int>"]).starts_with("no visualizer"));
    }

    #[test]
    fn test_demo_vector_lists_children()
    {
        let output = run(&["cxxviz", "demo", "vector", "--values", "4,-5,6"]);
        assert!(output.contains("of length 3"));
        assert!(output.contains("  [1] = -5"));
        assert!(output.contains("hint:    array"));
    }

    #[test]
    fn test_demo_string_has_no_children()
    {
        let output = run(&["cxxviz", "demo", "string", "--text", "hi"]);
        assert!(output.contains("summary: \"hi\""));
        assert!(output.contains("hint:    string"));
        assert!(!output.contains("[0]"));
    }

    #[test]
    fn test_demo_queue_wraps_deque()
    {
        let output = run(&["cxxviz", "demo", "queue", "--values", "7"]);
        assert!(output.contains("wrapping: std::__1::deque<int, std::__1::allocator<int> > of length 1"));
        assert!(output.contains("  [0] = 7"));
    }

    #[test]
    fn test_global_log_flags_parse()
    {
        let cli = Cli::try_parse_from(["cxxviz", "patterns", "--log-level", "debug", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(Cli::try_parse_from(["cxxviz", "patterns", "--log-level", "loud"]).is_err());
    }
}
