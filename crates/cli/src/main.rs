mod manifest;
mod report;

use anyhow::{Context, Result, bail};
use argot_grammar::help::{self, TextSink};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use crate::manifest::load_manifest;
use crate::report::{check_report, parse_report};

#[derive(Parser)]
#[command(name = "argot")]
#[command(version, about = "Parse and inspect command lines against JSON grammars", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a command line against a grammar
    Parse(ParseArgs),

    /// Render help for a command of a grammar
    Help(HelpArgs),

    /// Validate a grammar manifest
    Check(CheckArgs),
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the grammar manifest (default: argot.json)
    #[arg(short, long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Treat each input as one token instead of joining them into a line
    #[arg(long)]
    args: bool,

    /// Command line to parse (pass after `--`)
    #[arg(value_name = "INPUT", trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to the grammar manifest (default: argot.json)
    #[arg(short, long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Wrap width (default: $COLUMNS, then 80)
    #[arg(short, long, value_name = "N")]
    width: Option<usize>,

    /// Path of nested command aliases
    #[arg(value_name = "COMMAND")]
    path: Vec<String>,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the grammar manifest (default: argot.json)
    #[arg(short, long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => parse_command(args),
        Commands::Help(args) => help_command(args),
        Commands::Check(args) => check_command(args),
    }
}

fn parse_command(args: ParseArgs) -> Result<()> {
    tracing::debug!("executing parse command");

    let manifest = load_manifest(args.grammar.as_deref())?;
    let grammar = manifest.grammar()?;

    let result = if args.args {
        grammar.parse_args(&args.input)
    } else {
        grammar.parse(&args.input.join(" "))
    }
    .context("parse failed")?;
    let report = parse_report(&result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Command: {}", report.command.join(" "));
    for symbol in &report.symbols {
        if symbol.values.is_empty() {
            println!("  {} ({})", symbol.name, symbol.kind);
        } else {
            println!(
                "  {} ({}): {}",
                symbol.name,
                symbol.kind,
                symbol.values.join(", ")
            );
        }
    }
    if !report.arguments.is_empty() {
        println!("Arguments: {}", report.arguments.join(" "));
    }
    if !report.unmatched.is_empty() {
        println!("Unmatched: {}", report.unmatched.join(" "));
    }
    for condition in &report.conditions {
        println!("WARNING: {condition}");
    }

    Ok(())
}

fn help_command(args: HelpArgs) -> Result<()> {
    tracing::debug!("executing help command");

    let manifest = load_manifest(args.grammar.as_deref())?;
    let grammar = manifest.grammar()?;

    let Some(command) = grammar.command_path(&args.path) else {
        bail!("unknown command: {}", args.path.join(" "));
    };

    let width = args
        .width
        .or_else(|| std::env::var("COLUMNS").ok()?.parse().ok())
        .unwrap_or(0);
    let mut sink = TextSink::new(width);
    help::render(command, &mut sink);
    print!("{}", sink.text());

    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let manifest = load_manifest(args.grammar.as_deref())?;
    let grammar = manifest.grammar()?;
    let report = check_report(&manifest.path, &grammar);

    if args.json {
        // JSON-only output
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.conflicts.is_empty() {
            std::process::exit(1);
        }
        return Ok(());
    }

    eprintln!("=== Grammar Check Results ===");
    eprintln!("Manifest: {}", report.manifest);
    eprintln!("Root: {}", report.root);
    eprintln!("Options: {}", report.options);
    eprintln!("Commands: {}", report.commands);
    if !report.strict_commands.is_empty() {
        eprintln!("Strict: {}", report.strict_commands.join(", "));
    }
    if !report.undocumented.is_empty() {
        eprintln!(
            "Note: {} symbol(s) without help text",
            report.undocumented.len()
        );
    }

    if !report.conflicts.is_empty() {
        eprintln!();
        eprintln!("WARNING: Found {} alias conflict(s):", report.conflicts.len());
        for conflict in &report.conflicts {
            eprintln!("  - {conflict}");
        }
        eprintln!();
        bail!("Grammar has ambiguous aliases");
    }

    eprintln!("OK: No alias conflicts");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
