//! porsa CLI: rule-based Persian question answering.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use porsa::engine::{Engine, EngineConfig};
use porsa::graph::NodeId;
use porsa::seeds;

#[derive(Parser)]
#[command(name = "porsa", version, about = "Rule-based Persian question answering")]
struct Cli {
    /// Load a knowledge pack from a TOML file instead of the bundled one.
    #[arg(long, global = true)]
    pack: Option<PathBuf>,

    /// Reasoning step budget per question (3 to 5).
    #[arg(long, global = true, default_value = "3")]
    max_steps: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question and exit.
    Ask {
        /// The question, in Persian.
        question: String,

        /// Print the full answer as JSON.
        #[arg(long)]
        json: bool,

        /// Print the reasoning path.
        #[arg(long)]
        trace: bool,
    },

    /// Interactive session: answer questions until EOF or `:quit`.
    Repl,

    /// Show engine info and statistics.
    Info,

    /// Export the knowledge graph as JSON.
    Export,
}

fn build_engine(cli: &Cli) -> Result<Engine> {
    let config = EngineConfig {
        max_reasoning_steps: cli.max_steps,
        ..Default::default()
    };
    let engine = match &cli.pack {
        Some(path) => {
            let pack = seeds::load(path).into_diagnostic()?;
            Engine::with_pack(config, pack).into_diagnostic()?
        }
        None => Engine::new(config).into_diagnostic()?,
    };
    Ok(engine)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Ask {
            question,
            json,
            trace,
        } => {
            let engine = build_engine(&cli)?;
            let answer = engine.process_question(question).into_diagnostic()?;

            if *json {
                let out = serde_json::to_string_pretty(&answer).into_diagnostic()?;
                println!("{out}");
            } else {
                println!("{}", answer.text);
                println!();
                println!("confidence: {:.2}", answer.confidence);
                println!("domain:     {}", answer.domain);
                if *trace {
                    println!("\nreasoning path:");
                    for line in &answer.reasoning_path {
                        println!("  {line}");
                    }
                }
            }
        }

        Commands::Repl => {
            let engine = build_engine(&cli)?;
            repl(&engine)?;
        }

        Commands::Info => {
            let engine = build_engine(&cli)?;
            println!("{}", engine.info());
        }

        Commands::Export => {
            let engine = build_engine(&cli)?;
            let export = engine.export_graph();
            let json = serde_json::to_string_pretty(&export).into_diagnostic()?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Interactive loop. Lines starting with `:` are session commands,
/// everything else is a question.
fn repl(engine: &Engine) -> Result<()> {
    println!("porsa interactive session.");
    println!("Persian questions, or :info, :history, :learn <from> <to>, :quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("? ");
        stdout.flush().into_diagnostic()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(':') {
            if !run_session_command(engine, rest) {
                break;
            }
            continue;
        }

        match engine.process_question(line) {
            Ok(answer) => {
                println!("{}", answer.text);
                println!("  (confidence {:.2}, domain {})", answer.confidence, answer.domain);
            }
            Err(e) => println!("error: {e}"),
        }
    }
    Ok(())
}

/// Handle a `:command` line. Returns false when the session should end.
fn run_session_command(engine: &Engine, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") | Some("q") => return false,
        Some("info") => println!("{}", engine.info()),
        Some("history") => {
            let records = engine.history().snapshot();
            if records.is_empty() {
                println!("No questions answered yet.");
            } else {
                println!("History ({}):", records.len());
                for (i, record) in records.iter().enumerate() {
                    println!(
                        "  {}. {} ({:.2}, {}) {}",
                        i + 1,
                        record.intent,
                        record.confidence,
                        record.domain,
                        record.question
                    );
                }
            }
        }
        Some("learn") => match (parts.next(), parts.next()) {
            (Some(from), Some(to)) => {
                let from = NodeId::from(from);
                let to = NodeId::from(to);
                if engine.record_outcome(&from, &to) {
                    let weight = engine.graph().edge_weight(&from, &to).unwrap_or(0.0);
                    println!("Reinforced {from} -> {to} (weight now {weight:.2})");
                } else {
                    println!("No edge {from} -> {to}; nothing reinforced.");
                }
            }
            _ => println!("usage: :learn <from> <to>"),
        },
        _ => println!("unknown command; try :info, :history, :learn, :quit"),
    }
    true
}
