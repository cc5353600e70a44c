//! # Duet CLI
//!
//! Runs register machine programs under one of the VM hosts.
//!
//! Usage:
//!   duet sound <file>
//!   duet duet <file>
//!   duet coprocessor <file> [--set a=1]...
//!   duet registers <file>
//!   duet decode <file>
//!   duet schema [--json]
//!
//! `<file>` may be `-` to read the program from stdin. Answers go to stdout,
//! logs and errors to stderr.

use clap::{Parser, Subcommand};
use duet_vm::{
    recover, run_conditional, run_coprocessor, run_duet, ConditionalProgram, Error,
    InstructionSchema, Program, Register, RegisterFile, Result, VmConfig, DEFAULT_MAX_STEPS,
};
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet")]
#[command(author, version, about = "Duet - a register machine with pluggable hosts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Upper bound on executed steps (duet: scheduler ticks)
    #[arg(long, global = true, env = "DUET_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: u64,

    /// Print the full outcome as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output (debug logs and execution counts)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only print the answer
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play sounds until the first recover fires
    Sound {
        /// Program file, or `-` for stdin
        file: String,
    },
    /// Run two copies of a program that exchange values until they deadlock
    Duet {
        /// Program file, or `-` for stdin
        file: String,
    },
    /// Run a program without I/O and count multiplications
    Coprocessor {
        /// Program file, or `-` for stdin
        file: String,

        /// Seed a register before running, e.g. `--set a=1`
        #[arg(long = "set", value_name = "REG=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, i64)>,
    },
    /// Run a conditional `inc`/`dec` program
    Registers {
        /// Program file, or `-` for stdin
        file: String,
    },
    /// Decode a program and print it as JSON
    Decode {
        /// Program file, or `-` for stdin
        file: String,
    },
    /// Show the instruction set
    Schema,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected REG=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing register name in '{}'", s));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid value in '{}': {}", s, e))?;
    Ok((name.to_string(), value))
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(file: &str) -> Result<String> {
    if file == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| Error::from(e).with_operation("cli::read_stdin"))?;
        return Ok(text);
    }
    std::fs::read_to_string(file).map_err(|e| {
        Error::from(e)
            .with_operation("cli::read_source")
            .with_context("path", file)
    })
}

fn load_program(file: &str) -> Result<Program> {
    let text = read_source(file)?;
    Program::parse(&text).map_err(|e| e.with_context("path", file))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::unexpected("failed to serialize output").set_source(e))
}

fn print_optional(label: &str, value: Option<i64>, quiet: bool) {
    let rendered = value.map_or_else(|| "none".to_string(), |v| v.to_string());
    if quiet {
        println!("{}", rendered);
    } else {
        println!("{}: {}", label, rendered);
    }
}

fn print_answer(label: &str, value: impl std::fmt::Display, quiet: bool) {
    if quiet {
        println!("{}", value);
    } else {
        println!("{}: {}", label, value);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = VmConfig::new().with_max_steps(cli.max_steps);
    tracing::debug!(max_steps = config.max_steps, json = cli.json, "cli configured");

    match cli.command {
        Commands::Sound { file } => {
            let program = load_program(&file)?;
            let recovery = recover(&program, &config)?;
            if cli.json {
                println!("{}", to_json(&recovery)?);
            } else {
                print_answer("recovered", recovery.frequency, cli.quiet);
                if cli.verbose {
                    eprintln!("steps: {}, trap at pc {}", recovery.steps, recovery.pc);
                }
            }
        }
        Commands::Duet { file } => {
            let program = load_program(&file)?;
            let outcome = run_duet(&program, &config)?;
            if cli.json {
                println!("{}", to_json(&outcome)?);
            } else {
                print_answer("program 1 sent", outcome.sent_by_program_one(), cli.quiet);
                if cli.verbose {
                    eprintln!("deadlock after {} ticks, sent: {:?}", outcome.ticks, outcome.sent);
                }
            }
        }
        Commands::Coprocessor { file, set } => {
            let program = load_program(&file)?;
            let registers: RegisterFile = set
                .into_iter()
                .map(|(name, value)| (Register::new(name), value))
                .collect();
            let run = run_coprocessor(&program, registers, &config)?;
            if cli.json {
                println!("{}", to_json(&run)?);
            } else {
                print_answer("mul executed", run.multiplications(), cli.quiet);
                if cli.verbose {
                    for (op, count) in run.stats.iter() {
                        eprintln!("  {}: {}", op, count);
                    }
                    for (register, value) in run.registers.iter() {
                        eprintln!("  {} = {}", register, value);
                    }
                }
            }
        }
        Commands::Registers { file } => {
            let text = read_source(&file)?;
            let program =
                ConditionalProgram::parse(&text).map_err(|e| e.with_context("path", file.as_str()))?;
            let run = run_conditional(&program)?;
            if cli.json {
                println!("{}", to_json(&run)?);
            } else {
                print_optional("largest final", run.largest_final(), cli.quiet);
                print_optional("highest ever", run.highest_ever, cli.quiet);
            }
        }
        Commands::Decode { file } => {
            let program = load_program(&file)?;
            println!("{}", to_json(&program)?);
        }
        Commands::Schema => {
            let schema = InstructionSchema::new();
            if cli.json {
                println!("{}", schema.to_json());
            } else {
                print!("{}", schema.to_text());
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let verbose = cli.verbose;

    if let Err(e) = run(cli) {
        if verbose {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
