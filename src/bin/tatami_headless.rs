//! Headless terminal runner.
//!
//! Feeds stdin (or a file) through the full parse/execute pipeline and
//! prints the resulting screen snapshot, as plain text or JSON. Useful
//! for golden tests and for poking at escape sequences from the shell.

use std::io::{self, Read};
use std::process::ExitCode;

use tatami_term::Terminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut cols = 80usize;
    let mut rows = 24usize;
    let mut scrollback = 1000usize;
    let mut input_file: Option<String> = None;
    let mut format = OutputFormat::Text;
    let mut show_help = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--cols" => {
                i += 1;
                if i < args.len() {
                    cols = args[i].parse().unwrap_or(80);
                }
            }
            "-r" | "--rows" => {
                i += 1;
                if i < args.len() {
                    rows = args[i].parse().unwrap_or(24);
                }
            }
            "-s" | "--scrollback" => {
                i += 1;
                if i < args.len() {
                    scrollback = args[i].parse().unwrap_or(1000);
                }
            }
            "-f" | "--file" => {
                i += 1;
                if i < args.len() {
                    input_file = Some(args[i].clone());
                }
            }
            "-j" | "--json" => format = OutputFormat::Json,
            "-t" | "--text" => format = OutputFormat::Text,
            "-h" | "--help" => show_help = true,
            other => {
                if input_file.is_none() && !other.starts_with('-') {
                    input_file = Some(other.to_string());
                }
            }
        }
        i += 1;
    }

    if show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let input = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                eprintln!("error reading '{path}': {err}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut data = Vec::new();
            if let Err(err) = io::stdin().read_to_end(&mut data) {
                eprintln!("error reading stdin: {err}");
                return ExitCode::FAILURE;
            }
            data
        }
    };

    let mut terminal = Terminal::new(cols, rows, scrollback);
    terminal.process(&input);

    let snapshot = terminal.snapshot();
    match format {
        OutputFormat::Text => {
            println!("Terminal {}x{}", snapshot.cols, snapshot.rows);
            if !snapshot.title.is_empty() {
                println!("Title: {}", snapshot.title);
            }
            println!(
                "Cursor: ({}, {})  scrollback: {}",
                snapshot.cursor.row, snapshot.cursor.col, snapshot.scrollback_lines
            );
            println!("---");
            print!("{}", snapshot.to_text());
            println!("---");
        }
        OutputFormat::Json => match snapshot.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error serializing snapshot: {err}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn print_help() {
    println!("tatami-headless - run escape sequences through the terminal core");
    println!();
    println!("Usage: tatami-headless [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>        Terminal width (default: 80)");
    println!("  -r, --rows <N>        Terminal height (default: 24)");
    println!("  -s, --scrollback <N>  Scrollback capacity (default: 1000)");
    println!("  -f, --file <PATH>     Read input from a file");
    println!("  -j, --json            Print the snapshot as JSON");
    println!("  -t, --text            Print the snapshot as text (default)");
    println!("  -h, --help            Show this help");
    println!();
    println!("Reads stdin when no input file is given.");
    println!();
    println!("Examples:");
    println!("  printf 'Hello \\x1b[31mred\\x1b[0m' | tatami-headless");
    println!("  tatami-headless -c 120 -r 40 session.bin");
    println!("  tatami-headless --json < capture.bin > snapshot.json");
}
