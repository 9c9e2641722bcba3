use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::Path;
use steplang::{repl, runner, Evaluator};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = Command::new("steplang")
        .about("A small scripting language with a step-through debugger")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Step through the script one statement at a time")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILTER")
                .help("Log filter, e.g. 'steplang=trace' (defaults to RUST_LOG, then 'warn')"),
        )
        .get_matches();

    init_tracing(matches.get_one::<String>("log").map(String::as_str));

    let evaluator = Evaluator::new().with_input(runner::stdin_input);

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => {
            run_file(file_path, matches.get_flag("debug"), evaluator).await;
        }
        _ => repl::start(evaluator).await,
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_file(path: &str, debug: bool, evaluator: Evaluator) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        std::process::exit(1);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let filename = path.display().to_string();
    let outcome = if debug {
        runner::debug(&source, Some(&filename), evaluator).await
    } else {
        runner::run(&source, Some(&filename), evaluator).await
    };

    if outcome.is_none() {
        std::process::exit(1);
    }
}
