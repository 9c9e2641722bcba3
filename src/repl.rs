use crate::environment::Environment;
use crate::error::{report_parse_errors, report_runtime_error};
use crate::evaluator::Evaluator;
use crate::runner::{evaluate, read_stdin_line};
use crate::value::Value;
use std::io::{self, Write};

/// Interactive loop. Bindings and functions persist between lines.
pub async fn start(mut evaluator: Evaluator) {
    println!("steplang v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+C to quit");
    println!();

    let env = Environment::new();

    loop {
        print!("> ");
        if let Err(error) = io::stdout().flush() {
            tracing::warn!(%error, "failed to flush prompt");
        }

        let line = match read_stdin_line().await {
            Some(line) => line,
            None => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            println!("Goodbye!");
            break;
        }

        match evaluate(line, &mut evaluator, &env).await {
            Ok(Value::Error(message)) => report_runtime_error(&message, line, None),
            Ok(Value::Null) => {}
            Ok(value) => println!("{}", value),
            Err(errors) => report_parse_errors(&errors, line, None),
        }
    }
}
