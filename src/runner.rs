use crate::ast::Program;
use crate::builtins::{HostValue, InputFuture};
use crate::debugger::{Checkpoint, SessionState};
use crate::environment::Environment;
use crate::error::{report_parse_errors, report_runtime_error, ParseError};
use crate::evaluator::Evaluator;
use crate::parser::parse;
use crate::value::Value;
use std::io::{self, Write};

/// Parse and evaluate against an existing environment. Parse errors keep the
/// program from running at all.
pub async fn evaluate(
    source: &str,
    evaluator: &mut Evaluator,
    env: &Environment,
) -> Result<Value, Vec<ParseError>> {
    let (program, errors) = parse(source);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(evaluator.eval_program(&program, env).await)
}

/// Run a whole script, reporting diagnostics. Returns the program value when
/// it parsed and did not end in an error.
pub async fn run(source: &str, filename: Option<&str>, mut evaluator: Evaluator) -> Option<Value> {
    let env = Environment::new();
    match evaluate(source, &mut evaluator, &env).await {
        Ok(Value::Error(message)) => {
            report_runtime_error(&message, source, filename);
            None
        }
        Ok(value) => Some(value),
        Err(errors) => {
            report_parse_errors(&errors, source, filename);
            None
        }
    }
}

enum StepCommand {
    Step,
    Continue,
    Quit,
}

/// Interactive stepping: Enter steps, `c` runs to the end, `q` stops.
pub async fn debug(source: &str, filename: Option<&str>, evaluator: Evaluator) -> Option<Value> {
    let program = parse_or_report(source, filename)?;
    let mut session = evaluator.debug(&program, Environment::new());

    while let Some(checkpoint) = session.next().await {
        print_checkpoint(&checkpoint);
        match prompt_step().await {
            StepCommand::Step => {}
            StepCommand::Continue => {
                session.run_to_end().await;
                break;
            }
            StepCommand::Quit => {
                session.cancel();
                break;
            }
        }
    }

    match (session.state(), session.result()) {
        (SessionState::Completed, Some(Value::Error(message))) => {
            report_runtime_error(message, source, filename);
            None
        }
        (SessionState::Completed, Some(value)) => Some(value.clone()),
        _ => {
            println!("(stopped)");
            None
        }
    }
}

fn parse_or_report(source: &str, filename: Option<&str>) -> Option<Program> {
    let (program, errors) = parse(source);
    if errors.is_empty() {
        Some(program)
    } else {
        report_parse_errors(&errors, source, filename);
        None
    }
}

fn print_checkpoint(checkpoint: &Checkpoint) {
    println!("[{}] {}", checkpoint.position(), checkpoint.node);
    for (name, value) in checkpoint.env.visible_bindings() {
        println!("    {} = {}", name, value);
    }
}

async fn prompt_step() -> StepCommand {
    print!("(step) ");
    if let Err(error) = io::stdout().flush() {
        tracing::warn!(%error, "failed to flush prompt");
    }

    match read_stdin_line().await {
        None => StepCommand::Quit,
        Some(line) => match line.trim() {
            "c" | "continue" => StepCommand::Continue,
            "q" | "quit" => StepCommand::Quit,
            _ => StepCommand::Step,
        },
    }
}

/// Read one line without blocking the evaluator's runtime thread.
pub(crate) async fn read_stdin_line() -> Option<String> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(error) => {
                tracing::warn!(%error, "failed to read stdin");
                None
            }
        }
    })
    .await;

    line.ok().flatten()
}

/// Input callback backed by stdin, one line per `Input()` call.
pub fn stdin_input() -> InputFuture {
    Box::pin(async {
        let line = read_stdin_line().await?;
        Some(parse_host_input(&line))
    })
}

/// Interpret a line typed by the user as the closest primitive.
pub fn parse_host_input(line: &str) -> HostValue {
    let text = line.trim_end_matches(['\r', '\n']);
    let trimmed = text.trim();

    let numeric = !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
    if numeric {
        if let Ok(n) = trimmed.parse::<f64>() {
            return HostValue::Number(n);
        }
    }

    match trimmed {
        "true" => HostValue::Boolean(true),
        "false" => HostValue::Boolean(false),
        _ => HostValue::String(text.to_string()),
    }
}
