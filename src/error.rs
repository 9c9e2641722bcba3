use crate::lexer::{Position, Token};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    RuntimeError,
}

impl ErrorKind {
    fn color(self) -> Color {
        match self {
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        }
    }
}

/// A structural problem found while parsing. The parser collects these
/// instead of stopping, so a program can carry several.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
    pub width: usize,
}

impl ParseError {
    pub fn at_token(message: String, token: &Token) -> Self {
        Self {
            message,
            position: token.position,
            width: token.width(),
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");
        let kind = ErrorKind::ParseError;
        let color = kind.color();

        let length = source.chars().count();
        let end = (self.position.offset + self.width).min(length);
        let start = self.position.offset.min(end);

        let result = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", kind.title().fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish()
            .print((filename, Source::from(source)));

        if let Err(error) = result {
            tracing::warn!(%error, "failed to render parse diagnostic");
        }
    }
}

pub fn report_parse_errors(errors: &[ParseError], source: &str, filename: Option<&str>) {
    for error in errors {
        error.report(source, filename);
    }
}

/// Runtime errors are values without a source location, so the report is
/// header-only.
pub fn report_runtime_error(message: &str, source: &str, filename: Option<&str>) {
    let filename = filename.unwrap_or("<repl>");
    let kind = ErrorKind::RuntimeError;

    let result = Report::<(&str, std::ops::Range<usize>)>::build(ReportKind::Error, filename, 0)
        .with_message(format!("{}: {}", kind.title().fg(kind.color()), message))
        .finish()
        .print((filename, Source::from(source)));

    if let Err(error) = result {
        tracing::warn!(%error, "failed to render runtime diagnostic");
    }
}
