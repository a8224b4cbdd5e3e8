use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Source position of a token or node. Both fields are 1-based; columns
/// count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Character offset of this position inside `source`, clamped to the
    /// end of the text.
    pub fn offset_in(&self, source: &str) -> usize {
        let mut line = 1;
        let mut column = 1;
        for (offset, c) in source.chars().enumerate() {
            if line == self.line && column == self.column {
                return offset;
            }
            if c == '\n' {
                if line == self.line {
                    return offset;
                }
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        source.chars().count()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

/// The file an error belongs to when it was raised inside an imported module.
/// `source` is absent for modules loaded from serialized IR.
#[derive(Debug, Clone)]
pub struct Origin {
    pub name: String,
    pub source: Option<Rc<str>>,
}

#[derive(Debug, Clone)]
pub struct MmtError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
    pub origin: Option<Origin>,
}

impl MmtError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
            origin: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
            origin: None,
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, span, message)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError, span, message, help)
    }

    /// Attaches the file the error was raised in, unless a more specific
    /// origin was already recorded further down the import chain.
    pub fn with_origin(mut self, name: &str, source: Option<Rc<str>>) -> Self {
        if self.origin.is_none() {
            self.origin = Some(Origin {
                name: name.to_string(),
                source,
            });
        }
        self
    }

    fn kind_str(&self) -> &'static str {
        match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        }
    }

    /// Prints the error to stderr. `source` and `filename` describe the
    /// program that was started; errors from imported modules use their own
    /// recorded origin instead.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let (filename, source) = match &self.origin {
            Some(Origin {
                name,
                source: Some(text),
            }) => (name.as_str(), text.as_ref()),
            Some(Origin { name, source: None }) => {
                eprintln!("{}:{}:{}: {}: {}", name, self.span.line, self.span.column, self.kind_str(), self.message);
                if let Some(help) = &self.help {
                    eprintln!("  help: {}", help);
                }
                return;
            }
            None => (filename.unwrap_or("<input>"), source),
        };

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        };

        let offset = self.span.offset_in(source);
        let mut report_builder = Report::build(ReportKind::Error, filename, offset)
            .with_message(format!(
                "{}: {} ({})",
                self.kind_str().fg(color),
                self.message,
                self.span
            ))
            .with_label(
                Label::new((filename, offset..offset + 1))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder = report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if report_builder
            .finish()
            .eprint((filename, Source::from(source)))
            .is_err()
        {
            eprintln!("{}: {}: {}", filename, self.span, self.message);
        }
    }
}

impl fmt::Display for MmtError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MmtError {}

/// Anything that stops evaluation before the program runs to completion:
/// a fatal error, or an explicit request to end the program.
#[derive(Debug)]
pub enum Unwind {
    Error(MmtError),
    Exit,
}

impl From<MmtError> for Unwind {
    fn from(error: MmtError) -> Self {
        Unwind::Error(error)
    }
}
