//! Engine error types

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Phase of template processing in which a failure occurred.
///
/// Parsing failures short-circuit before execution; execution failures
/// short-circuit before any output is produced. Either way the caller
/// gets no partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePhase {
    Parse,
    Execute,
}

impl fmt::Display for TemplatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => f.write_str("parse"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

/// Template failure carrying the phase and the offending template source
#[derive(Error, Debug, Diagnostic)]
#[error("template {phase} error: {message}")]
#[diagnostic(code(hydrate::template))]
pub struct TemplateError {
    /// Whether the failure happened while parsing or executing
    pub phase: TemplatePhase,

    /// Error message
    pub message: String,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Underlying engine error (lookup and decode failures hang off its
    /// source chain)
    #[source]
    pub source: minijinja::Error,
}

impl TemplateError {
    /// Wrap a parsing failure
    pub fn parse(err: minijinja::Error, template_source: &str) -> Self {
        Self::from_minijinja(TemplatePhase::Parse, err, template_source)
    }

    /// Wrap an execution failure
    pub fn execute(err: minijinja::Error, template_source: &str) -> Self {
        Self::from_minijinja(TemplatePhase::Execute, err, template_source)
    }

    fn from_minijinja(phase: TemplatePhase, err: minijinja::Error, template_source: &str) -> Self {
        let message = err.to_string();
        let span = err
            .line()
            .and_then(|line| calculate_span(template_source, line));

        Self {
            phase,
            message,
            src: NamedSource::new("document", template_source.to_string()),
            span,
            source: err,
        }
    }

    /// Get the failure phase
    pub fn phase(&self) -> TemplatePhase {
        self.phase
    }

    /// The template source the failure occurred in
    pub fn template_source(&self) -> &str {
        self.src.inner()
    }
}

/// Failure to decode base64 input back to text
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded value is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;
    let mut current_line = 1;

    for line in source.lines() {
        if current_line == line_num {
            return Some(SourceSpan::new(offset.into(), line.len().into()));
        }
        offset += line.len() + 1;
        current_line += 1;
    }

    None
}
