use std::ops::Range;

use crate::error::{ConvertError, LoadError};

/// A diagnostic pointing into a model file.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: String, span: Range<usize>) -> Self {
        Self {
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Build a diagnostic for a JSON syntax error, if `err` is one.
    ///
    /// Returns the diagnostic and the file text it points into.
    pub fn from_error(err: &ConvertError) -> Option<(Self, &str)> {
        let source = match err.root() {
            ConvertError::ModelLoad { source, .. } => source,
            _ => return None,
        };
        let LoadError::Syntax { error, text } = source else {
            return None;
        };
        let start = byte_offset(text, error.line(), error.column());
        let end = (start + 1).min(text.len()).max(start);
        let diag = Diagnostic::error(error.to_string(), start..end)
            .with_note(format!("line {}, column {}", error.line(), error.column()))
            .with_help("model files must be JSON exports of a fitted estimator or pipeline".to_string());
        Some((diag, text.as_str()))
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) -> std::io::Result<()> {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let span = char_span(source, &self.span);
        let mut report = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, span))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report.finish().eprint((filename, Source::from(source)))
    }
}

/// Convert a byte range into the char range ariadne's `Source` indexes by.
pub fn char_span(text: &str, bytes: &Range<usize>) -> Range<usize> {
    let to_char = |b: usize| {
        let b = b.min(text.len());
        let b = (0..=b).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text[..b].chars().count()
    };
    to_char(bytes.start)..to_char(bytes.end)
}

/// Byte offset of a 1-based line and column, clamped to the text.
pub fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, l) in text.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return (offset + column.saturating_sub(1)).min(text.len());
        }
        offset += l.len();
    }
    text.len()
}
