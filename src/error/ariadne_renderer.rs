use std::{ops::Range, sync::Arc};

use colored::Colorize;

use crate::{
    common::sources::SourceMap,
    error::diagnostic::{Diagnostic, DiagnosticRenderer, Label, Severity},
};

type Span = (Arc<str>, Range<usize>);

/// Renders diagnostics using Ariadne backend.
///
/// Diagnostics pointing into files whose text was never loaded (system
/// headers, dumps read from disk) fall back to a single colored line.
#[derive(Debug)]
pub struct AriadneRenderer;

impl AriadneRenderer {
    pub fn new() -> Self {
        Self {}
    }
}

impl DiagnosticRenderer for AriadneRenderer {
    fn show(&self, diag: &Diagnostic, sources: &SourceMap) -> std::io::Result<()> {
        let located = sources.span_of(&diag.pos).and_then(|span| {
            let source = sources.get(&span.0)?.clone();
            Some((span, source))
        });
        match located {
            Some((span, source)) => {
                let filename = span.0.clone();
                let report = build_report(diag, span, sources);
                report.eprint((filename, source))
            }
            None => {
                let head = match diag.severity {
                    Severity::Error => "error".red().bold(),
                    Severity::Warning => "warning".yellow().bold(),
                };
                eprintln!("{}: {}", head, diag);
                for note in &diag.notes {
                    eprintln!("  {} {}", "note:".cyan(), note);
                }
                Ok(())
            }
        }
    }
}

fn build_report<'a>(diag: &Diagnostic, span: Span, sources: &SourceMap) -> ariadne::Report<'a, Span> {
    let kind = match diag.severity {
        Severity::Error => ariadne::ReportKind::Error,
        Severity::Warning => ariadne::ReportKind::Warning,
    };
    let labels: Vec<ariadne::Label<Span>> = if diag.labels.is_empty() {
        vec![ariadne::Label::new(span.clone()).with_message(diag.message.clone())]
    } else {
        diag.labels
            .iter()
            .filter_map(|label| {
                let label_span = sources.span_of(&label.pos)?;
                Some(to_ariadne_label(label, label_span))
            })
            .collect()
    };
    let builder = ariadne::Report::build(kind, span)
        .with_message(format!("{} ({})", diag.message, diag.kind))
        .with_labels(labels);
    diag.notes
        .iter()
        .fold(builder, |b, note| b.with_note(note))
        .finish()
}

fn to_ariadne_label(label: &Label, span: Span) -> ariadne::Label<Span> {
    let color = match label.color {
        colored::Color::Black => ariadne::Color::Black,
        colored::Color::Blue => ariadne::Color::Blue,
        colored::Color::Green => ariadne::Color::Green,
        colored::Color::Red => ariadne::Color::Red,
        colored::Color::Cyan => ariadne::Color::Cyan,
        colored::Color::Magenta => ariadne::Color::Magenta,
        colored::Color::Yellow => ariadne::Color::Yellow,
        colored::Color::White => ariadne::Color::White,
        colored::Color::BrightBlack => ariadne::Color::BrightBlack,
        colored::Color::BrightRed => ariadne::Color::BrightRed,
        colored::Color::BrightGreen => ariadne::Color::BrightGreen,
        colored::Color::BrightYellow => ariadne::Color::BrightYellow,
        colored::Color::BrightBlue => ariadne::Color::BrightBlue,
        colored::Color::BrightMagenta => ariadne::Color::BrightMagenta,
        colored::Color::BrightCyan => ariadne::Color::BrightCyan,
        colored::Color::BrightWhite => ariadne::Color::BrightWhite,
        colored::Color::TrueColor { r, g, b } => ariadne::Color::Rgb(r, g, b),
    };
    ariadne::Label::new(span)
        .with_color(color)
        .with_message(label.msg.clone())
}
