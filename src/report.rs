//! Report framing shared with the downstream response parser.
//!
//! Every operation produces exactly one block:
//!
//! ```text
//! BEGIN OUTPUT from <Operation>(<name> = <value>, ...):
//! <content lines>
//! ERROR: <message>        (only for soft failures)
//! END OUTPUT
//!
//! ```

use crate::error::QueryMiss;
use std::fmt::Display;
use std::io::{self, Write};

pub const BEGIN_PREFIX: &str = "BEGIN OUTPUT from ";
pub const END_MARKER: &str = "END OUTPUT";
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Writes framed operation output to a sink. Not meant for concurrent
/// writers: a `Frame` holds the sink mutably until it is closed.
#[derive(Debug)]
pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn begin(
        &mut self,
        operation: &str,
        args: &[(&str, &dyn Display)],
    ) -> io::Result<Frame<'_, W>> {
        writeln!(self.out, "{}", begin_line(operation, args))?;
        Ok(Frame { out: &mut self.out })
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn begin_line(operation: &str, args: &[(&str, &dyn Display)]) -> String {
    let rendered = args
        .iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{BEGIN_PREFIX}{operation}({rendered}):")
}

/// An open output block. Close it with [`Frame::close`].
#[must_use = "an open frame must be closed to emit its end marker"]
pub struct Frame<'a, W: Write> {
    out: &'a mut W,
}

impl<W: Write> Frame<'_, W> {
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// Writes `text` byte-for-byte, adding a line break only when it does
    /// not already end with one.
    pub fn verbatim(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') && !text.ends_with('\r') {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Emits the optional `ERROR:` line and the end marker. A hard error
    /// still closes the block before it is handed back to the caller.
    pub fn close(self, outcome: anyhow::Result<Result<(), QueryMiss>>) -> anyhow::Result<()> {
        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(miss)) => {
                tracing::debug!(%miss, "operation finished with a soft error");
                writeln!(self.out, "{ERROR_PREFIX}{miss}")?;
                Ok(())
            }
            Err(err) => Err(err),
        };
        writeln!(self.out, "{END_MARKER}")?;
        writeln!(self.out)?;
        self.out.flush()?;
        result
    }
}

/// One parsed output block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub operation: String,
    /// Text between `BEGIN OUTPUT from ` and the trailing `:`.
    pub invocation: String,
    pub lines: Vec<String>,
    pub error: Option<String>,
}

/// Splits a report stream back into blocks. Text outside a block is
/// skipped; a block cut off before its end marker is dropped.
pub fn parse_sections(report: &str) -> Vec<ReportSection> {
    let mut sections = Vec::new();
    let mut current: Option<ReportSection> = None;
    for line in report.lines() {
        if let Some(mut section) = current.take() {
            if line == END_MARKER {
                sections.push(finish_section(section));
            } else {
                section.lines.push(line.to_string());
                current = Some(section);
            }
            continue;
        }
        let Some(header) = line.strip_prefix(BEGIN_PREFIX) else {
            continue;
        };
        let Some(invocation) = header.strip_suffix(':') else {
            continue;
        };
        let operation = invocation
            .split('(')
            .next()
            .unwrap_or(invocation)
            .to_string();
        current = Some(ReportSection {
            operation,
            invocation: invocation.to_string(),
            lines: Vec::new(),
            error: None,
        });
    }
    sections
}

fn finish_section(mut section: ReportSection) -> ReportSection {
    let error = section
        .lines
        .last()
        .and_then(|last| last.strip_prefix(ERROR_PREFIX))
        .map(str::to_string);
    if error.is_some() {
        section.lines.pop();
        section.error = error;
    }
    section
}
