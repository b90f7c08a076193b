use crate::report::{ReportSection, parse_sections};
use anyhow::Result;

/// Strategy hook for the agent loop around a session: it sees only the text
/// report, one parsed block at a time, never the session itself.
pub trait ReportConsumer {
    fn consume(&mut self, section: &ReportSection) -> Result<()>;

    /// Called once after every block of a report has been consumed.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Feeds each complete block of `report` to `consumer`, returning how many
/// blocks were delivered.
pub fn dispatch_report(report: &str, consumer: &mut dyn ReportConsumer) -> Result<usize> {
    let sections = parse_sections(report);
    for section in &sections {
        consumer.consume(section)?;
    }
    consumer.finish()?;
    Ok(sections.len())
}

/// Collects the soft errors reported by each block, keyed by operation.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    pub errors: Vec<(String, String)>,
}

impl ReportConsumer for ErrorCollector {
    fn consume(&mut self, section: &ReportSection) -> Result<()> {
        if let Some(message) = &section.error {
            self.errors.push((section.operation.clone(), message.clone()));
        }
        Ok(())
    }
}
