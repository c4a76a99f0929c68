use crate::domain::subscription::SubscriptionRecord;
use crate::error::Result;
use std::io::Write;

/// Writes final subscription records as CSV.
///
/// Output is one row per principal with the wire spellings of tier and
/// status; the sync timestamp is omitted so replay output stays comparable
/// across runs.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_records(&mut self, records: Vec<SubscriptionRecord>) -> Result<()> {
        self.writer
            .write_record(["principal", "tier", "status", "version", "external_id"])?;
        for record in records {
            self.writer.write_record([
                record.principal.as_str(),
                &record.tier.to_string(),
                &record.status.to_string(),
                &record.version.to_string(),
                record.external_subscription_id.as_deref().unwrap_or(""),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
