//! Asynchronous scenario reader with batch interface
//!
//! Streams session commands from a CSV scenario. Rows are read lazily in batches,
//! so memory stays flat however long the scenario is.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of (line, SessionCommand)
//!                  ↓
//!           csv_format module
//!           (CommandRecord, convert_command_record)
//! ```

use crate::io::csv_format::{CommandRecord, SessionCommand, convert_command_record};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Command paired with the CSV line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioStep {
    pub line: u64,
    pub command: SessionCommand,
}

/// Asynchronous CSV reader over a scenario file
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    /// Rows that failed to parse or convert so far
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` commands
    ///
    /// Rows that fail to parse or convert are logged with `tracing::warn!` and
    /// skipped. Returns an empty vector at the end of the file.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<ScenarioStep> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize_with_pos::<CommandRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some((Ok(record), pos)) => match convert_command_record(record) {
                    Ok(command) => batch.push(ScenarioStep {
                        line: pos.line(),
                        command,
                    }),
                    Err(error) => {
                        warn!(line = pos.line(), %error, "skipping scenario row");
                        self.skipped += 1;
                    }
                },
                Some((Err(error), pos)) => {
                    warn!(line = pos.line(), %error, "unparseable scenario row");
                    self.skipped += 1;
                }
                None => break,
            }
        }

        batch
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
