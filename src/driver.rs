//! Parse Driver (spec §4.6) at the whole-stream level: turns a sequence of
//! raw lines into mined records, skipping any that don't match the
//! configured log format without assigning them a `LineId` (spec §7
//! *FormatMismatch*).
//!
//! Grounded in the original Python `LogParser.parse()`'s per-line loop
//! (`original_source/.../drain.py`) and the teacher's demo binaries, which
//! drive `TemplateMiner` over a `BufRead::lines()` iterator.

use std::io::{self, BufRead};

use crate::drain::Drain;
use crate::error::DrainError;
use crate::format::LogFormat;
use crate::output::{MinedRecord, OutputAssembler};
use crate::store::{EventTemplateTable, LogStore, StructuredLogTable};
use crate::template_miner::TemplateMiner;

pub struct ParseDriver {
    format: LogFormat,
    miner: TemplateMiner,
    next_line_id: usize,
    records: Vec<MinedRecord>,
}

impl ParseDriver {
    pub fn new(format: LogFormat, miner: TemplateMiner) -> Self {
        Self {
            format,
            miner,
            next_line_id: 1,
            records: Vec::new(),
        }
    }

    /// Parses and mines one raw line. A line that doesn't match the
    /// configured format is logged and dropped; it never consumes a
    /// `LineId` and never reaches the Drain tree.
    pub fn process_line(&mut self, line: &str) {
        let Some(fields) = self.format.parse(line) else {
            log::debug!("line did not match the configured log format, skipping: {line}");
            return;
        };

        let line_id = self.next_line_id;
        self.next_line_id += 1;

        let content = fields
            .iter()
            .find(|(k, _)| k == "Content")
            .map(|(_, v)| v.as_str())
            .unwrap_or("");
        let (cluster_idx, _update_type) = self.miner.add_log_message(line_id, content);

        self.records.push(MinedRecord {
            line_id,
            fields,
            cluster_idx,
        });
    }

    /// Feeds every line from `reader` through [`process_line`].
    pub fn process_lines<R: BufRead>(&mut self, reader: R) -> io::Result<()> {
        for line in reader.lines() {
            self.process_line(&line?);
        }
        Ok(())
    }

    pub fn drain(&self) -> &Drain {
        self.miner.drain()
    }

    pub fn records(&self) -> &[MinedRecord] {
        &self.records
    }

    /// Runs the Output Assembler over everything mined so far.
    pub fn finish<S: LogStore<EventTemplateTable>>(
        &self,
        assembler: &mut OutputAssembler,
        event_store: &mut S,
    ) -> Result<StructuredLogTable, DrainError> {
        assembler.assemble(&self.records, self.drain(), event_store)
    }
}
