// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Summary Output

use std::io::{self, Write};

use crate::types::SummaryRow;

/// Every record goes to the file sink; every N-th also to stdout.
pub const STDOUT_OUTPUT_RATE: u64 = 1;

/// Stdout reprints the header every 25 × STDOUT_OUTPUT_RATE records, the
/// file sink every 500.
const STDOUT_HEADER_EVERY: u64 = 25 * STDOUT_OUTPUT_RATE;
const FILE_HEADER_EVERY: u64 = 500;

const HEADER: &str = "\n#Time\t\tEntities\tFollows\t\tTweets\t\tRetweets\n\n";

/// One tab-separated snapshot line, time at two decimals.
pub fn format_row(row: &SummaryRow) -> String {
    format!(
        "{:.2}\t\t{}\t\t{}\t\t{}\t\t{}\t\n",
        row.time, row.n_entities, row.n_follows, row.n_tweets, row.n_retweets
    )
}

/// Routes summary rows to up to two sinks with their respective header
/// cadences. Sinks are plain writers so tests can capture exact bytes.
pub struct SummaryRouter {
    n_outputs: u64,
    stdout: Option<Box<dyn Write>>,
    file: Option<Box<dyn Write>>,
}

impl SummaryRouter {
    pub fn new(stdout: Option<Box<dyn Write>>, file: Option<Box<dyn Write>>) -> Self {
        Self {
            n_outputs: 0,
            stdout,
            file,
        }
    }

    /// A router that swallows everything.
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    pub fn record(&mut self, row: &SummaryRow) -> io::Result<()> {
        let line = format_row(row);
        if let Some(out) = &mut self.stdout {
            if self.n_outputs % STDOUT_HEADER_EVERY == 0 {
                out.write_all(HEADER.as_bytes())?;
            }
        }
        if let Some(file) = &mut self.file {
            if self.n_outputs % FILE_HEADER_EVERY == 0 {
                file.write_all(HEADER.as_bytes())?;
            }
            file.write_all(line.as_bytes())?;
        }
        if let Some(out) = &mut self.stdout {
            if self.n_outputs % STDOUT_OUTPUT_RATE == 0 {
                out.write_all(line.as_bytes())?;
            }
        }
        self.n_outputs += 1;
        Ok(())
    }

    pub fn n_outputs(&self) -> u64 {
        self.n_outputs
    }
}

impl std::fmt::Debug for SummaryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryRouter")
            .field("n_outputs", &self.n_outputs)
            .field("stdout", &self.stdout.is_some())
            .field("file", &self.file.is_some())
            .finish()
    }
}
