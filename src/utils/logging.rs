//! Optional transcript logging for one-shot asks.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};

pub struct TranscriptLog {
    file_path: Option<String>,
}

impl TranscriptLog {
    /// Create a transcript log. Passing a path verifies it is writable
    /// up front so failures surface at startup rather than mid-stream.
    pub fn new(file_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &file_path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.flush()?;
        }
        Ok(TranscriptLog { file_path })
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    /// Append one entry, preserving its line structure, followed by a
    /// blank spacer line.
    pub fn append(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
