use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use common::models::SignalRecord;
use tokio::sync::Mutex;

const HEADER_RULE: &str =
    "==================================================";

/// Append-only human-readable side-channel log. One block per accepted
/// signal, grouped under a date header that is emitted only when the date
/// changes relative to the last written block.
pub struct SignalFileWriter {
    path: PathBuf,
    last_date: Mutex<Option<String>>,
}

impl SignalFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_date = last_date_in_file(&path);
        Self {
            path,
            last_date: Mutex::new(last_date),
        }
    }

    pub async fn append(&self, record: &SignalRecord) -> std::io::Result<()> {
        let mut last_date = self.last_date.lock().await;

        let mut block = String::new();
        if last_date.as_deref() != Some(record.date.as_str()) {
            let existing = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
            if existing > 0 {
                block.push_str("\n\n");
            }
            block.push_str(&format!(
                "{}\n📅 {}\n{}\n\n",
                HEADER_RULE, record.date, HEADER_RULE
            ));
        }

        block.push_str(&format!("⏰ {} | 📍 {}\n", record.timestamp, record.channel));
        block.push_str(&format!(
            "💱 {} | {}\n",
            record.pair.as_deref().unwrap_or("N/A"),
            record.direction.map(|d| d.glyph()).unwrap_or("N/A")
        ));
        block.push_str(&format!(
            "Entry: {} | SL: {}\n",
            record.entry.as_deref().unwrap_or("N/A"),
            record.sl.as_deref().unwrap_or("N/A")
        ));

        let tps = record.populated_tps();
        if !tps.is_empty() {
            block.push_str(&format!("TP: {}\n", tps.join(" | ")));
        }
        block.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;

        *last_date = Some(record.date.clone());
        Ok(())
    }
}

fn last_date_in_file(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    content
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("📅 "))
        .map(str::to_string)
}
