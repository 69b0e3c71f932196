use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// What happened to one catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Renamed,
    Updated,
    Found,
    Skipped,
    Disowned,
}

impl ChangeType {
    pub fn emoji(&self) -> &'static str {
        match self {
            ChangeType::Created => "✨",
            ChangeType::Renamed => "🔁",
            ChangeType::Updated => "✏️",
            ChangeType::Found => "✅",
            ChangeType::Skipped => "⏭️",
            ChangeType::Disowned => "🚫",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRecord {
    pub name: String,
    pub change: ChangeType,
    pub detail: String,
}

impl ImportRecord {
    pub fn new(name: &str, change: ChangeType, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            change,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ImportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.change.emoji(), self.name, self.detail)
    }
}

/// Everything one import run did, in row order followed by the sweep
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub vendor: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub committed: bool,
    pub records: Vec<ImportRecord>,
}

impl ImportReport {
    pub fn new(vendor: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            committed: false,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ImportRecord) {
        self.records.push(record);
    }

    pub fn count(&self, change: ChangeType) -> usize {
        self.records.iter().filter(|r| r.change == change).count()
    }

    pub fn names_with(&self, change: ChangeType) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.change == change)
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Prints one emoji-prefixed line per record followed by totals.
    pub fn print(&self) {
        for record in &self.records {
            println!("{}", record);
        }
        println!("\n📊 Import results for {}:", self.vendor);
        println!("   Created: {}", self.count(ChangeType::Created));
        println!("   Renamed: {}", self.count(ChangeType::Renamed));
        println!("   Updated: {}", self.count(ChangeType::Updated));
        println!("   Unchanged: {}", self.count(ChangeType::Found));
        println!("   Skipped: {}", self.count(ChangeType::Skipped));
        println!("   Disowned: {}", self.count(ChangeType::Disowned));
        if self.committed {
            println!("✅ Changes committed");
        } else {
            println!("↩️  Changes rolled back (dry run)");
        }
    }
}
