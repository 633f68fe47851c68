//! Byte-size accounting for batch conversions.
//!
//! Every tool reports how much smaller (or larger) its output is than its
//! input, per item and for the whole run.

use serde::{Deserialize, Serialize};

/// Input and output size of a single converted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeChange {
    /// Input size in bytes.
    pub original: u64,
    /// Output size in bytes.
    pub new: u64,
}

impl SizeChange {
    pub fn new(original: u64, new: u64) -> Self {
        Self { original, new }
    }

    /// Bytes saved (negative when the output grew).
    pub fn saved_bytes(&self) -> i64 {
        self.original as i64 - self.new as i64
    }

    /// Savings as a percentage of the original size.
    ///
    /// `None` for an empty original, where a percentage is meaningless.
    pub fn savings_percent(&self) -> Option<f64> {
        savings_percent(self.original, self.new)
    }
}

/// Running totals for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTally {
    /// Items converted successfully.
    pub processed: u64,
    /// Items that failed to convert.
    pub failed: u64,
    /// Items that were skipped (e.g. missing input).
    pub skipped: u64,
    /// Sum of input sizes over processed items.
    pub total_original: u64,
    /// Sum of output sizes over processed items.
    pub total_new: u64,
}

impl BatchTally {
    pub fn record(&mut self, change: &SizeChange) {
        self.processed += 1;
        self.total_original += change.original;
        self.total_new += change.new;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Aggregate savings; `None` when no input bytes were recorded.
    pub fn total_savings_percent(&self) -> Option<f64> {
        savings_percent(self.total_original, self.total_new)
    }

    /// Total items seen, whatever their outcome.
    pub fn attempted(&self) -> u64 {
        self.processed + self.failed + self.skipped
    }
}

fn savings_percent(original: u64, new: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    Some((original as f64 - new as f64) / original as f64 * 100.0)
}

/// Format a byte count as kilobytes with one decimal, e.g. `12.3KB`.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.1}KB", bytes as f64 / 1024.0)
}

/// Format a byte count as megabytes with two decimals, e.g. `1.23 MB`.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
