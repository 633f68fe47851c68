pub mod check;
pub mod config;
pub mod fonts;
pub mod resize;
pub mod thumbs;
pub mod type_text;
pub mod variants;

use std::path::{Path, PathBuf};

use webprep_common::config::config_file_path;
use webprep_common::size::{format_kb, format_mb, BatchTally, SizeChange};
use webprep_imaging::{BatchEvent, ItemOutcome};

const RULE_WIDTH: usize = 50;

/// The config file in effect: `--config` when given, else the standard path.
pub(crate) fn config_location(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

pub(crate) fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub(crate) fn banner(title: &str) {
    println!("{}", rule());
    println!("{title}");
    println!("{}", rule());
}

/// `12.0KB → 3.1KB (74.2% saved)`
pub(crate) fn describe_change(change: &SizeChange, verb: &str) -> String {
    let percent = change
        .savings_percent()
        .map(|p| format!("{p:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} → {} ({percent} {verb})",
        format_kb(change.original),
        format_kb(change.new)
    )
}

/// Print one batch event as an indented progress line.
pub(crate) fn print_event(event: &BatchEvent) {
    match event {
        BatchEvent::FolderCreated { path } => println!("Created folder: {}", path.display()),
        BatchEvent::FolderFailed { path, error } => {
            println!("Cannot create folder {}: {error}", path.display())
        }
        BatchEvent::FolderEmpty { path } => println!("\nNo images found in: {}", path.display()),
        BatchEvent::FolderStarted { path, count } => {
            println!("\n[{}] Found {count} images", path.display())
        }
        BatchEvent::ItemStarted { index, total, name } => println!("  [{index}/{total}] {name}"),
        BatchEvent::ItemFinished(outcome) => print_outcome(outcome),
    }
}

pub(crate) fn print_outcome(outcome: &ItemOutcome) {
    match &outcome.result {
        Ok(change) => println!("    → {}", describe_change(change, "saved")),
        Err(error) => println!("    Error processing {}: {error}", outcome.input.display()),
    }
}

pub(crate) fn print_summary(tally: &BatchTally, noun: &str) {
    println!();
    banner("SUMMARY");
    println!("Total {noun} processed: {}", tally.processed);
    if tally.failed > 0 {
        println!("Failed:         {}", tally.failed);
    }
    if tally.skipped > 0 {
        println!("Skipped:        {}", tally.skipped);
    }
    println!("Total original: {}", format_mb(tally.total_original));
    println!("Total new:      {}", format_mb(tally.total_new));
    if let Some(savings) = tally.total_savings_percent() {
        println!("Total savings:  {savings:.1}%");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_location_prefers_explicit_path() {
        assert_eq!(
            config_location(Some(Path::new("site/webprep.json"))),
            PathBuf::from("site/webprep.json")
        );
        assert_eq!(config_location(None), config_file_path());
    }

    #[test]
    fn test_describe_change() {
        let change = SizeChange::new(12_288, 3_174);
        assert_eq!(describe_change(&change, "saved"), "12.0KB → 3.1KB (74.2% saved)");
    }

    #[test]
    fn test_describe_change_empty_original() {
        let change = SizeChange::new(0, 10);
        assert_eq!(describe_change(&change, "smaller"), "0.0KB → 0.0KB (n/a smaller)");
    }
}
