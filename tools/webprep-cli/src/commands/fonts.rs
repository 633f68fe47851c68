//! Convert fonts to WOFF2.

use std::path::PathBuf;

use webprep_common::config::AppConfig;
use webprep_fonts::{FontBatch, FontEvent, FontOutcome};

use super::describe_change;

pub fn run(
    mut config: AppConfig,
    files: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    quality: Option<u32>,
    verify: bool,
) -> anyhow::Result<()> {
    if !files.is_empty() {
        config.fonts.files = files;
    }
    if let Some(quality) = quality {
        config.fonts.brotli_quality = quality;
    }
    config.validate()?;

    let batch = FontBatch {
        files: config.fonts.files.clone(),
        out_dir,
        quality: config.fonts.brotli_quality,
        verify,
    };

    let report = batch.run(|event| match event {
        FontEvent::Started { input, output } => {
            println!("Converting: {} -> {}", input.display(), output.display())
        }
        FontEvent::Finished(FontOutcome::Converted { change, .. }) => {
            println!("  ✅ Done! {}", describe_change(&change, "smaller"))
        }
        FontEvent::Finished(FontOutcome::Missing { input }) => {
            println!("  ⚠️ File not found: {}", input.display())
        }
        FontEvent::Finished(FontOutcome::Failed { error, .. }) => {
            println!("  ❌ Error: {error}")
        }
    });

    let tally = &report.tally;
    if tally.failed == 0 && tally.skipped == 0 {
        println!("\n✅ Conversion complete!");
    } else {
        println!(
            "\nConversion finished: {} converted, {} failed, {} not found",
            tally.processed, tally.failed, tally.skipped
        );
    }
    Ok(())
}
