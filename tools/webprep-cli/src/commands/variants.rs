//! Write web-friendly siblings for every jpg/png under a tree.

use std::path::PathBuf;

use webprep_common::config::AppConfig;
use webprep_imaging::{BatchEvent, VariantJob};

use super::{banner, describe_change, print_event, print_summary};

pub fn run(
    mut config: AppConfig,
    root: Option<PathBuf>,
    webp_quality: Option<u8>,
    avif_quality: Option<u8>,
) -> anyhow::Result<()> {
    if let Some(root) = root {
        config.web_variants.root = root;
    }
    if let Some(quality) = webp_quality {
        config.web_variants.webp_quality = quality;
    }
    if let Some(quality) = avif_quality {
        config.web_variants.avif_quality = quality;
    }
    config.validate()?;

    let job = VariantJob::from_config(&config.web_variants);

    banner("Web Image Variants");
    println!(
        "WebP quality {}, AVIF quality {} (speed {})",
        job.webp_quality, job.avif_quality, job.avif_speed
    );

    let report = job.run(|event| match event {
        BatchEvent::ItemFinished(outcome) => {
            let name = outcome
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match &outcome.result {
                Ok(change) => println!("    → {name}: {}", describe_change(change, "saved")),
                Err(error) => println!("    ❌ {name}: {error}"),
            }
        }
        other => print_event(&other),
    });

    for source in report.sources.iter().filter(|s| s.is_success()) {
        if let Some(name) = source.source.file_stem() {
            println!("✅ Optimized: {}", name.to_string_lossy());
        }
    }

    print_summary(&report.tally, "variants");
    if report.tally.failed == 0 {
        println!("\n🎉 All images optimized!");
    }
    Ok(())
}
