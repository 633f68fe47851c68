//! Generate compressed thumbnails.

use std::path::PathBuf;

use webprep_common::config::AppConfig;
use webprep_imaging::ThumbnailJob;

use super::{banner, print_event, print_summary};

pub fn run(
    mut config: AppConfig,
    base_dir: Option<PathBuf>,
    folders: Vec<String>,
    output_dir: Option<PathBuf>,
    max_width: Option<u32>,
    quality: Option<u8>,
    format: Option<String>,
) -> anyhow::Result<()> {
    let settings = &mut config.thumbnails;
    if let Some(base_dir) = base_dir {
        settings.base_dir = base_dir;
    }
    if !folders.is_empty() {
        settings.folders = folders;
    }
    if let Some(output_dir) = output_dir {
        settings.output_dir = output_dir;
    }
    if let Some(max_width) = max_width {
        settings.max_width = max_width;
    }
    if let Some(quality) = quality {
        settings.quality = quality;
    }
    if let Some(format) = format {
        settings.format = format;
    }
    config.validate()?;

    let job = ThumbnailJob::from_config(&config.thumbnails)?;

    banner("Image Thumbnail Optimizer");
    println!(
        "Max width: {}px, quality: {}, format: {}",
        job.max_width,
        job.quality,
        job.format.extension()
    );

    let report = job.run(|event| print_event(&event));

    print_summary(&report.tally, "images");
    println!(
        "\nThumbnails saved to: {}/",
        job.base_dir.join(&job.output_dir).display()
    );
    for folder in &report.folders {
        println!("  - {}/", folder.output.display());
    }

    Ok(())
}
