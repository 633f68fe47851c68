//! Shrink a folder of images by a fixed factor.

use std::path::PathBuf;

use webprep_common::config::AppConfig;
use webprep_imaging::ResizeJob;

use super::{banner, print_event, print_summary};

pub fn run(
    mut config: AppConfig,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    scale: Option<f64>,
) -> anyhow::Result<()> {
    if let Some(input_dir) = input_dir {
        config.resize.input_dir = input_dir;
    }
    if let Some(output_dir) = output_dir {
        config.resize.output_dir = output_dir;
    }
    if let Some(scale) = scale {
        config.resize.scale = scale;
    }
    config.validate()?;

    let job = ResizeJob::from_config(&config.resize);

    banner("Image Resizer");
    println!(
        "{} → {} (scale {})",
        job.input_dir.display(),
        job.output_dir.display(),
        job.scale
    );

    let report = job.run(|event| print_event(&event));

    print_summary(&report.tally, "images");
    println!("\nResized images saved to: {}/", job.output_dir.display());
    Ok(())
}
