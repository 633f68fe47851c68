//! File-level font conversion.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use webprep_common::error::{WebprepError, WebprepResult};
use webprep_common::size::{BatchTally, SizeChange};

use crate::sfnt::SfntFont;
use crate::woff2::{decode_woff2, encode_woff2};

/// Output path for `input`: a trailing `.otf`/`.ttf` (any case) becomes
/// `.woff2`; any other name gets `.woff2` appended.
pub fn woff2_path(input: &Path) -> PathBuf {
    let replaceable = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("otf") || e.eq_ignore_ascii_case("ttf"))
        .unwrap_or(false);
    if replaceable {
        input.with_extension("woff2")
    } else {
        let mut name = OsString::from(input.as_os_str());
        name.push(".woff2");
        PathBuf::from(name)
    }
}

/// Convert one font file. Returns input and output sizes.
pub fn convert_to_woff2(input: &Path, output: &Path, quality: u32) -> WebprepResult<SizeChange> {
    if !input.is_file() {
        return Err(WebprepError::file_not_found(input));
    }
    let data = std::fs::read(input)?;
    let font = SfntFont::parse(&data)?;
    let woff2 = encode_woff2(&font, quality)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, &woff2)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        cff = font.is_cff(),
        "Converted font"
    );
    Ok(SizeChange::new(data.len() as u64, woff2.len() as u64))
}

/// Check that a WOFF2 file holds exactly the tables of `original`.
pub fn verify_woff2(original: &Path, woff2: &Path) -> WebprepResult<()> {
    let source = std::fs::read(original)?;
    let font = SfntFont::parse(&source)?;
    let packed = std::fs::read(woff2)?;
    let decoded = decode_woff2(&packed)?;

    if decoded.flavor != font.flavor() {
        return Err(WebprepError::font("Flavor changed during conversion"));
    }
    if decoded.tables.len() != font.tables().len() {
        return Err(WebprepError::font(format!(
            "Expected {} tables, found {}",
            font.tables().len(),
            decoded.tables.len()
        )));
    }
    for table in font.tables() {
        match decoded.table(&table.tag) {
            Some(data) if data == table.data => {}
            Some(_) => {
                return Err(WebprepError::font(format!(
                    "Table '{}' differs after conversion",
                    table.tag_str()
                )))
            }
            None => {
                return Err(WebprepError::font(format!(
                    "Table '{}' missing after conversion",
                    table.tag_str()
                )))
            }
        }
    }
    Ok(())
}

/// What happened to one font.
#[derive(Debug, Clone, PartialEq)]
pub enum FontOutcome {
    Converted {
        input: PathBuf,
        output: PathBuf,
        change: SizeChange,
    },
    /// The input file does not exist.
    Missing { input: PathBuf },
    Failed { input: PathBuf, error: String },
}

impl FontOutcome {
    pub fn input(&self) -> &Path {
        match self {
            Self::Converted { input, .. } | Self::Missing { input } | Self::Failed { input, .. } => {
                input
            }
        }
    }
}

/// Progress notifications for a font batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FontEvent {
    Started { input: PathBuf, output: PathBuf },
    Finished(FontOutcome),
}

/// Convert a list of fonts, continuing past missing or broken files.
#[derive(Debug, Clone)]
pub struct FontBatch {
    pub files: Vec<PathBuf>,
    /// Write outputs here instead of next to each input.
    pub out_dir: Option<PathBuf>,
    /// Brotli quality (0-11).
    pub quality: u32,
    /// Decode every output and compare it with its source.
    pub verify: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FontReport {
    pub outcomes: Vec<FontOutcome>,
    pub tally: BatchTally,
}

impl FontBatch {
    pub fn output_for(&self, input: &Path) -> PathBuf {
        let beside = woff2_path(input);
        match (&self.out_dir, beside.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => beside,
        }
    }

    pub fn run(&self, mut on_event: impl FnMut(FontEvent)) -> FontReport {
        let mut report = FontReport::default();

        for input in &self.files {
            if !input.exists() {
                tracing::warn!(path = %input.display(), "Font not found");
                report.tally.record_skip();
                let outcome = FontOutcome::Missing {
                    input: input.clone(),
                };
                on_event(FontEvent::Finished(outcome.clone()));
                report.outcomes.push(outcome);
                continue;
            }

            let output = self.output_for(input);
            on_event(FontEvent::Started {
                input: input.clone(),
                output: output.clone(),
            });

            let result = convert_to_woff2(input, &output, self.quality).and_then(|change| {
                if self.verify {
                    verify_woff2(input, &output)?;
                }
                Ok(change)
            });

            let outcome = match result {
                Ok(change) => {
                    report.tally.record(&change);
                    FontOutcome::Converted {
                        input: input.clone(),
                        output,
                        change,
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %input.display(), error = %e, "Font conversion failed");
                    report.tally.record_failure();
                    FontOutcome::Failed {
                        input: input.clone(),
                        error: e.to_string(),
                    }
                }
            };
            on_event(FontEvent::Finished(outcome.clone()));
            report.outcomes.push(outcome);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woff2_path_replaces_font_extensions() {
        assert_eq!(
            woff2_path(Path::new("MonumentExtended.otf")),
            PathBuf::from("MonumentExtended.woff2")
        );
        assert_eq!(
            woff2_path(Path::new("fonts/Ultrabold.OTF")),
            PathBuf::from("fonts/Ultrabold.woff2")
        );
        assert_eq!(
            woff2_path(Path::new("Mono.ttf")),
            PathBuf::from("Mono.woff2")
        );
    }

    #[test]
    fn test_woff2_path_appends_for_other_names() {
        assert_eq!(
            woff2_path(Path::new("font.bin")),
            PathBuf::from("font.bin.woff2")
        );
        assert_eq!(woff2_path(Path::new("Plain")), PathBuf::from("Plain.woff2"));
    }

    #[test]
    fn test_output_for_with_out_dir() {
        let batch = FontBatch {
            files: vec![],
            out_dir: Some(PathBuf::from("public/fonts")),
            quality: 11,
            verify: false,
        };
        assert_eq!(
            batch.output_for(Path::new("src/A.otf")),
            PathBuf::from("public/fonts/A.woff2")
        );
    }
}
