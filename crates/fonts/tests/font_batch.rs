use std::path::Path;

use webprep_fonts::sfnt::{write_sfnt, CFF_FLAVOR};
use webprep_fonts::{decode_woff2, FontBatch, FontEvent, FontOutcome, Table};

/// A CFF-flavored font with highly repetitive table data.
fn write_fake_otf(path: &Path) -> Vec<u8> {
    let head = {
        let mut head = vec![0u8; 54];
        head[4..8].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        head
    };
    let cff: Vec<u8> = b"charstring-data-".iter().copied().cycle().take(8192).collect();
    let gpos: Vec<u8> = (0..2048u32).map(|i| (i % 16) as u8).collect();
    let tables = [
        Table { tag: *b"head", data: &head },
        Table { tag: *b"CFF ", data: &cff },
        Table { tag: *b"GPOS", data: &gpos },
        Table { tag: *b"name", data: b"Monument Extended" },
    ];
    let bytes = write_sfnt(CFF_FLAVOR, &tables);
    std::fs::write(path, &bytes).unwrap();
    bytes
}

#[test]
fn batch_converts_reports_missing_and_survives_bad_fonts() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("MonumentExtended.otf");
    let missing = dir.path().join("MonumentExtended-Ultrabold.otf");
    let broken = dir.path().join("Broken.otf");

    let original = write_fake_otf(&good);
    std::fs::write(&broken, b"OTTO but nothing else").unwrap();

    let batch = FontBatch {
        files: vec![good.clone(), missing.clone(), broken.clone()],
        out_dir: None,
        quality: 11,
        verify: true,
    };

    let mut events = Vec::new();
    let report = batch.run(|e| events.push(e));

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.tally.processed, 1);
    assert_eq!(report.tally.skipped, 1);
    assert_eq!(report.tally.failed, 1);

    match &report.outcomes[0] {
        FontOutcome::Converted {
            output, change, ..
        } => {
            assert_eq!(output, &dir.path().join("MonumentExtended.woff2"));
            assert_eq!(change.original, original.len() as u64);
            assert!(change.new < change.original);
            assert!(change.savings_percent().unwrap() > 50.0);
        }
        other => panic!("expected conversion, got {other:?}"),
    }
    assert_eq!(
        report.outcomes[1],
        FontOutcome::Missing {
            input: missing.clone()
        }
    );
    assert!(matches!(report.outcomes[2], FontOutcome::Failed { .. }));
    assert!(!dir.path().join("Broken.woff2").exists());

    // Missing files never emit a start event.
    let started: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            FontEvent::Started { input, .. } => Some(input.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![good, broken]);
}

#[test]
fn converted_font_decodes_to_original_sfnt() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("Display.otf");
    let original = write_fake_otf(&source);
    let out_dir = dir.path().join("public").join("fonts");

    let batch = FontBatch {
        files: vec![source],
        out_dir: Some(out_dir.clone()),
        quality: 9,
        verify: false,
    };
    let report = batch.run(|_| {});
    assert_eq!(report.tally.processed, 1);

    let packed = std::fs::read(out_dir.join("Display.woff2")).unwrap();
    let decoded = decode_woff2(&packed).unwrap();
    assert_eq!(decoded.declared_sfnt_size as usize, original.len());
    assert_eq!(decoded.to_sfnt(), original);
}
