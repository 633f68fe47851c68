//! Check system capabilities.

use std::path::Path;

use webprep_common::config::AppConfig;
use webprep_imaging::{probe_encoder, OutputFormat};

use super::config_location;

pub fn run(config: &AppConfig, explicit: Option<&Path>) -> anyhow::Result<()> {
    println!("webprep System Check");
    println!("{}", super::rule());

    // Config
    for line in config_report(config, explicit) {
        println!("{line}");
    }

    // Image encoders
    let mut encoders_ok = true;
    for format in OutputFormat::ALL {
        match probe_encoder(format) {
            Ok(_) => println!("[OK] {} encoder", format.extension()),
            Err(e) => {
                encoders_ok = false;
                println!("[FAIL] {} encoder: {e}", format.extension());
            }
        }
    }
    match webprep_fonts::probe_compressor() {
        Ok(_) => println!("[OK] WOFF2 encoder (brotli)"),
        Err(e) => {
            encoders_ok = false;
            println!("[FAIL] WOFF2 encoder (brotli): {e}");
        }
    }

    // Synthetic keyboard input
    let typing_ok = webprep_typist::sink_available();
    if typing_ok {
        println!("[OK] Keystroke injection available");
    } else {
        println!("[WARN] Keystroke injection unavailable; `webprep type` will fail");
        println!("     Needs a desktop session (X11/Wayland with libei, macOS accessibility, or Windows)");
    }

    println!();
    if encoders_ok && typing_ok {
        println!("All capabilities are available. webprep is ready.");
    } else {
        println!("Some capabilities are missing. See above.");
    }

    Ok(())
}

fn config_report(config: &AppConfig, explicit: Option<&Path>) -> Vec<String> {
    let path = config_location(explicit);
    let mut lines = Vec::with_capacity(2);
    if path.exists() {
        lines.push(format!("[OK] Config file: {}", path.display()));
    } else {
        lines.push(format!(
            "[OK] Config file: {} not found (defaults in use)",
            path.display()
        ));
    }
    match config.validate() {
        Ok(()) => lines.push("[OK] Config values valid".to_string()),
        Err(e) => lines.push(format!("[WARN] Config invalid: {e}")),
    }
    lines
}
