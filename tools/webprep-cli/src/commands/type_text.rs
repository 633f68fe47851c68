//! Replay a text file as paced keystrokes.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use webprep_common::config::AppConfig;
use webprep_typist::{
    detect_sink, estimated_duration, schedule, Pacing, TypingScript, TypingSession,
};

pub async fn run(
    mut config: AppConfig,
    file: PathBuf,
    start_delay_ms: Option<u64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if let Some(delay) = start_delay_ms {
        config.typing.start_delay_ms = delay;
    }
    config.validate()?;

    let script = TypingScript::from_file(&file, config.typing.trim_lines)?;
    let pacing = Pacing::from(&config.typing);
    let lines = schedule(&script, &pacing, &mut rand::thread_rng());
    let estimate = estimated_duration(&lines, pacing.start_delay);

    println!("Typing {}", file.display());
    println!("  Lines: {}", script.len());
    println!("  Characters: {}", script.char_count());
    println!("  Estimated time: {}", format_duration(estimate));
    println!();

    if dry_run {
        let total = lines.len();
        for (i, line) in lines.iter().enumerate() {
            println!(
                "  [{}/{total}] key {}ms, then {}ms | {}",
                i + 1,
                line.key_interval.as_millis(),
                line.pause_after.as_millis(),
                line.text
            );
        }
        return Ok(());
    }

    let sink = detect_sink()?;
    let mut session = TypingSession::new(sink, lines, pacing.start_delay);

    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.store(true, Ordering::SeqCst);
        }
    });

    println!(
        "Switch to the target window. Typing starts in {}...",
        format_duration(pacing.start_delay)
    );
    println!("Press Ctrl+C to stop.");
    println!();

    let report = session.run().await?;

    if report.stopped {
        println!("Stopped after {} of {} lines.", report.lines_typed, script.len());
    } else {
        println!("Done.");
    }
    println!("  Lines typed: {}", report.lines_typed);
    println!("  Characters typed: {}", report.chars_typed);
    println!("  Elapsed: {}", format_duration(report.elapsed));

    Ok(())
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        format!("{}m {:02}s", duration.as_secs() / 60, duration.as_secs() % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(4000)), "4.0s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
    }
}
