//! Webprep Typist
//!
//! Replays a text file into the focused window as synthetic keystrokes,
//! paced to look like a person typing: a short random delay after every
//! key, a fixed delay after every line and a longer pause every few lines.
//!
//! Keystrokes go through a pluggable [`KeySink`] so sessions can run
//! against the OS input queue or an in-memory recorder.

pub mod backends;
pub mod script;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use webprep_common::error::WebprepResult;

pub use backends::{detect_sink, sink_available, RecordingSink};
pub use script::{estimated_duration, schedule, PacedLine, Pacing, TypingScript};

#[cfg(feature = "enigo")]
pub use backends::EnigoSink;

/// Longest single sleep; the stop flag is rechecked at least this often.
const STOP_POLL: Duration = Duration::from_millis(50);

/// Destination for synthetic keystrokes.
pub trait KeySink {
    /// Type one character.
    fn type_char(&mut self, c: char) -> WebprepResult<()>;

    /// Press and release Enter.
    fn press_enter(&mut self) -> WebprepResult<()>;

    /// Sink name for logging.
    fn name(&self) -> &str;
}

/// Summary of a finished (or interrupted) session.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingReport {
    pub lines_typed: usize,
    pub chars_typed: usize,
    /// Whether the session ended early through its stop flag.
    pub stopped: bool,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed: Duration,
}

/// Types a schedule of lines into a sink.
pub struct TypingSession {
    sink: Box<dyn KeySink>,
    lines: Vec<PacedLine>,
    start_delay: Duration,
    stop_flag: Arc<AtomicBool>,
}

impl TypingSession {
    pub fn new(sink: Box<dyn KeySink>, lines: Vec<PacedLine>, start_delay: Duration) -> Self {
        Self {
            sink,
            lines,
            start_delay,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination (e.g. a Ctrl+C handler).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    fn stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Sleep for `duration`, waking early if the stop flag is set.
    /// Returns `false` when stopped.
    async fn pause(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.stopped() {
                return false;
            }
            let step = remaining.min(STOP_POLL);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        !self.stopped()
    }

    /// Wait out the start delay, then type every line.
    pub async fn run(&mut self) -> WebprepResult<TypingReport> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let clock = Instant::now();
        let mut lines_typed = 0;
        let mut chars_typed = 0;

        tracing::info!(
            sink = %self.sink.name(),
            lines = self.lines.len(),
            start_delay_ms = self.start_delay.as_millis() as u64,
            "Typing session started"
        );

        let mut completed = self.pause(self.start_delay).await;

        if completed {
            'lines: for (index, line) in self.lines.iter().enumerate() {
                for c in line.text.chars() {
                    if self.stopped() {
                        completed = false;
                        break 'lines;
                    }
                    self.sink.type_char(c)?;
                    chars_typed += 1;
                    if !self.pause(line.key_interval).await {
                        completed = false;
                        break 'lines;
                    }
                }

                if self.stopped() {
                    completed = false;
                    break;
                }
                self.sink.press_enter()?;
                lines_typed += 1;
                tracing::debug!(line = index + 1, chars = line.text.len(), "Line typed");

                if !self.pause(line.pause_after).await {
                    completed = lines_typed == self.lines.len();
                    break;
                }
            }
        }

        let report = TypingReport {
            lines_typed,
            chars_typed,
            stopped: !completed,
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            elapsed: clock.elapsed(),
        };

        if report.stopped {
            tracing::warn!(lines = lines_typed, chars = chars_typed, "Typing session stopped early");
        } else {
            tracing::info!(lines = lines_typed, chars = chars_typed, "Typing session finished");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, key_ms: u64, pause_ms: u64) -> PacedLine {
        PacedLine {
            text: text.to_string(),
            key_interval: Duration::from_millis(key_ms),
            pause_after: Duration::from_millis(pause_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_types_every_line_then_enter() {
        let sink = RecordingSink::new();
        let transcript = sink.transcript();
        let lines = vec![line("let a = 1;", 30, 350), line("", 30, 350), line("a", 30, 350)];
        let mut session = TypingSession::new(Box::new(sink), lines, Duration::from_secs(4));

        let report = session.run().await.unwrap();
        assert_eq!(*transcript.lock().unwrap(), "let a = 1;\n\na\n");
        assert_eq!(report.lines_typed, 3);
        assert_eq!(report.chars_typed, 11);
        assert!(!report.stopped);
        assert!(report.elapsed >= Duration::from_millis(4000 + 11 * 30 + 3 * 350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start() {
        let sink = RecordingSink::new();
        let transcript = sink.transcript();
        let mut session = TypingSession::new(
            Box::new(sink),
            vec![line("never typed", 10, 10)],
            Duration::from_secs(4),
        );
        session.stop();

        let report = session.run().await.unwrap();
        assert!(report.stopped);
        assert_eq!(report.chars_typed, 0);
        assert!(transcript.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_schedule_completes() {
        let mut session =
            TypingSession::new(Box::new(RecordingSink::new()), vec![], Duration::ZERO);
        let report = session.run().await.unwrap();
        assert!(!report.stopped);
        assert_eq!(report.lines_typed, 0);
    }
}
