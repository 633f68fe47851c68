//! Typing scripts and their pacing.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use webprep_common::config::TypingConfig;
use webprep_common::error::{WebprepError, WebprepResult};

/// Lines of text to be typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypingScript {
    lines: Vec<String>,
}

impl TypingScript {
    /// Split `text` into lines. With `trim`, leading and trailing whitespace
    /// is stripped so the target editor's auto-indent is not doubled.
    pub fn from_text(text: &str, trim: bool) -> Self {
        let lines = text
            .lines()
            .map(|line| if trim { line.trim() } else { line.trim_end_matches('\r') })
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn from_file(path: &Path, trim: bool) -> WebprepResult<Self> {
        if !path.is_file() {
            return Err(WebprepError::file_not_found(path));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text, trim))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Characters typed, not counting the Enter after each line.
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }
}

/// Timing rules for a typing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub start_delay: Duration,
    pub key_delay: Duration,
    pub key_jitter: Duration,
    pub line_delay: Duration,
    /// Every N-th line (1-based) is followed by an extra pause.
    pub pause_every: usize,
    pub pause_min: Duration,
    pub pause_max: Duration,
}

impl From<&TypingConfig> for Pacing {
    fn from(config: &TypingConfig) -> Self {
        Self {
            start_delay: Duration::from_millis(config.start_delay_ms),
            key_delay: Duration::from_millis(config.key_delay_ms),
            key_jitter: Duration::from_millis(config.key_jitter_ms),
            line_delay: Duration::from_millis(config.line_delay_ms),
            pause_every: config.pause_every_lines,
            pause_min: Duration::from_millis(config.pause_min_ms),
            pause_max: Duration::from_millis(config.pause_max_ms),
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from(&TypingConfig::default())
    }
}

impl Pacing {
    /// Delay after each key of one line: `key_delay` shifted by a uniform
    /// offset in `[-key_jitter, key_jitter]`, never negative.
    pub fn key_interval(&self, rng: &mut impl Rng) -> Duration {
        let base = self.key_delay.as_secs_f64();
        let jitter = self.key_jitter.as_secs_f64();
        let offset = if jitter > 0.0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64((base + offset).max(0.0))
    }

    /// Extra pause after line `line_number` (1-based), if it is due one.
    pub fn extra_pause(&self, line_number: usize, rng: &mut impl Rng) -> Duration {
        if self.pause_every == 0 || line_number % self.pause_every != 0 {
            return Duration::ZERO;
        }
        let (min, max) = if self.pause_min <= self.pause_max {
            (self.pause_min, self.pause_max)
        } else {
            (self.pause_max, self.pause_min)
        };
        if min == max {
            return min;
        }
        Duration::from_secs_f64(rng.gen_range(min.as_secs_f64()..=max.as_secs_f64()))
    }
}

/// One line with its timing decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacedLine {
    pub text: String,
    /// Sleep after every character of this line.
    pub key_interval: Duration,
    /// Sleep after the line's Enter.
    pub pause_after: Duration,
}

/// Decide the timing of every line up front.
pub fn schedule(script: &TypingScript, pacing: &Pacing, rng: &mut impl Rng) -> Vec<PacedLine> {
    script
        .lines()
        .iter()
        .enumerate()
        .map(|(i, text)| PacedLine {
            text: text.clone(),
            key_interval: pacing.key_interval(rng),
            pause_after: pacing.line_delay + pacing.extra_pause(i + 1, rng),
        })
        .collect()
}

/// Wall time a schedule takes, start delay included.
pub fn estimated_duration(lines: &[PacedLine], start_delay: Duration) -> Duration {
    lines.iter().fold(start_delay, |total, line| {
        let chars = line.text.chars().count() as u32;
        total + line.key_interval * chars + line.pause_after
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn numbered_script(n: usize) -> TypingScript {
        let text = (1..=n)
            .map(|i| format!("    let x{i} = {i};"))
            .collect::<Vec<_>>()
            .join("\n");
        TypingScript::from_text(&text, true)
    }

    #[test]
    fn test_trim_strips_both_ends() {
        let script = TypingScript::from_text("  fn main() {\r\n\tprintln!();  \n}\n", true);
        assert_eq!(script.lines(), &["fn main() {", "println!();", "}"]);
        assert_eq!(script.char_count(), 11 + 11 + 1);
    }

    #[test]
    fn test_untrimmed_keeps_indent() {
        let script = TypingScript::from_text("a\n    b\r\n\n", false);
        assert_eq!(script.lines(), &["a", "    b", ""]);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TypingScript::from_file(&dir.path().join("code.rs"), true).unwrap_err();
        assert!(matches!(err, WebprepError::FileNotFound { .. }));
    }

    #[test]
    fn test_default_pacing_bounds() {
        let pacing = Pacing::default();
        let mut rng = StdRng::seed_from_u64(7);
        let lines = schedule(&numbered_script(30), &pacing, &mut rng);
        assert_eq!(lines.len(), 30);

        for (i, line) in lines.iter().enumerate() {
            assert!(line.key_interval <= Duration::from_millis(60));
            let n = i + 1;
            if n % 10 == 0 {
                assert!(line.pause_after >= Duration::from_millis(1350));
                assert!(line.pause_after <= Duration::from_millis(3350));
            } else {
                assert_eq!(line.pause_after, Duration::from_millis(350));
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let pacing = Pacing {
            key_jitter: Duration::ZERO,
            pause_min: Duration::from_millis(500),
            pause_max: Duration::from_millis(500),
            pause_every: 2,
            ..Pacing::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let lines = schedule(&numbered_script(4), &pacing, &mut rng);
        assert!(lines.iter().all(|l| l.key_interval == Duration::from_millis(30)));
        assert_eq!(lines[0].pause_after, Duration::from_millis(350));
        assert_eq!(lines[1].pause_after, Duration::from_millis(850));
        assert_eq!(lines[3].pause_after, Duration::from_millis(850));
    }

    #[test]
    fn test_jitter_never_goes_negative() {
        let pacing = Pacing {
            key_delay: Duration::from_millis(5),
            key_jitter: Duration::from_millis(50),
            ..Pacing::default()
        };
        let mut rng = StdRng::seed_from_u64(99);
        let mut saw_zero = false;
        for _ in 0..500 {
            let interval = pacing.key_interval(&mut rng);
            assert!(interval <= Duration::from_millis(55));
            saw_zero |= interval == Duration::ZERO;
        }
        assert!(saw_zero);
    }

    #[test]
    fn test_estimated_duration() {
        let lines = vec![
            PacedLine {
                text: "abc".into(),
                key_interval: Duration::from_millis(10),
                pause_after: Duration::from_millis(100),
            },
            PacedLine {
                text: String::new(),
                key_interval: Duration::from_millis(10),
                pause_after: Duration::from_millis(200),
            },
        ];
        assert_eq!(
            estimated_duration(&lines, Duration::from_secs(1)),
            Duration::from_millis(1000 + 30 + 100 + 200)
        );
    }
}
