//! Keystroke sinks.
//!
//! The real sink drives the OS input queue through `enigo`; the recording
//! sink keeps a transcript in memory for tests and dry runs.

use std::sync::{Arc, Mutex};

use webprep_common::error::{WebprepError, WebprepResult};

use crate::KeySink;

#[cfg(feature = "enigo")]
pub use self::os::EnigoSink;

#[cfg(feature = "enigo")]
mod os {
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};
    use webprep_common::error::{WebprepError, WebprepResult};

    use crate::KeySink;

    /// Sends keystrokes to whichever window has focus.
    pub struct EnigoSink {
        enigo: Enigo,
    }

    impl EnigoSink {
        pub fn new() -> WebprepResult<Self> {
            let enigo = Enigo::new(&Settings::default()).map_err(|e| {
                WebprepError::typing(format!("Failed to connect to the input system: {e}"))
            })?;
            Ok(Self { enigo })
        }

        pub fn is_supported() -> bool {
            Enigo::new(&Settings::default()).is_ok()
        }
    }

    impl KeySink for EnigoSink {
        fn type_char(&mut self, c: char) -> WebprepResult<()> {
            let mut buf = [0u8; 4];
            self.enigo
                .text(c.encode_utf8(&mut buf))
                .map_err(|e| WebprepError::typing(format!("Failed to type {c:?}: {e}")))
        }

        fn press_enter(&mut self) -> WebprepResult<()> {
            self.enigo
                .key(Key::Return, Direction::Click)
                .map_err(|e| WebprepError::typing(format!("Failed to press Enter: {e}")))
        }

        fn name(&self) -> &str {
            "enigo"
        }
    }
}

/// Collects typed text. Enter is recorded as `'\n'`.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    transcript: Arc<Mutex<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the transcript, readable after the sink has been
    /// moved into a session.
    pub fn transcript(&self) -> Arc<Mutex<String>> {
        self.transcript.clone()
    }

    fn push(&self, c: char) -> WebprepResult<()> {
        self.transcript
            .lock()
            .map_err(|_| WebprepError::typing("Transcript lock poisoned"))?
            .push(c);
        Ok(())
    }
}

impl KeySink for RecordingSink {
    fn type_char(&mut self, c: char) -> WebprepResult<()> {
        self.push(c)
    }

    fn press_enter(&mut self) -> WebprepResult<()> {
        self.push('\n')
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// The keystroke sink for this system, or an error when none can be used.
pub fn detect_sink() -> WebprepResult<Box<dyn KeySink>> {
    #[cfg(feature = "enigo")]
    {
        let sink = EnigoSink::new()?;
        tracing::info!(sink = sink.name(), "Using OS keystroke sink");
        Ok(Box::new(sink))
    }

    #[cfg(not(feature = "enigo"))]
    {
        Err(WebprepError::unsupported(
            "Built without keystroke support; rebuild with the `enigo` feature",
        ))
    }
}

/// Whether [`detect_sink`] can succeed here.
pub fn sink_available() -> bool {
    #[cfg(feature = "enigo")]
    {
        EnigoSink::is_supported()
    }

    #[cfg(not(feature = "enigo"))]
    {
        false
    }
}
