//! Scoped capture of engine diagnostic text.
//!
//! Engines write free text (progress, warnings, convergence reports) through a
//! [`DiagnosticBuffer`]. Outside a capture the text goes to the log at debug level. Inside a
//! [`DiagnosticCapture`] it accumulates in a frame that the capture hands back on
//! [`finish`](DiagnosticCapture::finish).
//!
//! Frames nest: the innermost capture receives the text, and releasing it (by `finish`, an
//! early `?` return or a panic unwinding through it) restores the enclosing target.
//!
//! ```
//! use stabsim_engine::{DiagnosticCapture, EngineSession, ScriptedEngine};
//!
//! let mut engine = ScriptedEngine::new();
//! engine.open().unwrap();
//! let mut capture = DiagnosticCapture::begin(&mut engine);
//! capture.initialize(200_000).unwrap();
//! let text = capture.finish();
//! assert!(text.contains("initialized"));
//! assert!(!engine.diagnostics_mut().is_capturing());
//! ```

use std::ops::{Deref, DerefMut};
use tracing::debug;

use crate::session::EngineSession;

#[derive(Debug, Default)]
pub struct DiagnosticBuffer {
    frames: Vec<String>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes engine text to the innermost capture, or to the log when nothing captures.
    pub fn emit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.frames.last_mut() {
            Some(frame) => {
                frame.push_str(text);
                if !text.ends_with('\n') {
                    frame.push('\n');
                }
            }
            None => {
                for line in text.lines().filter(|line| !line.trim().is_empty()) {
                    debug!(target: "stabsim::engine", "{line}");
                }
            }
        }
    }

    pub fn is_capturing(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn push_frame(&mut self) {
        self.frames.push(String::new());
    }

    fn pop_frame(&mut self) -> Option<String> {
        self.frames.pop()
    }
}

/// Capture scope over an engine session. Derefs to the session, so commands are issued
/// through the capture while it is alive.
pub struct DiagnosticCapture<'a, E: EngineSession + ?Sized> {
    engine: &'a mut E,
    released: bool,
}

impl<'a, E: EngineSession + ?Sized> DiagnosticCapture<'a, E> {
    pub fn begin(engine: &'a mut E) -> Self {
        engine.diagnostics_mut().push_frame();
        Self {
            engine,
            released: false,
        }
    }

    /// Ends the capture and returns everything the engine wrote while it was active.
    pub fn finish(mut self) -> String {
        self.released = true;
        self.engine
            .diagnostics_mut()
            .pop_frame()
            .unwrap_or_default()
    }
}

impl<E: EngineSession + ?Sized> Deref for DiagnosticCapture<'_, E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        self.engine
    }
}

impl<E: EngineSession + ?Sized> DerefMut for DiagnosticCapture<'_, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine
    }
}

impl<E: EngineSession + ?Sized> Drop for DiagnosticCapture<'_, E> {
    fn drop(&mut self) {
        if !self.released {
            self.engine.diagnostics_mut().pop_frame();
        }
    }
}
