//! Streaming support for toolchain output
//!
//! Commands can run for minutes; their output is delivered line by line to an
//! [`OutputCallback`] as it arrives, while the full text is also captured for
//! the failure report.
//!
//! # Example
//!
//! ```
//! use buildjob::toolchain::{OutputCallback, OutputStream};
//!
//! struct Printer;
//!
//! impl OutputCallback for Printer {
//!     fn on_line(&self, _stream: OutputStream, line: &str) {
//!         println!("{}", line);
//!     }
//! }
//! ```

use crate::toolchain::OutputStream;

/// Callback for command output lines as they arrive
///
/// This trait is object-safe and can be used as `&dyn OutputCallback`.
pub trait OutputCallback: Send + Sync {
    /// Called once per line, without the trailing newline
    fn on_line(&self, stream: OutputStream, line: &str);
}

/// Callback that discards everything
#[derive(Debug, Clone, Default)]
pub struct NoopCallback;

impl OutputCallback for NoopCallback {
    fn on_line(&self, _stream: OutputStream, _line: &str) {}
}

impl<F> OutputCallback for F
where
    F: Fn(OutputStream, &str) + Send + Sync,
{
    fn on_line(&self, stream: OutputStream, line: &str) {
        self(stream, line)
    }
}
