//! Log capture for tests that assert on dispatch decisions.
//!
//! The subscriber is installed with `tracing::subscriber::set_default`, so
//! it only sees events from the current thread and only while the guard
//! lives. Set `STACKINABOX_TEST_LOGS` to also echo the captured lines.

use std::env;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::fmt::TestWriter;

const ECHO_ENV: &str = "STACKINABOX_TEST_LOGS";

/// Keeps the capturing subscriber installed until dropped.
#[derive(Debug)]
pub struct LogCaptureGuard(#[allow(dead_code)] DefaultGuard);

/// Read side of a capture.
#[derive(Debug, Clone)]
pub struct Rx(Arc<Mutex<Vec<u8>>>);

impl Rx {
    /// Everything logged so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.0)).into_owned()
    }
}

fn lock(buf: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Capture every event at TRACE and above on the current thread.
#[must_use]
pub fn capture_logs() -> (LogCaptureGuard, Rx) {
    let buf: Arc<Mutex<Vec<u8>>> = Default::default();
    let writer = Tee {
        buf: buf.clone(),
        echo: env::var_os(ECHO_ENV).is_some(),
        inner: TestWriter::new(),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(Mutex::new(writer))
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (LogCaptureGuard(guard), Rx(buf))
}

struct Tee<W> {
    buf: Arc<Mutex<Vec<u8>>>,
    echo: bool,
    inner: W,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        lock(&self.buf).extend_from_slice(buf);
        if self.echo {
            self.inner.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
