//! Spinner shown on the terminal while a reconciliation job runs

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// An animated progress indicator whose message can change while it runs.
///
/// The spinner starts when created and stops when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let spinner = Spinner::start("Loading workbook...");
/// spinner.set_message("Matching 1200 records");
/// drop(spinner); // line is cleared
/// ```
pub struct Spinner {
    message: Arc<Mutex<String>>,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message
    pub fn start(message: impl Into<String>) -> Self {
        let message = Arc::new(Mutex::new(message.into()));
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle = tokio::spawn(Self::run_spinner(message.clone(), stop_rx));

        Self {
            message,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        if let Ok(mut current) = self.message.lock() {
            *current = message.into();
        }
    }

    fn stop_internal(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            // Can't await in Drop
            handle.abort();
        }

        Self::clear_line();
    }

    async fn run_spinner(message: Arc<Mutex<String>>, mut stop_rx: oneshot::Receiver<()>) {
        let mut frame = 0;
        let mut stdout = io::stdout();

        loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }

            let spinner_char = SPINNER_CHARS[frame % SPINNER_CHARS.len()];
            let text = message.lock().map(|m| m.clone()).unwrap_or_default();
            print!("\r\x1b[K{} {}", spinner_char, text);
            let _ = stdout.flush();

            frame += 1;

            tokio::select! {
                _ = tokio::time::sleep(SPINNER_INTERVAL) => {},
                _ = &mut stop_rx => break,
            }
        }

        Self::clear_line();
    }

    fn clear_line() {
        print!("\r\x1b[K");
        let _ = io::stdout().flush();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop_internal();
    }
}
