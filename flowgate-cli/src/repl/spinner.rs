//! Animated waiting indicator

use std::io::{stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Frame shown at tick `n`
fn frame(n: usize) -> char {
    FRAMES[n % FRAMES.len()]
}

/// A spinner that redraws one line in the background until stopped
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message
    pub fn new(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let message = message.to_string();

        let handle = tokio::spawn(async move {
            let mut tick = 0usize;
            while flag.load(Ordering::Relaxed) {
                print!("\r\x1b[2m{} {}\x1b[0m", frame(tick), message);
                let _ = stdout().flush();
                tick = tick.wrapping_add(1);
                tokio::time::sleep(FRAME_DURATION).await;
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        print!("\r\x1b[2K");
        let _ = stdout().flush();
    }
}
