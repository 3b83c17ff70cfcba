//! Clipboard access for the TUI.
//!
//! X11/Wayland clipboards are served by the owning process, so each copy is held
//! on a worker thread for a while instead of being dropped straight away.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{channel, Sender};
use std::sync::OnceLock;
use std::time::Duration;

const HOLD_FOR: Duration = Duration::from_secs(2);

static WORKER: OnceLock<Sender<String>> = OnceLock::new();

fn worker() -> &'static Sender<String> {
    WORKER.get_or_init(|| {
        let (tx, rx) = channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                let copied = arboard::Clipboard::new().and_then(|mut clipboard| {
                    clipboard.set_text(text)?;
                    std::thread::sleep(HOLD_FOR);
                    Ok(())
                });
                if let Err(e) = copied {
                    tracing::warn!(error = %e, "clipboard copy failed");
                }
            }
        });
        tx
    })
}

/// Hand `text` to the clipboard worker. Returns once queued, not once copied.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    worker()
        .send(text.to_string())
        .map_err(|_| anyhow!("clipboard worker is gone"))
}
