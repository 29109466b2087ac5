//! Background thread that re-probes the front tab on a fixed interval.

use super::prober::{BookmarkSource, BookmarkStatus, BrowserAutomation, StatusProber};
use crossbeam_channel::{select, tick, unbounded, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

enum Control {
    Refresh,
    Stop,
}

/// Owns the polling thread. Each tick runs an unforced probe; `refresh`
/// runs a forced one. Status changes are sent on the channel given to `start`.
pub struct StatusPoller {
    control_tx: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn start<A, S>(
        mut prober: StatusProber<A, S>,
        interval: Duration,
        status_tx: Sender<BookmarkStatus>,
    ) -> Self
    where
        A: BrowserAutomation + Send + 'static,
        S: BookmarkSource + Send + 'static,
    {
        let (control_tx, control_rx) = unbounded::<Control>();

        let handle = std::thread::spawn(move || {
            let ticker = tick(interval);
            tracing::info!(
                target: "status::poller",
                interval_ms = interval.as_millis() as u64,
                "Status poller started"
            );

            // First probe right away, not one interval later.
            if !emit(&status_tx, prober.check(true)) {
                return;
            }

            loop {
                let force = select! {
                    recv(ticker) -> _ => Some(false),
                    recv(control_rx) -> msg => match msg {
                        Ok(Control::Refresh) => Some(true),
                        Ok(Control::Stop) | Err(_) => None,
                    },
                };
                let Some(force) = force else {
                    break;
                };

                if !emit(&status_tx, prober.check(force)) {
                    break;
                }
            }

            tracing::info!(target: "status::poller", "Status poller stopped");
        });

        Self {
            control_tx,
            handle: Some(handle),
        }
    }

    /// Requests a forced re-check, e.g. after the bookmark set was reloaded.
    pub fn refresh(&self) {
        if self.control_tx.send(Control::Refresh).is_err() {
            tracing::debug!(target: "status::poller", "Refresh after poller exit ignored");
        }
    }

    /// Stops the thread and waits for it to finish.
    pub fn stop(&mut self) {
        let _ = self.control_tx.send(Control::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(target: "status::poller", "Status poller thread panicked");
            }
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sends a changed status. False once the receiver is gone.
fn emit(status_tx: &Sender<BookmarkStatus>, status: Option<BookmarkStatus>) -> bool {
    match status {
        Some(status) => {
            tracing::debug!(target: "status::poller", status = ?status, "Status changed");
            status_tx.send(status).is_ok()
        }
        None => true,
    }
}
