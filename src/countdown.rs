//! Expiration ticker for a pending payment request.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

use crate::wallet::PendingInvoice;

/// Countdown output, readable at any time through a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownState {
    /// No invoice being tracked.
    Idle,
    /// Remaining time formatted `MM:SS`, updated once per second.
    Running { remaining: String },
    /// The invoice expired; the ticker has stopped.
    Expired,
}

/// One countdown slot. Starting a new countdown replaces any previous one,
/// so at most one ticker is ever active.
pub struct InvoiceCountdown {
    tx: watch::Sender<CountdownState>,
    rx: watch::Receiver<CountdownState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl InvoiceCountdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(CountdownState::Idle);
        Self {
            tx,
            rx,
            ticker: Mutex::new(None),
        }
    }

    /// Watch channel carrying the latest state.
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.rx.clone()
    }

    pub fn state(&self) -> CountdownState {
        self.rx.borrow().clone()
    }

    /// Track a detected invoice.
    pub fn track(&self, invoice: &PendingInvoice) {
        self.start_at(invoice.expires_at);
    }

    /// Track an invoice expiring at a wall-clock instant. An expiration in
    /// the past expires on the first tick.
    pub fn start_at(&self, expires_at: DateTime<Utc>) {
        let remaining = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        self.start_in(remaining);
    }

    /// Track an invoice expiring after `expires_in`.
    pub fn start_in(&self, expires_in: Duration) {
        let deadline = Instant::now() + expires_in;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            loop {
                ticks.tick().await;
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    let _ = tx.send(CountdownState::Expired);
                    return;
                }
                let _ = tx.send(CountdownState::Running {
                    remaining: format_remaining(remaining),
                });
            }
        });

        let mut slot = self.ticker.lock().unwrap();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stop tracking without expiring, e.g. when the card is dismissed.
    pub fn cancel(&self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
        let _ = self.tx.send(CountdownState::Idle);
    }
}

impl Default for InvoiceCountdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InvoiceCountdown {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
    }
}

/// Whole seconds as zero-padded `MM:SS`.
fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
