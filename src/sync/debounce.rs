//! Coalescing timer for bursty triggers.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};

/// Which end of the quiet window fires the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Fire immediately on the first trigger, absorb the rest of the window.
    Leading,
    /// Fire once the triggers have been quiet for the whole window, with the
    /// last trigger's payload.
    Trailing,
}

/// Debounced invocation of an async action.
///
/// `call` may be invoked arbitrarily often from any task; bursts within the
/// window collapse into a single action run. Dropping the debouncer cancels
/// the worker and any pending trailing invocation, but not an action that
/// already started.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Must be called from within a tokio runtime.
    pub fn new<F, Fut>(window: Duration, edge: Edge, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = match edge {
            Edge::Trailing => tokio::spawn(run_trailing(window, rx, action)),
            Edge::Leading => tokio::spawn(run_leading(window, rx, action)),
        };
        Self { tx, worker }
    }

    pub fn call(&self, value: T) {
        // The worker only goes away when the debouncer is dropped.
        let _ = self.tx.send(value);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_trailing<T, F, Fut>(window: Duration, mut rx: mpsc::UnboundedReceiver<T>, action: F)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    while let Some(mut last) = rx.recv().await {
        loop {
            match timeout(window, rx.recv()).await {
                // A newer trigger resets the quiet window.
                Ok(Some(value)) => last = value,
                Ok(None) => {
                    action(last).await;
                    return;
                }
                Err(_) => break,
            }
        }
        action(last).await;
    }
}

async fn run_leading<T, F, Fut>(window: Duration, mut rx: mpsc::UnboundedReceiver<T>, action: F)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    while let Some(first) = rx.recv().await {
        action(first).await;
        let deadline = Instant::now() + window;
        loop {
            match timeout_at(deadline, rx.recv()).await {
                // Absorbed.
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::{advance, sleep};

    fn counting_debouncer(
        window: Duration,
        edge: Edge,
    ) -> (Debouncer<u32>, Arc<AtomicUsize>, Arc<Mutex<Vec<u32>>>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (count2, seen2) = (count.clone(), seen.clone());
        let debouncer = Debouncer::new(window, edge, move |value: u32| {
            let (count, seen) = (count2.clone(), seen2.clone());
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(value);
            }
        });
        (debouncer, count, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_burst_collapses_to_last_payload() {
        let (debouncer, count, seen) = counting_debouncer(Duration::from_secs(3), Edge::Trailing);

        for n in 1..=5 {
            debouncer.call(n);
            advance(Duration::from_millis(100)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(4)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_fires_again_after_quiet_period() {
        let (debouncer, count, _) = counting_debouncer(Duration::from_secs(3), Edge::Trailing);

        debouncer.call(1);
        sleep(Duration::from_secs(4)).await;
        debouncer.call(2);
        sleep(Duration::from_secs(4)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn leading_fires_immediately_and_absorbs_window() {
        let (debouncer, count, seen) = counting_debouncer(Duration::from_secs(5), Edge::Leading);

        debouncer.call(1);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        debouncer.call(2);
        debouncer.call(3);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn leading_fires_for_a_new_burst_after_the_window() {
        let (debouncer, count, seen) = counting_debouncer(Duration::from_secs(5), Edge::Leading);

        debouncer.call(1);
        sleep(Duration::from_secs(6)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
