use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Publishes elapsed time since `start` once per period.
///
/// Every tick recomputes from the captured start instant instead of adding
/// up periods, so a late or missed tick does not drift the clock.
#[derive(Debug)]
pub struct ElapsedTicker {
    handle: JoinHandle<()>,
    rx: watch::Receiver<Duration>,
}

impl ElapsedTicker {
    pub fn spawn<F>(start: Instant, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        let (tx, rx) = watch::channel(start.elapsed());
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let elapsed = start.elapsed();
                on_tick(elapsed);
                if tx.send(elapsed).is_err() {
                    break;
                }
            }
        });
        Self { handle, rx }
    }

    /// Last published value.
    pub fn elapsed(&self) -> Duration {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.rx.clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    #[tokio::test(start_paused = true)]
    async fn publishes_elapsed_from_start() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = ticks.clone();
        let ticker = ElapsedTicker::spawn(Instant::now(), DEFAULT_TICK, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticker.elapsed().as_secs(), 3);
        // immediate first tick plus one per second
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_value() {
        let ticker = ElapsedTicker::spawn(Instant::now(), DEFAULT_TICK, |_| {});
        time::sleep(Duration::from_millis(1500)).await;
        ticker.stop();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticker.elapsed().as_secs(), 1);
        assert!(ticker.is_stopped());
    }
}
