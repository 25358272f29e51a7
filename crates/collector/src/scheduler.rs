use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::collector::Collector;

/// Periodic driver for [`Collector::run_cycle`].
pub struct Scheduler {
    collector: Arc<Collector>,
    period: Duration,
}

/// Stops the timer of a started scheduler. Cycles already in flight finish
/// on their own.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "scheduler task ended abnormally");
        }
    }
}

impl Scheduler {
    pub fn new(collector: Arc<Collector>, period: Duration) -> Self {
        Self { collector, period }
    }

    /// Run one cycle to completion before returning, then spawn a fresh cycle
    /// every `period`. Ticks are not delayed by running cycles, so slow
    /// cycles may overlap.
    pub async fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let Scheduler { collector, period } = self;

        tracing::info!(period_secs = period.as_secs(), "scheduler starting");
        collector.run_cycle().await;

        let mut ticker = interval_at(Instant::now() + period, period);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let collector = collector.clone();
                        tokio::spawn(async move {
                            collector.run_cycle().await;
                        });
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("scheduler stopped");
        });

        SchedulerHandle { stop_tx, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::tests::{projects, FakeSource, MemoryRepo};
    use std::sync::atomic::Ordering;

    const PERIOD: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_every_period() {
        let source = FakeSource::new(&[]);
        let repo = Arc::new(MemoryRepo::default());
        let collector = Arc::new(Collector::new(source.clone(), repo.clone(), projects()));

        let handle = Scheduler::new(collector, PERIOD).start().await;
        assert_eq!(repo.items.lock().unwrap().len(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(repo.items.lock().unwrap().len(), 2);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(repo.items.lock().unwrap().len(), 4);

        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(repo.items.lock().unwrap().len(), 8);
        assert_eq!(source.calls.load(Ordering::SeqCst), 8);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_timer() {
        let repo = Arc::new(MemoryRepo::default());
        let collector = Arc::new(Collector::new(FakeSource::new(&[]), repo.clone(), projects()));

        let handle = Scheduler::new(collector, PERIOD).start().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop().await;

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(repo.items.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_cycles_keep_the_schedule() {
        let source = FakeSource::new(&["org_alpha", "org_beta"]);
        let repo = Arc::new(MemoryRepo::default());
        let collector = Arc::new(Collector::new(source.clone(), repo.clone(), projects()));

        let handle = Scheduler::new(collector, PERIOD).start().await;
        tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert!(repo.items.lock().unwrap().is_empty());
        handle.stop().await;
    }
}
