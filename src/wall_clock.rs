use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait WallClock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock that moves with tokio time, so paused-time tests see the
/// calendar advance along with their timers. `skip` moves the wall clock
/// without moving tokio time, like a host waking up from suspend.
#[cfg(test)]
pub(crate) struct TokioClock {
    started_at: DateTime<Utc>,
    started: tokio::time::Instant,
    skipped: std::sync::Mutex<chrono::TimeDelta>,
}

#[cfg(test)]
impl TokioClock {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: tokio::time::Instant::now(),
            skipped: std::sync::Mutex::new(chrono::TimeDelta::zero()),
        }
    }

    pub(crate) fn skip(&self, delta: chrono::TimeDelta) {
        *self.skipped.lock().unwrap() += delta;
    }
}

#[cfg(test)]
impl WallClock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::TimeDelta::from_std(self.started.elapsed()).unwrap();
        self.started_at + elapsed + *self.skipped.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        let before = clock.now();

        tokio::time::sleep(Duration::from_secs(3 * 60 * 60)).await;

        let elapsed = clock.now() - before;
        assert!(elapsed >= chrono::TimeDelta::hours(3));
        assert!(elapsed < chrono::TimeDelta::hours(3) + chrono::TimeDelta::seconds(1));
    }

    #[tokio::test(start_paused = true)]
    async fn skip_moves_only_the_wall_clock() {
        let clock = TokioClock::new();
        let before = clock.now();
        let started = tokio::time::Instant::now();

        clock.skip(chrono::TimeDelta::hours(8));

        assert_eq!(clock.now() - before, chrono::TimeDelta::hours(8));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
