//! Ticking due-date countdown owned by its handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use classroom_core::Clock;
use classroom_core::countdown::CountdownState;
use classroom_core::model::AssignmentId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// Publishes the countdown of one assignment every second.
///
/// At most one task runs per timer. It is aborted by `stop`, by `retarget`
/// and when the timer is dropped, and it ends by itself once the deadline
/// passes. Must be used inside a tokio runtime.
pub struct CountdownTimer {
    clock: Clock,
    assignment_id: Option<AssignmentId>,
    tx: watch::Sender<CountdownState>,
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl CountdownTimer {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        let (tx, _rx) = watch::channel(CountdownState::NoDeadline);
        Self {
            clock,
            assignment_id: None,
            tx,
            task: None,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a timer already counting down to `due_date`.
    #[must_use]
    pub fn start(clock: Clock, assignment_id: AssignmentId, due_date: Option<DateTime<Utc>>) -> Self {
        let mut timer = Self::new(clock);
        timer.retarget(assignment_id, due_date);
        timer
    }

    /// Switches to another assignment, aborting the previous task first.
    pub fn retarget(&mut self, assignment_id: AssignmentId, due_date: Option<DateTime<Utc>>) {
        self.stop();
        self.assignment_id = Some(assignment_id);

        let base = self.clock.now();
        let initial = CountdownState::at(due_date, base);
        self.tx.send_replace(initial);

        let Some(due) = due_date.filter(|_| initial.is_running()) else {
            tracing::debug!(%assignment_id, state = %initial, "countdown not started");
            return;
        };

        let tx = self.tx.clone();
        let ticks = Arc::clone(&self.ticks);
        let started = Instant::now();
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let state = CountdownState::at(Some(due), wall_now(base, started));
                ticks.fetch_add(1, Ordering::Relaxed);
                tx.send_replace(state);
                if !state.is_running() {
                    tracing::debug!(%assignment_id, "deadline reached");
                    break;
                }
            }
        }));
    }

    /// Aborts the running task, if any. The last published state stays visible.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn current(&self) -> CountdownState {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    #[must_use]
    pub fn assignment_id(&self) -> Option<AssignmentId> {
        self.assignment_id
    }

    /// Number of ticks published since the timer was created.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wall_now(base: DateTime<Utc>, started: Instant) -> DateTime<Utc> {
    TimeDelta::from_std(started.elapsed())
        .ok()
        .and_then(|elapsed| base.checked_add_signed(elapsed))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::countdown::Remaining;
    use classroom_core::time::{fixed_clock, fixed_now};

    fn running(seconds: i64) -> CountdownState {
        CountdownState::Running(Remaining {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_second_and_freezes_at_deadline() {
        let due = fixed_now() + TimeDelta::seconds(3);
        let timer = CountdownTimer::start(fixed_clock(), AssignmentId::new(1), Some(due));
        let mut rx = timer.subscribe();
        assert_eq!(*rx.borrow_and_update(), running(3));
        assert!(timer.is_running());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), running(2));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), running(1));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), CountdownState::Expired);
        assert_eq!(timer.current().to_string(), "00:00:00");
        assert_eq!(timer.ticks(), 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.ticks(), 3);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_due_date_starts_no_task() {
        let timer = CountdownTimer::start(fixed_clock(), AssignmentId::new(1), None);
        assert_eq!(timer.current(), CountdownState::NoDeadline);
        assert!(!timer.is_running());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn past_due_date_is_expired_immediately() {
        let due = fixed_now() - TimeDelta::minutes(5);
        let timer = CountdownTimer::start(fixed_clock(), AssignmentId::new(1), Some(due));
        assert_eq!(timer.current(), CountdownState::Expired);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn retarget_aborts_previous_task() {
        let due = fixed_now() + TimeDelta::hours(1);
        let mut timer = CountdownTimer::start(fixed_clock(), AssignmentId::new(1), Some(due));
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(timer.ticks(), 2);

        timer.retarget(AssignmentId::new(2), None);
        assert_eq!(timer.assignment_id(), Some(AssignmentId::new(2)));
        assert_eq!(timer.current(), CountdownState::NoDeadline);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.ticks(), 2);
        assert_eq!(timer.current(), CountdownState::NoDeadline);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_stops_publishing() {
        let due = fixed_now() + TimeDelta::hours(1);
        let timer = CountdownTimer::start(fixed_clock(), AssignmentId::new(1), Some(due));
        let mut rx = timer.subscribe();
        drop(timer);
        assert!(rx.changed().await.is_err());
    }
}
