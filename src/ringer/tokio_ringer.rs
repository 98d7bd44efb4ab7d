use std::{cmp, collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use tokio::{
    sync::{RwLock, mpsc, watch},
    task::{self, JoinHandle},
};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    alarm::{Alarm, AlarmId},
    wall_clock::{SystemClock, WallClock},
};

use super::{AlarmRinger, ArmedAlarm, RingerConfig, WakeUpChannel, WakeUpMessage};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);
/// Longest single sleep of an armed alarm. The wall clock is read again after
/// each one, so a suspended host or a clock change is noticed.
const WALL_CLOCK_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
enum RingerEvent {
    Ring { timer: u64 },
    Snooze,
    Dismiss,
    Stop,
}

#[derive(Debug, Clone)]
enum RingState {
    Armed { due: DateTime<Tz> },
    Ringing { due: DateTime<Tz>, rings_left: u8 },
    Snoozed { due: DateTime<Tz> },
    Finished,
}

struct ArmedAlarmHandle {
    task: JoinHandle<()>,
    tx: mpsc::Sender<RingerEvent>,
}

struct CleanupTask(watch::Sender<()>);

type AlarmTaskStore = RwLock<HashMap<AlarmId, ArmedAlarmHandle>>;

/// Runs one task per armed alarm. Wall-clock time is read in `timezone`.
pub struct TokioAlarmRinger {
    tasks: Arc<AlarmTaskStore>,
    channel: Arc<dyn WakeUpChannel>,
    config: RingerConfig,
    timezone: Tz,
    clock: Arc<dyn WallClock>,
    cleanup_task: CleanupTask,
}

impl TokioAlarmRinger {
    pub fn new(channel: Arc<dyn WakeUpChannel>, config: RingerConfig, timezone: Tz) -> Self {
        Self::with_clock(channel, config, timezone, Arc::new(SystemClock))
    }

    pub fn with_clock(
        channel: Arc<dyn WakeUpChannel>,
        config: RingerConfig,
        timezone: Tz,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        let tasks = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&tasks));

        Self {
            tasks,
            channel,
            config,
            timezone,
            clock,
            cleanup_task,
        }
    }

    fn create_alarm_task(&self, alarm: Alarm) -> ArmedAlarmHandle {
        log::info!("Starting task for alarm {}", alarm.id);
        let (tx, rx) = mpsc::channel(16);

        let alarm_task = AlarmTask {
            alarm,
            state: RingState::Finished,
            channel: Arc::clone(&self.channel),
            config: self.config,
            timezone: self.timezone,
            clock: Arc::clone(&self.clock),
            tx: tx.clone(),
            timer: None,
            timer_generation: 0,
        };
        let task = task::spawn(alarm_task.run(rx));

        ArmedAlarmHandle { task, tx }
    }

    fn spawn_cleanup_task(tasks: Arc<AlarmTaskStore>) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(CLEANUP_INTERVAL) => {
                        Self::clean_finished_tasks(&tasks).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::info!("Cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown_tx)
    }

    async fn clean_finished_tasks(tasks: &AlarmTaskStore) {
        let mut tasks = tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, handle| !handle.task.is_finished());
        let after = tasks.len();

        if before != after {
            log::info!("Cleaned up {} finished alarm tasks", before - after);
        }
    }

    async fn send(&self, armed_alarm: &ArmedAlarm, event: RingerEvent) -> anyhow::Result<()> {
        let tasks = self.tasks.read().await;
        let Some(handle) = tasks.get(&armed_alarm.id) else {
            anyhow::bail!("Alarm {} is not armed", armed_alarm.id);
        };

        if handle.tx.send(event).await.is_err() {
            anyhow::bail!("Alarm {} is no longer armed", armed_alarm.id);
        }

        Ok(())
    }
}

impl Drop for TokioAlarmRinger {
    fn drop(&mut self) {
        let _ = self.cleanup_task.0.send(());
        if let Ok(tasks) = self.tasks.try_read() {
            for handle in tasks.values() {
                handle.task.abort();
            }
        }
    }
}

#[async_trait]
impl AlarmRinger for TokioAlarmRinger {
    async fn arm(&self, alarm: Alarm) -> anyhow::Result<ArmedAlarm> {
        let id = alarm.id;
        let mut tasks = self.tasks.write().await;
        if tasks.get(&id).is_some_and(|handle| !handle.task.is_finished()) {
            anyhow::bail!("Alarm {} is already armed", id);
        }

        tasks.insert(id, self.create_alarm_task(alarm));

        Ok(ArmedAlarm { id })
    }

    async fn disarm(&self, armed_alarm: &ArmedAlarm) -> anyhow::Result<()> {
        let Some(handle) = self.tasks.write().await.remove(&armed_alarm.id) else {
            anyhow::bail!("Alarm {} is not armed", armed_alarm.id);
        };

        if handle.task.is_finished() {
            return Ok(());
        }
        handle.tx.send(RingerEvent::Stop).await?;

        Ok(())
    }

    async fn snooze(&self, armed_alarm: &ArmedAlarm) -> anyhow::Result<()> {
        self.send(armed_alarm, RingerEvent::Snooze).await
    }

    async fn dismiss(&self, armed_alarm: &ArmedAlarm) -> anyhow::Result<()> {
        self.send(armed_alarm, RingerEvent::Dismiss).await
    }
}

struct AlarmTask {
    alarm: Alarm,
    state: RingState,
    channel: Arc<dyn WakeUpChannel>,
    config: RingerConfig,
    timezone: Tz,
    clock: Arc<dyn WallClock>,
    tx: mpsc::Sender<RingerEvent>,
    /// Dropping the guard cancels the pending timer.
    timer: Option<DropGuard>,
    timer_generation: u64,
}

impl AlarmTask {
    async fn run(mut self, mut rx: mpsc::Receiver<RingerEvent>) {
        let now = self.now();
        self.state = self.arm_from(&now).await;

        while !matches!(self.state, RingState::Finished) {
            let Some(event) = rx.recv().await else {
                break;
            };
            self.state = self.handle_event(event).await;
        }

        self.cancel_timer();
        log::info!("Task for alarm {} finished", self.alarm.id);
    }

    async fn handle_event(&mut self, event: RingerEvent) -> RingState {
        let id = self.alarm.id;
        match (self.state.clone(), event) {
            (_, RingerEvent::Stop) => {
                self.cancel_timer();
                self.deliver(WakeUpMessage::Disarmed).await;

                RingState::Finished
            }
            (RingState::Armed { due }, RingerEvent::Ring { timer }) if self.is_current(timer) => {
                let remaining = self.remaining_until(&due);
                if remaining.is_zero() {
                    return self.start_ringing(due).await;
                }

                log::debug!("Alarm {} is not due yet, {:?} left", id, remaining);
                self.schedule_ring(remaining.min(WALL_CLOCK_CHECK_INTERVAL));

                RingState::Armed { due }
            }
            (RingState::Snoozed { due }, RingerEvent::Ring { timer }) if self.is_current(timer) => {
                self.start_ringing(due).await
            }
            (RingState::Ringing { due, rings_left: 0 }, RingerEvent::Ring { timer })
                if self.is_current(timer) =>
            {
                log::info!("[MISSED] Alarm {} was not answered", id);
                self.deliver(WakeUpMessage::Missed).await;

                self.rearm_after(due).await
            }
            (RingState::Ringing { due, rings_left }, RingerEvent::Ring { timer })
                if self.is_current(timer) =>
            {
                self.deliver(WakeUpMessage::Ringing).await;
                self.schedule_ring(self.config.ring_interval);

                RingState::Ringing {
                    due,
                    rings_left: rings_left - 1,
                }
            }
            (RingState::Ringing { due, .. }, RingerEvent::Snooze) => {
                let snooze = self.alarm.snooze.as_duration();
                log::info!("[SNOOZED] Alarm {} rings again in {:?}", id, snooze);

                self.deliver(WakeUpMessage::Snoozed).await;
                self.schedule_ring(snooze);

                RingState::Snoozed { due }
            }
            (RingState::Ringing { due, .. } | RingState::Snoozed { due }, RingerEvent::Dismiss) => {
                self.cancel_timer();
                log::info!("[DISMISSED] Alarm {}", id);
                self.deliver(WakeUpMessage::Dismissed).await;

                self.rearm_after(due).await
            }
            (state, RingerEvent::Ring { timer }) if !self.is_current(timer) => {
                log::debug!("Ignoring stale timer {} for alarm {}", timer, id);

                state
            }
            (state, event) => {
                log::warn!(
                    "Received unknown state and event combination for alarm. [state = {:?}, event = {:?}, alarm_id = {}]",
                    state,
                    event,
                    id
                );

                state
            }
        }
    }

    async fn start_ringing(&mut self, due: DateTime<Tz>) -> RingState {
        log::info!(
            "[RINGING] Alarm {} \"{}\" (vibration = {})",
            self.alarm.id,
            self.alarm.label,
            self.alarm.vibration
        );
        self.deliver(WakeUpMessage::Ringing).await;
        self.schedule_ring(self.config.ring_interval);

        RingState::Ringing {
            due,
            rings_left: self.config.ring_attempts,
        }
    }

    async fn arm_from(&mut self, from: &DateTime<Tz>) -> RingState {
        let Some(due) = self.alarm.next_occurrence(from) else {
            log::warn!("Alarm {} has no upcoming occurrence", self.alarm.id);
            return RingState::Finished;
        };

        let delay = self.remaining_until(&due);
        log::info!(
            "[ARMED] Alarm {} rings at {}. Sleeping for {:?}",
            self.alarm.id,
            due,
            delay
        );

        self.deliver(WakeUpMessage::Armed).await;
        self.schedule_ring(delay.min(WALL_CLOCK_CHECK_INTERVAL));

        RingState::Armed { due }
    }

    /// One-shot alarms are done once answered or missed; repeating ones wait
    /// for the occurrence after the slot that just rang.
    async fn rearm_after(&mut self, due: DateTime<Tz>) -> RingState {
        if self.alarm.is_one_shot() {
            self.cancel_timer();
            return RingState::Finished;
        }

        let from = cmp::max(self.now(), due);
        self.arm_from(&from).await
    }

    fn schedule_ring(&mut self, delay: Duration) {
        self.timer_generation += 1;
        let timer = self.timer_generation;
        let tx = self.tx.clone();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        task::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(RingerEvent::Ring { timer }).await;
                }
            }
        });

        self.timer = Some(token.drop_guard());
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }

    fn is_current(&self, timer: u64) -> bool {
        timer == self.timer_generation
    }

    fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.timezone)
    }

    fn remaining_until(&self, due: &DateTime<Tz>) -> Duration {
        (due.clone() - self.now()).to_std().unwrap_or_default()
    }

    async fn deliver(&self, message: WakeUpMessage) {
        if let Err(error) = self.channel.deliver(&self.alarm, message).await {
            log::warn!(
                "Could not deliver wake-up message. [alarm_id = {}, message = {:?}, error = {}]",
                self.alarm.id,
                message,
                error
            );
        }
    }
}
