use std::{sync::Arc, time::Duration};

use budilnik::{
    alarm::AlarmTime,
    alarm_clock::{AlarmClock, SyncedWakeUpChannel},
    appsettings::AppSettings,
    log_channel::LogWakeUpChannel,
    ringer::{AlarmRinger, TokioAlarmRinger},
    storage::{AlarmStorage, InMemoryAlarmStorage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new()?;
    let timezone = settings.clock.timezone()?;
    log::info!("Starting alarm clock in {}", timezone);

    let storage: Arc<dyn AlarmStorage> = Arc::new(InMemoryAlarmStorage::new());
    let channel = SyncedWakeUpChannel::new(Arc::clone(&storage), Arc::new(LogWakeUpChannel));
    let ringer: Arc<dyn AlarmRinger> = Arc::new(TokioAlarmRinger::new(
        Arc::new(channel),
        settings.ringer.config(),
        timezone,
    ));
    let clock = AlarmClock::new(storage, ringer, timezone, settings.countdown);

    for seed in &settings.alarms {
        clock.add(seed.to_new_alarm()?).await?;
    }

    let mut refresh = tokio::time::interval(Duration::from_secs(settings.clock.refresh_secs.max(1)));
    loop {
        tokio::select! {
            _ = refresh.tick() => report_next_alarm(&clock).await,
            result = tokio::signal::ctrl_c() => {
                result?;
                log::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn report_next_alarm(clock: &AlarmClock) {
    let now = clock.now();
    let time = AlarmTime::from_wall_clock(now.time());

    match clock.next_alarm_at(&now).await {
        Some((alarm, at)) => log::info!(
            "{} {}. Next: \"{}\" on {}. {}",
            time,
            now.format("%a, %d %b %Y"),
            alarm.label,
            at.format("%a %H:%M"),
            clock.countdown_at(&alarm, &now)
        ),
        None => log::info!("{} {}. No alarms set.", time, now.format("%a, %d %b %Y")),
    }
}
