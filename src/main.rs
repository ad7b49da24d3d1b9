use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::sync::broadcast;

use budilnik::{
    alarm::Alarm,
    appsettings::AppSettings,
    gateway::NotificationGateway,
    scheduling::{ConsoleAlertChannel, LocalAlarmScheduler},
    storage::{AlarmEvent, AlarmStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new()?;
    let options = settings.scheduler_options()?;
    log::info!(
        "Starting budilnik. [timezone = {}, repeat_policy = {:?}]",
        options.timezone,
        options.repeat_policy
    );

    let scheduler = Arc::new(LocalAlarmScheduler::new(
        Arc::new(ConsoleAlertChannel),
        options,
    ));
    request_notification_permission(scheduler.as_ref()).await;

    let store = AlarmStore::new(scheduler);
    tokio::spawn(log_alarm_events(store.subscribe()));

    for new_alarm in settings.seed_alarms()? {
        store.add(new_alarm).await;
    }
    print_alarms(&store.list().await);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");

    Ok(())
}

/// Runs once before the store is touched. A refusal only gets logged; alarms
/// are still accepted but will not alert.
async fn request_notification_permission(gateway: &dyn NotificationGateway) {
    match gateway.request_authorization().await {
        Ok(true) => log::info!("Notifications authorized"),
        Ok(false) => log::warn!("Notifications were not authorized, alarms will not alert"),
        Err(error) => log::error!("Notification authorization failed: {error:#}"),
    }
}

async fn log_alarm_events(mut events: broadcast::Receiver<AlarmEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => log::debug!("Alarm list changed: {event:?}"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Alarm event listener skipped {skipped} events")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_alarms(alarms: &[Alarm]) {
    if alarms.is_empty() {
        println!("No alarms configured.");
        return;
    }

    for alarm in alarms {
        let state = if alarm.is_enabled { "on" } else { "off" };
        println!(
            "#{:<3} {}  {:<3}  {:<28}  {}",
            alarm.id,
            alarm.time_string(),
            state,
            alarm.repeat_days.to_string(),
            alarm.label
        );
    }
}
