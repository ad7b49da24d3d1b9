use async_trait::async_trait;

use crate::gateway::NotificationRequest;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AlertKind {
    Scheduled,
    Fired,
    Cancelled,
}

#[async_trait]
pub trait AlertChannel: Send + Sync + 'static {
    async fn deliver(&self, request: &NotificationRequest, kind: AlertKind);
}

/// Writes fired alerts to stdout and everything else to the log.
pub struct ConsoleAlertChannel;

#[async_trait]
impl AlertChannel for ConsoleAlertChannel {
    async fn deliver(&self, request: &NotificationRequest, kind: AlertKind) {
        let text = get_message_text(request, kind);
        match kind {
            AlertKind::Fired => {
                log::info!("Alarm {} fired", request.id);
                println!("{text}");
            }
            AlertKind::Scheduled | AlertKind::Cancelled => {
                log::info!("{} [alarm_id = {}]", text, request.id);
            }
        }
    }
}

fn get_message_text(request: &NotificationRequest, kind: AlertKind) -> String {
    match kind {
        AlertKind::Scheduled => format!(
            "⏱️: Scheduled {} at {:02}:{:02}",
            request.title, request.hour, request.minute
        ),
        AlertKind::Fired => format!("⏰ {}: {}", request.title, request.body),
        AlertKind::Cancelled => format!("❌: Cancelled {}", request.title),
    }
}
