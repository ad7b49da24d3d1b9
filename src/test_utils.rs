use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::{
    alarm::{Alarm, AlarmId},
    gateway::{NotificationContent, NotificationGateway, NotificationRequest, SchedulingError},
    scheduling::{AlertChannel, AlertKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Schedule(NotificationRequest),
    Cancel(AlarmId),
}

/// Gateway that records every call and can be switched into failing mode.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    failing: AtomicBool,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.set_failing(true);
        gateway
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GatewayCall) -> Result<(), SchedulingError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("gateway unavailable").into());
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn request_authorization(&self) -> Result<bool, SchedulingError> {
        Ok(true)
    }

    async fn schedule(&self, alarm: &Alarm) -> Result<(), SchedulingError> {
        let request = NotificationRequest::from_alarm(alarm, &NotificationContent::default());
        self.record(GatewayCall::Schedule(request))
    }

    async fn cancel(&self, id: AlarmId) -> Result<(), SchedulingError> {
        self.record(GatewayCall::Cancel(id))
    }
}

pub struct SilentAlertChannel;

#[async_trait]
impl AlertChannel for SilentAlertChannel {
    async fn deliver(&self, _request: &NotificationRequest, _kind: AlertKind) {}
}
