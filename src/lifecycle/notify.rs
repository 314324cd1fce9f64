use crate::model::leave_request::{LeaveRequest, LeaveRequestId, LeaveStatus};
use crate::model::person::{Person, PersonId};
use std::sync::Mutex;

/// Outbound notices. Fire-and-forget: delivery problems stay inside the sink.
pub trait NotificationSink: Send + Sync {
    fn sign_failure_notice(&self, request_id: LeaveRequestId, message: &str);

    /// `request` reached its current status; `recipients` are the managers to inform.
    fn leave_notice(&self, request: &LeaveRequest, recipients: &[Person]);
}

/// Hands notices to the log pipeline, where mail delivery picks them up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn sign_failure_notice(&self, request_id: LeaveRequestId, message: &str) {
        tracing::warn!(
            target: "notification",
            request_id,
            reason = message,
            "Notifying tool manager about failed signature"
        );
    }

    fn leave_notice(&self, request: &LeaveRequest, recipients: &[Person]) {
        for recipient in recipients {
            tracing::info!(
                target: "notification",
                request_id = request.id,
                status = %request.status,
                recipient_id = recipient.id,
                email = %recipient.email,
                "Notifying manager about leave request"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignFailureNotice {
    pub request_id: LeaveRequestId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveNotice {
    pub request_id: LeaveRequestId,
    pub status: LeaveStatus,
    pub recipient_ids: Vec<PersonId>,
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    notices: Mutex<Vec<SignFailureNotice>>,
    leave_notices: Mutex<Vec<LeaveNotice>>,
}

impl RecordingNotificationSink {
    pub fn notices(&self) -> Vec<SignFailureNotice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn leave_notices(&self) -> Vec<LeaveNotice> {
        self.leave_notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn sign_failure_notice(&self, request_id: LeaveRequestId, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(SignFailureNotice {
                request_id,
                message: message.to_string(),
            });
        }
    }

    fn leave_notice(&self, request: &LeaveRequest, recipients: &[Person]) {
        if let Ok(mut notices) = self.leave_notices.lock() {
            notices.push(LeaveNotice {
                request_id: request.id,
                status: request.status,
                recipient_ids: recipients.iter().map(|person| person.id).collect(),
            });
        }
    }
}
