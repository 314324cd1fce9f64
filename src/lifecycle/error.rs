use crate::model::leave_request::{InvalidTransition, LeaveRequestId, LeaveStatus};
use crate::store::StoreError;
use derive_more::Display;

#[derive(Debug, Display)]
pub enum LifecycleError {
    #[display(fmt = "cannot move leave request from {} to {}", from, to)]
    InvalidTransition { from: LeaveStatus, to: LeaveStatus },
    #[display(fmt = "invalid leave request: {}", _0)]
    InvalidRequest(String),
    #[display(fmt = "{} not found", _0)]
    NotFound(String),
    #[display(fmt = "data integrity violation: {}", _0)]
    DataIntegrity(String),
    #[display(fmt = "leave request {} was modified concurrently", _0)]
    ConcurrentModification(LeaveRequestId),
    #[display(fmt = "storage error: {}", _0)]
    Store(StoreError),
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifecycleError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvalidTransition> for LifecycleError {
    fn from(value: InvalidTransition) -> Self {
        LifecycleError::InvalidTransition {
            from: value.from,
            to: value.to,
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        LifecycleError::Store(value)
    }
}
