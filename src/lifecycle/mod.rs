//! Leave request state machine: submission, decisions, withdrawal and the
//! best-effort attestation of those steps.

pub mod error;
pub mod linker;
pub mod notify;
pub mod recipients;
pub mod signer;
pub mod working_time;

use crate::clock::Clock;
use crate::model::leave_request::{
    LeaveRequest, LeaveRequestDraft, LeaveRequestId, LeaveStatus,
};
use crate::model::person::Person;
use crate::store::{Backend, LeaveRequestFilter, StoreError};
use chrono::Datelike;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub use error::LifecycleError;
use linker::{SupplementalLinker, plan_shadows};
use notify::NotificationSink;
use recipients::recipients_for;
use signer::{KeyedSigner, sign_request};
use working_time::WorkingTimeCalculator;

/// Which signature slot an attestation fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureSlot {
    Submitter,
    Approver,
}

pub struct ApplicationLifecycle {
    store: Arc<dyn Backend>,
    linker: SupplementalLinker<dyn Backend>,
    calculator: Arc<dyn WorkingTimeCalculator>,
    signer: Arc<dyn KeyedSigner>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl ApplicationLifecycle {
    pub fn new(
        store: Arc<dyn Backend>,
        calculator: Arc<dyn WorkingTimeCalculator>,
        signer: Arc<dyn KeyedSigner>,
        notifications: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            linker: SupplementalLinker::new(store.clone()),
            store,
            calculator,
            signer,
            notifications,
            clock,
        }
    }

    pub async fn find(&self, id: LeaveRequestId) -> Result<LeaveRequest, LifecycleError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("leave request {}", id)))
    }

    pub async fn list(
        &self,
        filter: &LeaveRequestFilter,
    ) -> Result<Vec<LeaveRequest>, LifecycleError> {
        Ok(self.store.list(filter).await?)
    }

    /// Creates a `Waiting` request for `subject`, priced by the working-time
    /// calculator. Year-crossing requests get their two supplemental shadows,
    /// stored together with the request. A request may not claim a half day
    /// that an open request of the same person already holds.
    #[instrument(
        name = "leave_submit",
        skip(self, draft, subject, submitter),
        fields(person_id = subject.id, submitter_id = submitter.id)
    )]
    pub async fn submit(
        &self,
        draft: LeaveRequestDraft,
        subject: &Person,
        submitter: &Person,
    ) -> Result<LeaveRequest, LifecycleError> {
        validate_draft(&draft)?;

        let category = self
            .store
            .categories()
            .await?
            .into_iter()
            .find(|category| category.id == draft.category_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("leave category {}", draft.category_id))
            })?;

        if !category.active {
            return Err(LifecycleError::InvalidRequest(format!(
                "leave category {} is inactive",
                category.message_key
            )));
        }

        let clash = self
            .store
            .open_in_range(&[subject.id], draft.period())
            .await?
            .into_iter()
            .find(|open| open.day_length.shares_half_with(draft.day_length));
        if let Some(open) = clash {
            return Err(LifecycleError::InvalidRequest(format!(
                "overlaps leave request {} from {} to {}",
                open.id, open.start_date, open.end_date
            )));
        }

        let quantity = self
            .calculator
            .quantity(subject.id, draft.period(), draft.day_length, category.unit)
            .await?;

        let mut request = LeaveRequest::from_draft(
            draft,
            subject.id,
            submitter.id,
            category,
            quantity,
            self.clock.now(),
        );
        let shadows = plan_shadows(&request, self.calculator.as_ref()).await?;
        request.id = self.store.insert(&request, &shadows).await?;

        info!(
            request_id = request.id,
            quantity = %request.quantity().amount(),
            supplementals = shadows.len(),
            "Leave request submitted"
        );
        self.announce(&request).await;
        Ok(request)
    }

    /// First stage of a two-stage approval.
    #[instrument(name = "leave_temporarily_allow", skip(self, approver), fields(approver_id = approver.id))]
    pub async fn temporarily_allow(
        &self,
        id: LeaveRequestId,
        approver: &Person,
    ) -> Result<LeaveRequest, LifecycleError> {
        let mut request = self.find(id).await?;

        if !request.two_stage_approval {
            return Err(LifecycleError::InvalidRequest(format!(
                "leave request {} does not require two-stage approval",
                id
            )));
        }

        request.transition(LeaveStatus::TemporarilyAllowed)?;
        request.approver_id = Some(approver.id);
        request.decided_at = Some(self.clock.now());

        self.save(&mut request).await?;
        info!(request_id = id, "Leave request temporarily allowed");
        self.announce(&request).await;
        Ok(request)
    }

    /// Allows the request and tries to attest it with the approver's key.
    /// A failed signature leaves the slot empty but never blocks the approval.
    #[instrument(name = "leave_approve", skip(self, approver), fields(approver_id = approver.id))]
    pub async fn approve(
        &self,
        id: LeaveRequestId,
        approver: &Person,
    ) -> Result<LeaveRequest, LifecycleError> {
        let mut request = self.find(id).await?;

        request.transition(LeaveStatus::Allowed)?;
        request.approver_id = Some(approver.id);
        request.decided_at = Some(self.clock.now());

        let subject = self.subject_of(&request).await?;
        self.attest(&mut request, approver, &subject, SignatureSlot::Approver);

        self.save(&mut request).await?;
        info!(
            request_id = id,
            signed = request.approver_signature.is_some(),
            "Leave request allowed"
        );
        self.announce(&request).await;
        Ok(request)
    }

    #[instrument(name = "leave_reject", skip(self, approver), fields(approver_id = approver.id))]
    pub async fn reject(
        &self,
        id: LeaveRequestId,
        approver: &Person,
    ) -> Result<LeaveRequest, LifecycleError> {
        let now = self.clock.now();
        self.close(id, LeaveStatus::Rejected, |request| {
            request.approver_id = Some(approver.id);
            request.decided_at = Some(now);
        })
        .await
    }

    #[instrument(name = "leave_cancel", skip(self))]
    pub async fn cancel(&self, id: LeaveRequestId) -> Result<LeaveRequest, LifecycleError> {
        let now = self.clock.now();
        self.close(id, LeaveStatus::Cancelled, |request| {
            request.cancelled_at = Some(now);
        })
        .await
    }

    /// Withdrawal by the applicant before the request was allowed.
    #[instrument(name = "leave_revoke", skip(self))]
    pub async fn revoke(&self, id: LeaveRequestId) -> Result<LeaveRequest, LifecycleError> {
        let now = self.clock.now();
        self.close(id, LeaveStatus::Revoked, |request| {
            request.cancelled_at = Some(now);
        })
        .await
    }

    /// Fills the submitter signature slot. Failures are reported, not returned.
    #[instrument(name = "leave_sign_submission", skip(self, submitter), fields(submitter_id = submitter.id))]
    pub async fn sign_submission(
        &self,
        id: LeaveRequestId,
        submitter: &Person,
    ) -> Result<LeaveRequest, LifecycleError> {
        let mut request = self.find(id).await?;
        let subject = self.subject_of(&request).await?;

        if self.attest(&mut request, submitter, &subject, SignatureSlot::Submitter) {
            self.save(&mut request).await?;
        }
        Ok(request)
    }

    /// Moves the request into a terminal state and mirrors it on the shadows.
    async fn close(
        &self,
        id: LeaveRequestId,
        status: LeaveStatus,
        stamp: impl FnOnce(&mut LeaveRequest),
    ) -> Result<LeaveRequest, LifecycleError> {
        let mut request = self.find(id).await?;

        request.transition(status)?;
        stamp(&mut request);

        let pair = self.linker.pair_for(&request).await?;
        self.save(&mut request).await?;
        self.linker.apply(&pair, status).await?;

        info!(request_id = id, status = %status, "Leave request closed");
        self.announce(&request).await;
        Ok(request)
    }

    /// Tells the managers of the request's person about its new status.
    /// Recipient lookup failures are logged and never undo the change.
    async fn announce(&self, request: &LeaveRequest) {
        let recipients = match self.store.person(request.person_id).await {
            Ok(Some(subject)) => recipients_for(self.store.as_ref(), &subject).await,
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
        match recipients {
            Ok(recipients) => self.notifications.leave_notice(request, &recipients),
            Err(e) => warn!(
                request_id = request.id,
                error = %e,
                "Could not resolve notification recipients"
            ),
        }
    }

    async fn subject_of(&self, request: &LeaveRequest) -> Result<Person, LifecycleError> {
        self.store
            .person(request.person_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("person {}", request.person_id)))
    }

    /// Signs into `slot`; returns whether a signature was stored.
    fn attest(
        &self,
        request: &mut LeaveRequest,
        actor: &Person,
        subject: &Person,
        slot: SignatureSlot,
    ) -> bool {
        match sign_request(self.signer.as_ref(), actor, subject, request) {
            Ok(signature) => {
                match slot {
                    SignatureSlot::Submitter => request.submitter_signature = Some(signature),
                    SignatureSlot::Approver => request.approver_signature = Some(signature),
                }
                true
            }
            Err(e) => {
                error!(
                    target: "sign",
                    request_id = request.id,
                    person_id = actor.id,
                    error = %e,
                    "An error occurred while signing leave request"
                );
                self.notifications
                    .sign_failure_notice(request.id, &e.to_string());
                false
            }
        }
    }

    async fn save(&self, request: &mut LeaveRequest) -> Result<(), LifecycleError> {
        match self.store.update(request).await {
            Ok(version) => {
                request.version = version;
                Ok(())
            }
            Err(StoreError::Conflict) => {
                warn!(request_id = request.id, "Concurrent modification rejected");
                Err(LifecycleError::ConcurrentModification(request.id))
            }
            Err(StoreError::NotFound) => Err(LifecycleError::NotFound(format!(
                "leave request {}",
                request.id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_draft(draft: &LeaveRequestDraft) -> Result<(), LifecycleError> {
    if draft.end_date < draft.start_date {
        return Err(LifecycleError::InvalidRequest(
            "end date lies before start date".to_string(),
        ));
    }

    if draft.end_date.year() - draft.start_date.year() > 1 {
        return Err(LifecycleError::InvalidRequest(
            "a leave request may touch at most two calendar years".to_string(),
        ));
    }

    if let (Some(start), Some(end)) = (draft.start_time, draft.end_time) {
        if draft.start_date == draft.end_date && end <= start {
            return Err(LifecycleError::InvalidRequest(
                "end time lies before start time".to_string(),
            ));
        }
    }

    Ok(())
}
