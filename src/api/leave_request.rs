use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::category::CategoryColor;
use crate::model::leave_request::{LeaveRequest, LeaveRequestDraft, LeaveStatus};
use crate::model::period::{DateRange, DayLength};
use crate::model::person::Person;
use crate::model::role::Role;
use crate::state::AppState;
use crate::store::LeaveRequestFilter;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Person the leave is for, defaults to the caller. Only the office may
    /// apply on behalf of somebody else.
    #[schema(example = 1000)]
    pub person_id: Option<u64>,
    #[schema(example = 1)]
    pub category_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "08:00:00", value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "12:00:00", value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "full", value_type = Option<String>)]
    pub day_length: Option<DayLength>,
    #[serde(default)]
    pub two_stage_approval: bool,
    /// Who covers for the applicant
    pub holiday_replacement_notes: Option<String>,
}

impl CreateLeave {
    fn into_draft(self) -> LeaveRequestDraft {
        LeaveRequestDraft {
            category_id: self.category_id,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            day_length: self.day_length.unwrap_or(DayLength::Full),
            two_stage_approval: self.two_stage_approval,
            holiday_replacement_notes: self.holiday_replacement_notes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    /// person the leave is for
    #[schema(example = 1000)]
    pub person_id: u64,
    #[schema(example = 1000)]
    pub submitter_id: u64,
    #[schema(example = 7)]
    pub approver_id: Option<u64>,
    #[schema(example = "waiting", value_type = String)]
    pub status: LeaveStatus,
    #[schema(example = 1)]
    pub category_id: u64,
    #[schema(example = "holiday")]
    pub category: String,
    pub color: CategoryColor,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "2026-01-05T08:00:00", value_type = Option<String>)]
    pub start_date_time: Option<NaiveDateTime>,
    #[schema(example = "2026-01-09T12:00:00", value_type = Option<String>)]
    pub end_date_time: Option<NaiveDateTime>,
    #[schema(example = "full", value_type = String)]
    pub day_length: DayLength,
    /// Working days or hours, depending on the category
    #[schema(example = "5")]
    pub quantity: String,
    /// Share of the quantity per calendar year
    #[schema(value_type = Object)]
    pub quantity_by_year: BTreeMap<i32, String>,
    #[schema(example = "days")]
    pub unit: String,
    pub two_stage_approval: bool,
    pub holiday_replacement_notes: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub signed_by_submitter: bool,
    pub signed_by_approver: bool,
    #[schema(example = 0)]
    pub version: u32,
}

impl From<&LeaveRequest> for LeaveResponse {
    fn from(request: &LeaveRequest) -> Self {
        let quantity = request.quantity();
        Self {
            id: request.id,
            person_id: request.person_id,
            submitter_id: request.submitter_id,
            approver_id: request.approver_id,
            status: request.status,
            category_id: request.category.id,
            category: request.category.message_key.clone(),
            color: request.category.color,
            start_date: request.start_date,
            end_date: request.end_date,
            start_time: request.start_time,
            end_time: request.end_time,
            start_date_time: request.start_date_time(),
            end_date_time: request.end_date_time(),
            day_length: request.day_length,
            quantity: quantity.amount().normalize().to_string(),
            quantity_by_year: request
                .quantity_by_year()
                .into_iter()
                .map(|(year, amount)| (year, amount.normalize().to_string()))
                .collect(),
            unit: quantity.unit().to_string(),
            two_stage_approval: request.two_stage_approval,
            holiday_replacement_notes: request.holiday_replacement_notes.clone(),
            submitted_at: request.submitted_at,
            decided_at: request.decided_at,
            cancelled_at: request.cancelled_at,
            signed_by_submitter: request.submitter_signature.is_some(),
            signed_by_approver: request.approver_signature.is_some(),
            version: request.version,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by person. Callers without a deciding role only see their own leave.
    #[schema(example = 1000)]
    pub person_id: Option<u64>,
    /// Filter by status, e.g. `waiting` or `allowed`
    #[schema(example = "waiting")]
    pub status: Option<String>,
    /// Only requests touching this calendar year
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

fn decides_leave(person: &Person) -> bool {
    person.roles.iter().any(|role| role.decides_leave())
}

fn require_decider(person: &Person) -> Result<(), ApiError> {
    if decides_leave(person) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Deciding on leave requests requires a deciding role".to_string(),
        ))
    }
}

/// Owner of the leave or somebody allowed to decide on it.
fn require_owner_or_decider(person: &Person, request: &LeaveRequest) -> Result<(), ApiError> {
    if request.person_id == person.id || decides_leave(person) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not your leave request".to_string()))
    }
}

fn to_filter(viewer: &Person, query: &LeaveFilter) -> Result<LeaveRequestFilter, ApiError> {
    let person_id = match query.person_id {
        Some(id) if id != viewer.id && !decides_leave(viewer) => {
            return Err(ApiError::Forbidden(
                "Only deciding roles may list leave of other persons".to_string(),
            ));
        }
        Some(id) => Some(id),
        None if decides_leave(viewer) => None,
        None => Some(viewer.id),
    };

    let status = query
        .status
        .as_deref()
        .map(|raw| {
            LeaveStatus::from_str(raw.trim())
                .map_err(|_| ApiError::BadRequest(format!("Unknown leave status '{}'", raw)))
        })
        .transpose()?;

    let period = query
        .year
        .map(|year| {
            DateRange::of_year(year)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid year {}", year)))
        })
        .transpose()?;

    Ok(LeaveRequestFilter {
        person_id,
        status,
        period,
    })
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown person or category")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let submitter = auth.viewer()?;
    let payload = payload.into_inner();

    let subject = match payload.person_id {
        Some(id) if id != submitter.id => {
            if !submitter.has_role(Role::Office) {
                return Err(ApiError::Forbidden(
                    "Only the office may apply for leave on behalf of others".to_string(),
                )
                .into());
            }
            state.person(id).await?
        }
        _ => submitter.clone(),
    };

    let request = state
        .lifecycle
        .submit(payload.into_draft(), &subject, submitter)
        .await
        .map_err(ApiError::from)?;

    // An unsigned request is still a valid submission.
    let request = state
        .lifecycle
        .sign_submission(request.id, submitter)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Created().json(LeaveResponse::from(&request)))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests", body = LeaveListResponse),
        (status = 400, description = "Bad filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let viewer = auth.viewer()?;
    let filter = to_filter(viewer, &query)?;

    let requests = state.lifecycle.list(&filter).await.map_err(ApiError::from)?;
    let data: Vec<LeaveResponse> = requests.iter().map(LeaveResponse::from).collect();

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        total: data.len(),
        data,
    }))
}

/* =========================
Get single leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let viewer = auth.viewer()?;
    let request = state
        .lifecycle
        .find(path.into_inner())
        .await
        .map_err(ApiError::from)?;
    require_owner_or_decider(viewer, &request)?;

    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}

/* =========================
Decisions
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/approve",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request allowed", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Request cannot be allowed in its current state")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let approver = auth.viewer()?;
    require_decider(approver)?;

    let request = state
        .lifecycle
        .approve(path.into_inner(), approver)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/temporary-approve",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "First approval stage passed", body = LeaveResponse),
        (status = 400, description = "Request does not need two-stage approval"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Request is not waiting")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn temporary_approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let approver = auth.viewer()?;
    require_decider(approver)?;

    let request = state
        .lifecycle
        .temporarily_allow(path.into_inner(), approver)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/reject",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request rejected", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Request is already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let approver = auth.viewer()?;
    require_decider(approver)?;

    let request = state
        .lifecycle
        .reject(path.into_inner(), approver)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}

/* =========================
Withdrawal
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/cancel",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request cancelled", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Request cannot be cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let caller = auth.viewer()?;
    let id = path.into_inner();

    let existing = state.lifecycle.find(id).await.map_err(ApiError::from)?;
    require_owner_or_decider(caller, &existing)?;

    let request = state.lifecycle.cancel(id).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/revoke",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request withdrawn", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Request was already allowed or closed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn revoke_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let caller = auth.viewer()?;
    let id = path.into_inner();

    let existing = state.lifecycle.find(id).await.map_err(ApiError::from)?;
    if existing.person_id != caller.id && existing.submitter_id != caller.id {
        return Err(ApiError::Forbidden(
            "Only the applicant may withdraw a leave request".to_string(),
        )
        .into());
    }

    let request = state.lifecycle.revoke(id).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/sign",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Signature attempt finished, see signed_by_submitter", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn sign_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let submitter = auth.viewer()?;
    let id = path.into_inner();

    let existing = state.lifecycle.find(id).await.map_err(ApiError::from)?;
    if existing.submitter_id != submitter.id {
        return Err(ApiError::Forbidden(
            "Only the submitter may sign a leave request".to_string(),
        )
        .into());
    }

    let request = state
        .lifecycle
        .sign_submission(id, submitter)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
}
