use crate::auth::auth::AuthUser;
use crate::calendar::CalendarMonth;
use crate::calendar::selection::select_from;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AbsenceQuery {
    /// Defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
    /// Month 1-12. Missing means the current month, an empty value the whole year.
    #[schema(example = "3")]
    pub month: Option<String>,
    /// Comma separated department names
    #[schema(example = "admins,marketing")]
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AbsenceOverviewResponse {
    pub visible_departments: Vec<String>,
    pub selected_departments: Vec<String>,
    pub months: Vec<CalendarMonth>,
}

/// Resolves year and month; `None` as month stands for the whole year.
fn resolve_period(
    query: &AbsenceQuery,
    current_year: i32,
    current_month: u32,
) -> Result<(i32, Option<u32>), ApiError> {
    let year = query.year.unwrap_or(current_year);
    let month = match query.month.as_deref().map(str::trim) {
        None => Some(current_month),
        Some("") => None,
        Some(raw) => match raw.parse::<u32>() {
            Ok(month) if (1..=12).contains(&month) => Some(month),
            _ => return Err(ApiError::BadRequest(format!("Invalid month '{}'", raw))),
        },
    };
    Ok((year, month))
}

fn requested_departments(query: &AbsenceQuery) -> Vec<String> {
    query
        .department
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/* =========================
Absence overview
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/absences",
    params(AbsenceQuery),
    responses(
        (status = 200, description = "Absence calendar of the selected departments", body = AbsenceOverviewResponse),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn absence_overview(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<AbsenceQuery>,
) -> actix_web::Result<impl Responder> {
    let viewer = auth.viewer()?;

    let today = state.clock.today();
    let (year, month) = resolve_period(&query, today.year(), today.month())?;

    let selection = select_from(state.store.as_ref(), viewer, &requested_departments(&query))
        .await
        .map_err(ApiError::from)?;

    let months = state
        .calendar
        .build(viewer, &selection.subjects, year, month, state.clock.as_ref())
        .await
        .map_err(ApiError::from)?;

    tracing::debug!(
        viewer_id = viewer.id,
        year,
        month = ?month,
        persons = selection.subjects.len(),
        "Absence overview built"
    );

    Ok(HttpResponse::Ok().json(AbsenceOverviewResponse {
        visible_departments: selection.visible_departments,
        selected_departments: selection.selected_departments,
        months,
    }))
}
