use crate::api::absence::{AbsenceOverviewResponse, AbsenceQuery};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::calendar::day_type::{DayColors, HalfFlags};
use crate::calendar::{CalendarDay, CalendarMonth, CalendarPerson, DayType};
use crate::model::category::CategoryColor;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave & Absence API",
        version = "1.0.0",
        description = r#"
## Leave management and absence calendar

### Leave requests
- Apply for leave, for yourself or (office) on behalf of a colleague
- Two-stage approval, rejection, cancellation and withdrawal
- Decisions are signed with the acting person's key when one is on file

### Absence calendar
- Month or year grid per department
- Leave and sickness per half day, merged with regional public holidays
- Colleagues see a generic marker, privileged roles the leave category

### Security
All endpoints require a **JWT Bearer** token carrying the caller's person id.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::temporary_approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::revoke_leave,
        crate::api::leave_request::sign_leave,

        crate::api::absence::absence_overview
    ),
    components(
        schemas(
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            AbsenceQuery,
            AbsenceOverviewResponse,
            CalendarMonth,
            CalendarDay,
            CalendarPerson,
            DayType,
            DayColors,
            HalfFlags,
            CategoryColor
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Absence", description = "Absence calendar APIs"),
    )
)]
pub struct ApiDoc;
