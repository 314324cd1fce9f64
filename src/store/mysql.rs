use crate::model::category::{CategoryColor, LeaveCategory, QuantityUnit};
use crate::model::department::Department;
use crate::model::holiday::{PublicHoliday, Region, WorkingTimeEntry, regions_in_range};
use crate::model::leave_request::{LeaveRequest, LeaveRequestId, LeaveStatus, Quantity};
use crate::model::period::{DateRange, DayLength};
use crate::model::person::{KeyMaterial, MailNotification, Person, PersonId};
use crate::model::role::Role;
use crate::model::sick_note::SickNote;
use crate::model::supplemental::SupplementalRequest;
use crate::store::{
    CategoryCatalog, Directory, HolidayProvider, LeaveRequestFilter, LeaveRequestStore,
    SickNoteStore, StoreError, SupplementalStore, WorkingTimeHistory,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use std::collections::HashMap;
use std::str::FromStr;

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    T::from_str(value)
        .map_err(|_| StoreError::Corrupt(format!("unexpected {} value '{}'", column, value)))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

const LEAVE_REQUEST_COLUMNS: &str = r#"
    r.id, r.person_id, r.submitter_id, r.approver_id, r.status,
    r.start_date, r.end_date, r.start_time, r.end_time, r.day_length,
    r.quantity, r.submitted_at, r.decided_at, r.cancelled_at,
    r.submitter_signature, r.approver_signature, r.two_stage_approval,
    r.holiday_replacement_notes, r.version,
    c.id AS category_id, c.message_key AS category_message_key,
    c.active AS category_active, c.two_stage_approval AS category_two_stage_approval,
    c.unit AS category_unit, c.color AS category_color
"#;

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    person_id: u64,
    submitter_id: u64,
    approver_id: Option<u64>,
    status: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    day_length: String,
    quantity: Decimal,
    submitted_at: Option<DateTime<Utc>>,
    decided_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    submitter_signature: Option<Vec<u8>>,
    approver_signature: Option<Vec<u8>>,
    two_stage_approval: bool,
    holiday_replacement_notes: Option<String>,
    version: u32,
    category_id: u64,
    category_message_key: String,
    category_active: bool,
    category_two_stage_approval: bool,
    category_unit: String,
    category_color: String,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let unit: QuantityUnit = parse_column("category unit", &row.category_unit)?;
        let category = LeaveCategory {
            id: row.category_id,
            message_key: row.category_message_key,
            active: row.category_active,
            two_stage_approval: row.category_two_stage_approval,
            unit,
            color: parse_column("category color", &row.category_color)?,
        };

        Ok(LeaveRequest {
            id: row.id,
            person_id: row.person_id,
            submitter_id: row.submitter_id,
            approver_id: row.approver_id,
            status: parse_column("status", &row.status)?,
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            end_time: row.end_time,
            day_length: parse_column("day length", &row.day_length)?,
            category,
            quantity: Quantity::of(unit, row.quantity),
            submitted_at: row.submitted_at,
            decided_at: row.decided_at,
            cancelled_at: row.cancelled_at,
            submitter_signature: row.submitter_signature,
            approver_signature: row.approver_signature,
            two_stage_approval: row.two_stage_approval,
            holiday_replacement_notes: row.holiday_replacement_notes,
            version: row.version,
        })
    }
}

#[derive(FromRow)]
struct SupplementalRow {
    id: u64,
    parent_id: u64,
    person_id: u64,
    year: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    day_length: String,
    category_id: u64,
    status: String,
    unit: String,
    quantity: Decimal,
}

impl TryFrom<SupplementalRow> for SupplementalRequest {
    type Error = StoreError;

    fn try_from(row: SupplementalRow) -> Result<Self, Self::Error> {
        Ok(SupplementalRequest {
            id: row.id,
            parent_id: row.parent_id,
            person_id: row.person_id,
            year: row.year,
            period: DateRange::new(row.start_date, row.end_date),
            day_length: parse_column("day length", &row.day_length)?,
            category_id: row.category_id,
            status: parse_column("status", &row.status)?,
            quantity: Quantity::of(parse_column("unit", &row.unit)?, row.quantity),
        })
    }
}

#[derive(FromRow)]
struct PersonRow {
    id: u64,
    first_name: String,
    last_name: String,
    email: String,
    notifications: String,
    key_algorithm: Option<String>,
    private_key: Option<Vec<u8>>,
}

#[derive(FromRow)]
struct RoleRow {
    person_id: u64,
    role: String,
}

#[derive(FromRow)]
struct CategoryRow {
    id: u64,
    message_key: String,
    active: bool,
    two_stage_approval: bool,
    unit: String,
    color: String,
}

#[derive(FromRow)]
struct SickNoteRow {
    id: u64,
    person_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    day_length: String,
    active: bool,
}

#[derive(FromRow)]
struct HolidayRow {
    date: NaiveDate,
    day_length: String,
    description: String,
}

#[derive(FromRow)]
struct WorkingTimeRow {
    valid_from: NaiveDate,
    region: String,
}

#[derive(FromRow)]
struct DepartmentRow {
    id: u64,
    name: String,
}

#[derive(FromRow)]
struct DepartmentMemberRow {
    department_id: u64,
    person_id: u64,
    membership: String,
}

/// Supplemental rows are only written together with their parent.
async fn insert_supplemental(
    conn: &mut MySqlConnection,
    parent_id: LeaveRequestId,
    request: &SupplementalRequest,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO supplemental_requests
            (parent_id, person_id, year, start_date, end_date, day_length,
             category_id, status, unit, quantity)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(parent_id)
    .bind(request.person_id)
    .bind(request.year)
    .bind(request.period.from)
    .bind(request.period.to)
    .bind(request.day_length.as_ref())
    .bind(request.category_id)
    .bind(request.status.as_ref())
    .bind(request.quantity.unit().as_ref())
    .bind(request.quantity.amount())
    .execute(conn)
    .await?;
    Ok(())
}

/// MySQL backend; table layout in `schema.sql`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    default_region: Region,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool, default_region: Region) -> Self {
        Self {
            pool,
            default_region,
        }
    }

    async fn load_persons(&self, where_sql: &str, ids: &[u64]) -> Result<Vec<Person>, StoreError> {
        let sql = format!(
            "SELECT id, first_name, last_name, email, notifications, key_algorithm, private_key FROM persons{} ORDER BY id",
            where_sql
        );
        let mut query = sqlx::query_as::<_, PersonRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let person_ids: Vec<u64> = rows.iter().map(|row| row.id).collect();
        let role_sql = format!(
            "SELECT person_id, role FROM person_roles WHERE person_id IN ({})",
            placeholders(person_ids.len())
        );
        let mut role_query = sqlx::query_as::<_, RoleRow>(&role_sql);
        for id in &person_ids {
            role_query = role_query.bind(*id);
        }

        let mut roles: HashMap<u64, Vec<Role>> = HashMap::new();
        for row in role_query.fetch_all(&self.pool).await? {
            let role: Role = parse_column("role", &row.role)?;
            roles.entry(row.person_id).or_default().push(role);
        }

        rows.into_iter()
            .map(|row| {
                let notifications = row
                    .notifications
                    .split(',')
                    .filter(|value| !value.is_empty())
                    .map(|value| parse_column("notifications", value))
                    .collect::<Result<Vec<MailNotification>, StoreError>>()?;
                Ok(Person {
                    id: row.id,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: row.email,
                    roles: roles.remove(&row.id).unwrap_or_default(),
                    notifications,
                    key_material: match (row.key_algorithm, row.private_key) {
                        (Some(algorithm), Some(bytes)) => Some(KeyMaterial::new(algorithm, bytes)),
                        _ => None,
                    },
                })
            })
            .collect()
    }

    async fn query_requests(
        &self,
        where_sql: &str,
        args: Vec<FilterValue>,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {} FROM leave_requests r JOIN leave_categories c ON c.id = r.category_id WHERE 1=1{} ORDER BY r.start_date, r.id",
            LEAVE_REQUEST_COLUMNS, where_sql
        );

        let mut query = sqlx::query_as::<_, LeaveRequestRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }
}

#[async_trait]
impl LeaveRequestStore for MySqlStore {
    async fn find(&self, id: LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError> {
        let mut found = self
            .query_requests(" AND r.id = ?", vec![FilterValue::U64(id)])
            .await?;
        Ok(found.pop())
    }

    async fn insert(
        &self,
        request: &LeaveRequest,
        supplementals: &[SupplementalRequest],
    ) -> Result<LeaveRequestId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (person_id, submitter_id, approver_id, status, start_date, end_date,
                 start_time, end_time, day_length, category_id, quantity,
                 submitted_at, decided_at, cancelled_at, submitter_signature,
                 approver_signature, two_stage_approval, holiday_replacement_notes, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(request.person_id)
        .bind(request.submitter_id)
        .bind(request.approver_id)
        .bind(request.status.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.day_length.as_ref())
        .bind(request.category.id)
        .bind(request.quantity.amount())
        .bind(request.submitted_at)
        .bind(request.decided_at)
        .bind(request.cancelled_at)
        .bind(request.submitter_signature.as_deref())
        .bind(request.approver_signature.as_deref())
        .bind(request.two_stage_approval)
        .bind(request.holiday_replacement_notes.as_deref())
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_id();

        for supplemental in supplementals {
            insert_supplemental(&mut tx, id, supplemental).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn update(&self, request: &LeaveRequest) -> Result<u32, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = ?, decided_at = ?, cancelled_at = ?,
                submitter_signature = ?, approver_signature = ?, version = version + 1
            WHERE id = ?
            AND version = ?
            "#,
        )
        .bind(request.status.as_ref())
        .bind(request.approver_id)
        .bind(request.decided_at)
        .bind(request.cancelled_at)
        .bind(request.submitter_signature.as_deref())
        .bind(request.approver_signature.as_deref())
        .bind(request.id)
        .bind(request.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM leave_requests WHERE id = ? LIMIT 1)",
            )
            .bind(request.id)
            .fetch_one(&self.pool)
            .await?;
            return Err(if exists {
                StoreError::Conflict
            } else {
                StoreError::NotFound
            });
        }

        Ok(request.version + 1)
    }

    async fn list(&self, filter: &LeaveRequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut where_sql = String::new();
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(person_id) = filter.person_id {
            where_sql.push_str(" AND r.person_id = ?");
            args.push(FilterValue::U64(person_id));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(" AND r.status = ?");
            args.push(FilterValue::Str(status.as_ref().to_string()));
        }

        if let Some(period) = filter.period {
            where_sql.push_str(" AND r.start_date <= ? AND r.end_date >= ?");
            args.push(FilterValue::Date(period.to));
            args.push(FilterValue::Date(period.from));
        }

        self.query_requests(&where_sql, args).await
    }

    async fn open_in_range(
        &self,
        persons: &[PersonId],
        range: DateRange,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        if persons.is_empty() {
            return Ok(Vec::new());
        }

        let open = [
            LeaveStatus::Waiting,
            LeaveStatus::TemporarilyAllowed,
            LeaveStatus::Allowed,
        ];
        let where_sql = format!(
            " AND r.person_id IN ({}) AND r.status IN ({}) AND r.start_date <= ? AND r.end_date >= ?",
            placeholders(persons.len()),
            placeholders(open.len())
        );

        let mut args: Vec<FilterValue> = persons.iter().map(|id| FilterValue::U64(*id)).collect();
        args.extend(
            open.iter()
                .map(|status| FilterValue::Str(status.as_ref().to_string())),
        );
        args.push(FilterValue::Date(range.to));
        args.push(FilterValue::Date(range.from));

        self.query_requests(&where_sql, args).await
    }
}

#[async_trait]
impl SupplementalStore for MySqlStore {
    async fn for_parent(
        &self,
        parent_id: LeaveRequestId,
    ) -> Result<Vec<SupplementalRequest>, StoreError> {
        sqlx::query_as::<_, SupplementalRow>(
            r#"
            SELECT id, parent_id, person_id, year, start_date, end_date, day_length,
                   category_id, status, unit, quantity
            FROM supplemental_requests
            WHERE parent_id = ?
            ORDER BY year
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(SupplementalRequest::try_from)
        .collect()
    }

    async fn update_supplemental_status(
        &self,
        id: u64,
        status: LeaveStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE supplemental_requests SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SickNoteStore for MySqlStore {
    async fn active_in_range(
        &self,
        persons: &[PersonId],
        range: DateRange,
    ) -> Result<Vec<SickNote>, StoreError> {
        if persons.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT id, person_id, start_date, end_date, day_length, active
            FROM sick_notes
            WHERE active = TRUE
            AND person_id IN ({})
            AND start_date <= ?
            AND end_date >= ?
            "#,
            placeholders(persons.len())
        );

        let mut query = sqlx::query_as::<_, SickNoteRow>(&sql);
        for id in persons {
            query = query.bind(*id);
        }

        query
            .bind(range.to)
            .bind(range.from)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                Ok(SickNote {
                    id: row.id,
                    person_id: row.person_id,
                    period: DateRange::new(row.start_date, row.end_date),
                    day_length: parse_column("day length", &row.day_length)?,
                    active: row.active,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Directory for MySqlStore {
    async fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        Ok(self.load_persons(" WHERE id = ?", &[id]).await?.pop())
    }

    async fn active_persons(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self
            .load_persons("", &[])
            .await?
            .into_iter()
            .filter(|person| person.is_active())
            .collect())
    }

    async fn persons(&self, ids: &[PersonId]) -> Result<Vec<Person>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let where_sql = format!(" WHERE id IN ({})", placeholders(ids.len()));
        self.load_persons(&where_sql, ids).await
    }

    async fn departments(&self) -> Result<Vec<Department>, StoreError> {
        let rows = sqlx::query_as::<_, DepartmentRow>("SELECT id, name FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let members = sqlx::query_as::<_, DepartmentMemberRow>(
            "SELECT department_id, person_id, membership FROM department_members",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut departments: Vec<Department> = rows
            .into_iter()
            .map(|row| Department::new(row.id, &row.name))
            .collect();

        for member in members {
            let Some(department) = departments
                .iter_mut()
                .find(|department| department.id == member.department_id)
            else {
                continue;
            };
            match member.membership.as_str() {
                "member" => department.members.push(member.person_id),
                "department_head" => department.department_heads.push(member.person_id),
                "second_stage_authority" => {
                    department.second_stage_authorities.push(member.person_id)
                }
                other => {
                    return Err(StoreError::Corrupt(format!(
                        "unexpected membership value '{}'",
                        other
                    )));
                }
            }
        }

        Ok(departments)
    }
}

#[async_trait]
impl CategoryCatalog for MySqlStore {
    async fn categories(&self) -> Result<Vec<LeaveCategory>, StoreError> {
        sqlx::query_as::<_, CategoryRow>(
            "SELECT id, message_key, active, two_stage_approval, unit, color FROM leave_categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| {
            let color: CategoryColor = parse_column("color", &row.color)?;
            Ok(LeaveCategory {
                id: row.id,
                message_key: row.message_key,
                active: row.active,
                two_stage_approval: row.two_stage_approval,
                unit: parse_column("unit", &row.unit)?,
                color,
            })
        })
        .collect()
    }
}

#[async_trait]
impl HolidayProvider for MySqlStore {
    async fn holidays_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        region: &Region,
    ) -> Result<Vec<PublicHoliday>, StoreError> {
        sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT date, day_length, description
            FROM public_holidays
            WHERE region = ?
            AND date BETWEEN ? AND ?
            ORDER BY date
            "#,
        )
        .bind(region.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| {
            let day_length: DayLength = parse_column("day length", &row.day_length)?;
            Ok(PublicHoliday {
                date: row.date,
                day_length,
                description: row.description,
            })
        })
        .collect()
    }
}

#[async_trait]
impl WorkingTimeHistory for MySqlStore {
    async fn regions_for_person_in_range(
        &self,
        person_id: PersonId,
        range: DateRange,
    ) -> Result<Vec<(DateRange, Region)>, StoreError> {
        let history: Vec<WorkingTimeEntry> = sqlx::query_as::<_, WorkingTimeRow>(
            "SELECT valid_from, region FROM working_times WHERE person_id = ? ORDER BY valid_from",
        )
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| WorkingTimeEntry {
            valid_from: row.valid_from,
            region: Region::new(&row.region),
        })
        .collect();

        Ok(regions_in_range(&history, range, &self.default_region))
    }
}
