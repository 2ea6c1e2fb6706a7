use serde::Deserialize;
use sqlx::PgPool;

use crate::db;
use crate::error::RecapError;
use crate::matrix;
use crate::models::{AttendanceRecord, ReportPage, ReportRow, Student};
use crate::paginate::{Pagination, DEFAULT_PAGE_SIZE};
use crate::period::{self, PeriodMode, ResolvedPeriod};

#[derive(Debug, Clone, Deserialize)]
pub struct RecapRequest {
    pub periode: String,
    pub mode: PeriodMode,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

/// A request whose parameters have all been checked.
#[derive(Debug, Clone)]
pub struct RecapQuery {
    pub period: ResolvedPeriod,
    pub pagination: Pagination,
    pub search: Option<String>,
}

impl RecapRequest {
    pub fn validate(&self) -> Result<RecapQuery, RecapError> {
        let period = period::resolve_period(&self.periode, self.mode)?;
        let pagination = Pagination::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )?;
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);

        Ok(RecapQuery {
            period,
            pagination,
            search,
        })
    }
}

/// Full, unpaginated matrix for a validated query.
pub async fn build_rows(pool: &PgPool, query: &RecapQuery) -> Result<Vec<ReportRow>, RecapError> {
    let anchors = &query.period.anchors;
    tracing::debug!(
        start = %query.period.start,
        end = %query.period.end,
        anchors = anchors.len(),
        "period resolved"
    );
    let roster = db::fetch_roster_attendance(pool, anchors, query.search.as_deref()).await?;
    Ok(matrix::build_matrix(roster, anchors))
}

#[tracing::instrument(skip_all, fields(periode = %request.periode, mode = %request.mode))]
pub async fn run(pool: &PgPool, request: &RecapRequest) -> Result<ReportPage, RecapError> {
    let query = request.validate().inspect_err(|err| {
        tracing::warn!(error = %err, "recap request rejected");
    })?;
    tracing::debug!(
        page = query.pagination.page(),
        limit = query.pagination.page_size(),
        search = query.search.as_deref(),
        "recap request accepted"
    );
    let rows = build_rows(pool, &query).await?;
    let page = query.pagination.apply(rows);
    tracing::info!(
        total_rows = page.total_rows,
        page = page.current_page,
        total_pages = page.total_pages,
        "recap built"
    );
    Ok(page)
}

/// Same pipeline over already-loaded roster and attendance data.
pub fn run_offline(
    students: &[Student],
    records: &[AttendanceRecord],
    request: &RecapRequest,
) -> Result<ReportPage, RecapError> {
    let query = request.validate()?;
    let anchors = &query.period.anchors;
    let roster = matrix::join_roster(students, records, anchors, query.search.as_deref());
    Ok(query.pagination.apply(matrix::build_matrix(roster, anchors)))
}
