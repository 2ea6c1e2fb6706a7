use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::RecapError;
use crate::models::{AttendanceMark, Student, StudentAttendance};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (1_i64, "Ana", "Jl. Kenanga 4"),
        (2_i64, "Budi", "Jl. Melati 12"),
    ];

    for (id, name, address) in students {
        sqlx::query(
            r#"
            INSERT INTO attendance_recap.students (id, name, address, active)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, address = EXCLUDED.address
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(address)
        .execute(pool)
        .await?;
    }

    // Keep BIGSERIAL ahead of the explicit ids above.
    sqlx::query(
        "SELECT setval(pg_get_serial_sequence('attendance_recap.students', 'id'), \
         (SELECT MAX(id) FROM attendance_recap.students))",
    )
    .execute(pool)
    .await?;

    let marks = vec![
        (
            "seed-001",
            1_i64,
            NaiveDate::from_ymd_opt(2025, 1, 5).context("invalid date")?,
            false,
            None,
        ),
        (
            "seed-002",
            1_i64,
            NaiveDate::from_ymd_opt(2025, 1, 12).context("invalid date")?,
            true,
            Some("Led the opening prayer"),
        ),
    ];

    for (source_key, student_id, date, bonus, notes) in marks {
        sqlx::query(
            r#"
            INSERT INTO attendance_recap.attendance
            (student_id, date, bonus, notes, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(student_id)
        .bind(date)
        .bind(bonus)
        .bind(notes)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_id: i64,
        date: NaiveDate,
        #[serde(default)]
        bonus: bool,
        notes: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed attendance row {}", line + 1))?;

        let source_key = row
            .source_key
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_recap.attendance
            (student_id, date, bonus, notes, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(row.student_id)
        .bind(row.date)
        .bind(row.bonus)
        .bind(row.notes.filter(|note| !note.trim().is_empty()))
        .bind(&source_key)
        .execute(pool)
        .await
        .with_context(|| format!("failed to import attendance {source_key}"))?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tracing::info!(inserted, path = %csv_path.display(), "attendance import finished");
    Ok(inserted)
}

/// Roster joined with anchor-date attendance in a single round trip.
///
/// Students are grouped with their marks as parallel arrays; marks on any
/// other date never enter the join.
pub async fn fetch_roster_attendance(
    pool: &PgPool,
    anchors: &[NaiveDate],
    search: Option<&str>,
) -> Result<Vec<StudentAttendance>, RecapError> {
    let pattern = search.map(|term| format!("%{}%", escape_like(term)));

    let records = sqlx::query(
        r#"
        SELECT s.id, s.name, s.address, s.active,
               COALESCE(
                   array_agg(a.date ORDER BY a.date, a.id) FILTER (WHERE a.id IS NOT NULL),
                   '{}'
               ) AS mark_dates,
               COALESCE(
                   array_agg(a.bonus ORDER BY a.date, a.id) FILTER (WHERE a.id IS NOT NULL),
                   '{}'
               ) AS mark_bonuses
        FROM attendance_recap.students s
        LEFT JOIN attendance_recap.attendance a
               ON a.student_id = s.id AND a.date = ANY($1)
        WHERE s.deleted_at IS NULL
          AND ($2::text IS NULL OR s.name ILIKE $2 ESCAPE '\')
        GROUP BY s.id, s.name, s.address, s.active
        ORDER BY lower(s.name) COLLATE "C", s.name COLLATE "C", s.id
        "#,
    )
    .bind(anchors)
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    let mut roster = Vec::with_capacity(records.len());

    for row in records {
        let dates: Vec<NaiveDate> = row.get("mark_dates");
        let bonuses: Vec<bool> = row.get("mark_bonuses");
        assert_eq!(
            dates.len(),
            bonuses.len(),
            "attendance arrays diverged for student {}",
            row.get::<i64, _>("id")
        );

        roster.push(StudentAttendance {
            student: Student {
                id: row.get("id"),
                name: row.get("name"),
                address: row.get("address"),
                active: row.get("active"),
                deleted: false,
            },
            marks: dates
                .into_iter()
                .zip(bonuses)
                .map(|(date, bonus)| AttendanceMark { date, bonus })
                .collect(),
        });
    }

    tracing::debug!(students = roster.len(), anchors = anchors.len(), "roster joined");
    Ok(roster)
}

/// Escapes `LIKE` wildcards so the term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
