//! Person row: demographics, latest visit and death presence.

use omopackager_core::{PersonId, Timestamp};
use omopackager_warehouse::PersonRow;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;
use time::{Date, Month};
use tracing::debug;

use super::timestamp;

/// Birth date parts are returned raw; see [`birth_from_parts`].
pub const SQL: &str = r#"
SELECT p.person_id::int8 AS person_id,
       p.gender_concept_id::int8 AS gender_concept_id,
       p.birth_datetime,
       p.year_of_birth::int4 AS year_of_birth,
       p.month_of_birth::int4 AS month_of_birth,
       p.day_of_birth::int4 AS day_of_birth,
       v.last_visit_start,
       EXISTS (SELECT 1 FROM death d WHERE d.person_id = p.person_id) AS has_death
FROM person p
LEFT JOIN LATERAL (
    SELECT max(coalesce(vo.visit_start_datetime, vo.visit_start_date::timestamp)) AS last_visit_start
    FROM visit_occurrence vo
    WHERE vo.person_id = p.person_id
) v ON true
WHERE p.person_id = $1
ORDER BY p.person_id
LIMIT 1
"#;

/// Midnight UTC of the birth date built from the year, month and day
/// columns, with month and day defaulting to 1.
///
/// `None` when the year is missing or the parts do not form a calendar date.
pub fn birth_from_parts(year: Option<i32>, month: Option<i32>, day: Option<i32>) -> Option<Timestamp> {
    let year = year?;
    let month = u8::try_from(month.unwrap_or(1))
        .ok()
        .and_then(|m| Month::try_from(m).ok())?;
    let day = u8::try_from(day.unwrap_or(1)).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(Timestamp::new(date.midnight().assume_utc()))
}

pub(crate) fn decode(row: &PgRow) -> Result<PersonRow, SqlxError> {
    let person_id = PersonId::new(row.try_get("person_id")?);
    let birth_datetime = match timestamp(row, "birth_datetime")? {
        Some(ts) => Some(ts),
        None => {
            let year: Option<i32> = row.try_get("year_of_birth")?;
            let month: Option<i32> = row.try_get("month_of_birth")?;
            let day: Option<i32> = row.try_get("day_of_birth")?;
            let birth = birth_from_parts(year, month, day);
            if birth.is_none() {
                debug!(%person_id, ?year, ?month, ?day, "birth date parts do not form a date");
            }
            birth
        }
    };

    Ok(PersonRow {
        person_id,
        gender_concept_id: row.try_get("gender_concept_id")?,
        birth_datetime,
        last_visit_start: timestamp(row, "last_visit_start")?,
        has_death: row.try_get("has_death")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birth_from_parts_defaults_month_and_day() {
        let ts = birth_from_parts(Some(1975), Some(6), None).unwrap();
        assert_eq!(ts.to_string(), "1975-06-01T00:00:00Z");
        let ts = birth_from_parts(Some(1980), None, None).unwrap();
        assert_eq!(ts.to_string(), "1980-01-01T00:00:00Z");
    }

    #[test]
    fn test_birth_from_parts_rejects_impossible_dates() {
        assert!(birth_from_parts(None, Some(1), Some(1)).is_none());
        assert!(birth_from_parts(Some(1980), Some(13), Some(1)).is_none());
        assert!(birth_from_parts(Some(1980), Some(2), Some(31)).is_none());
        assert!(birth_from_parts(Some(1980), Some(0), None).is_none());
        assert!(birth_from_parts(Some(1980), Some(-4), None).is_none());
        assert!(birth_from_parts(Some(1980), Some(1), Some(300)).is_none());
        assert!(birth_from_parts(Some(2000), Some(2), Some(29)).is_some());
    }
}
