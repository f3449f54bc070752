//! Measurement mapper.

use omopackager_core::ontology::NO_MATCHING_CONCEPT_LABEL;
use omopackager_core::{Measurement, PersonId, Quantity, ReferenceRange, TimeElement, Value};
use omopackager_warehouse::{MeasurementRow, Warehouse};
use tracing::instrument;

use super::{Mapped, RowContext, map_rows};
use crate::config::RetryPolicy;
use crate::error::{Entity, ExportError, RowError, Section};
use crate::retry::with_retry;

/// Decodes one measurement occurrence.
///
/// A non-zero numeric value yields a [`Quantity`]. A numeric zero yields a
/// quantity only when the row has a unit and no categorical value; a zero
/// that comes with a categorical value, or a null, yields the categorical
/// term instead.
pub fn decode_measurement(row: &MeasurementRow) -> Result<Measurement, RowError> {
    let ctx = RowContext::new(Entity::Measurement, row.measurement_id);
    let observed = ctx.required(row.measurement_datetime, "measurement_datetime")?;
    let assay = ctx.term(row.assay_id.as_deref(), row.assay_label.as_deref(), "measurement_concept_id")?;

    let value = match row.value_as_number {
        Some(number) if !number.is_finite() => {
            return Err(ctx.invalid("value_as_number", format!("not a finite number: {number}")));
        }
        Some(number) if number != 0.0 || (row.unit_id.is_some() && row.value_id.is_none()) => {
            Value::Quantity(decode_quantity(&ctx, row, number)?)
        }
        _ => Value::OntologyClass(ctx.term(
            row.value_id.as_deref(),
            row.value_label.as_deref(),
            "value_as_concept_id",
        )?),
    };

    Ok(Measurement {
        assay,
        value,
        time_observed: TimeElement::Timestamp(observed),
    })
}

fn decode_quantity(ctx: &RowContext, row: &MeasurementRow, value: f64) -> Result<Quantity, RowError> {
    let label = match row.unit_label.as_deref() {
        None | Some(NO_MATCHING_CONCEPT_LABEL) => row
            .unit_source_value
            .as_deref()
            .or(row.unit_label.as_deref()),
        Some(label) => Some(label),
    };
    let unit = ctx.term(row.unit_id.as_deref(), label, "unit_concept_id")?;
    let range = match (row.range_low, row.range_high) {
        (Some(low), Some(high)) => Some(ReferenceRange { low, high }),
        _ => None,
    };
    Ok(Quantity::new(unit, value).with_reference_range(range))
}

#[instrument(skip(warehouse, retry), fields(backend = warehouse.backend_name()))]
pub async fn map_measurements(
    warehouse: &dyn Warehouse,
    person_id: PersonId,
    retry: &RetryPolicy,
) -> Result<Mapped<Measurement>, ExportError> {
    let rows = with_retry(retry, Section::Measurements, || warehouse.measurements(person_id)).await?;
    Ok(map_rows(&rows, decode_measurement))
}

#[cfg(test)]
mod tests {
    use omopackager_core::Timestamp;
    use time::macros::datetime;

    use super::*;

    fn row() -> MeasurementRow {
        MeasurementRow {
            measurement_id: 11,
            assay_id: Some("LOINC:2339-0".into()),
            assay_label: Some("Glucose [Mass/volume] in Blood".into()),
            measurement_datetime: Some(Timestamp::new(datetime!(2020-02-03 08:30:00 UTC))),
            ..Default::default()
        }
    }

    #[test]
    fn test_numeric_value_yields_quantity() {
        let m = decode_measurement(&MeasurementRow {
            value_as_number: Some(12.5),
            unit_id: Some("UCUM:mg/dL".into()),
            unit_label: Some("milligram per deciliter".into()),
            ..row()
        })
        .unwrap();
        let Value::Quantity(q) = m.value else {
            panic!("expected quantity, got {:?}", m.value);
        };
        assert_eq!(q.value, 12.5);
        assert_eq!(q.unit.id(), "UCUM:mg/dL");
        assert_eq!(q.unit.label(), "milligram per deciliter");
        assert!(q.reference_range.is_none());
    }

    #[test]
    fn test_categorical_value_when_zero_or_null() {
        for number in [Some(0.0), None] {
            let m = decode_measurement(&MeasurementRow {
                value_as_number: number,
                unit_id: Some("UCUM:1".into()),
                value_id: Some("SNOMED:260385009".into()),
                value_label: Some("Negative".into()),
                ..row()
            })
            .unwrap();
            let Value::OntologyClass(term) = m.value else {
                panic!("expected term, got {:?}", m.value);
            };
            assert_eq!(term.label(), "Negative");
        }
    }

    #[test]
    fn test_zero_with_unit_only_stays_numeric() {
        let m = decode_measurement(&MeasurementRow {
            value_as_number: Some(0.0),
            unit_id: Some("UCUM:%".into()),
            unit_label: Some("percent".into()),
            ..row()
        })
        .unwrap();
        assert!(matches!(m.value, Value::Quantity(ref q) if q.value == 0.0));
    }

    #[test]
    fn test_missing_categorical_parts_default_to_empty() {
        let m = decode_measurement(&row()).unwrap();
        assert_eq!(m.value, Value::OntologyClass(omopackager_core::OntologyClass::empty()));
    }

    #[test]
    fn test_unit_falls_back_to_source_value() {
        let m = decode_measurement(&MeasurementRow {
            value_as_number: Some(4.1),
            unit_id: Some("None:No matching concept".into()),
            unit_label: Some(NO_MATCHING_CONCEPT_LABEL.into()),
            unit_source_value: Some("mmol/L".into()),
            range_low: Some(3.5),
            range_high: Some(5.1),
            ..row()
        })
        .unwrap();
        let Value::Quantity(q) = m.value else {
            panic!("expected quantity");
        };
        assert_eq!(q.unit.label(), "mmol/L");
        assert_eq!(q.reference_range, Some(ReferenceRange { low: 3.5, high: 5.1 }));
    }

    #[test]
    fn test_null_timestamp_is_row_error() {
        let err = decode_measurement(&MeasurementRow {
            measurement_datetime: None,
            ..row()
        })
        .unwrap_err();
        assert_eq!(err.field(), "measurement_datetime");
        assert_eq!(err.row(), 11);
    }

    #[test]
    fn test_non_finite_value_is_row_error() {
        let err = decode_measurement(&MeasurementRow {
            value_as_number: Some(f64::NAN),
            ..row()
        })
        .unwrap_err();
        assert!(matches!(err, RowError::InvalidField { field: "value_as_number", .. }));
    }
}
