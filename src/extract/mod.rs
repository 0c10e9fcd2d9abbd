//! Pull slide inputs out of the parsed API envelope.

use std::collections::BTreeMap;

use crate::data::{Observation, SeriesData};
use crate::domain::{LatestValue, SeriesCatalog};
use crate::error::AppError;

/// Return the first observation flagged latest for a series.
pub fn latest_value(series: &SeriesData) -> Result<LatestValue, AppError> {
    let obs = series
        .data
        .iter()
        .find(|obs| obs.is_latest())
        .ok_or_else(|| AppError::data_shape(&series.series_id, "no latest flag present"))?;

    for (field, text) in [("value", &obs.value), ("periodName", &obs.period_name), ("year", &obs.year)] {
        if text.trim().is_empty() {
            return Err(AppError::data_shape(
                &series.series_id,
                format!("latest observation has no {field}"),
            ));
        }
    }

    Ok(LatestValue {
        series_id: series.series_id.clone(),
        value: obs.value.clone(),
        label: format!("{}-{}", obs.period_name, obs.year),
    })
}

/// Return the full observation history of the series whose catalog label is `label`.
pub fn trended_data<'a>(
    series: &'a [SeriesData],
    catalog: &SeriesCatalog,
    label: &str,
) -> Result<&'a [Observation], AppError> {
    series
        .iter()
        .find(|s| catalog.label_for(&s.series_id) == Some(label))
        .map(|s| s.data.as_slice())
        .ok_or_else(|| AppError::data_shape(label, "label not found among returned series"))
}

/// Latest value of every returned series, keyed by catalog label.
pub fn latest_by_label(
    series: &[SeriesData],
    catalog: &SeriesCatalog,
) -> Result<BTreeMap<String, LatestValue>, AppError> {
    let mut out = BTreeMap::new();
    for s in series {
        let label = catalog
            .label_for(&s.series_id)
            .ok_or_else(|| AppError::data_shape(&s.series_id, "series not in catalog"))?;
        out.insert(label.to_string(), latest_value(s)?);
    }
    Ok(out)
}

/// Look up a label in the map built by `latest_by_label`.
pub fn require_latest<'a>(
    latest: &'a BTreeMap<String, LatestValue>,
    label: &str,
) -> Result<&'a LatestValue, AppError> {
    latest
        .get(label)
        .ok_or_else(|| AppError::data_shape(label, "no latest value for label"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesSpec;

    fn obs(year: &str, period: &str, name: &str, value: &str, latest: bool) -> Observation {
        Observation {
            year: year.to_string(),
            period: period.to_string(),
            period_name: name.to_string(),
            value: value.to_string(),
            latest: latest.then(|| "true".to_string()),
            footnotes: Vec::new(),
        }
    }

    fn series(id: &str, data: Vec<Observation>) -> SeriesData {
        SeriesData {
            series_id: id.to_string(),
            data,
        }
    }

    #[test]
    fn latest_value_returns_flagged_entry() {
        let s = series(
            "LNS14000000",
            vec![
                obs("2024", "M03", "March", "3.7", true),
                obs("2024", "M02", "February", "3.9", false),
            ],
        );
        let latest = latest_value(&s).unwrap();
        assert_eq!(
            latest,
            LatestValue {
                series_id: "LNS14000000".to_string(),
                value: "3.7".to_string(),
                label: "March-2024".to_string(),
            }
        );
    }

    #[test]
    fn latest_value_finds_flag_anywhere_in_sequence() {
        let s = series(
            "CES0500000003",
            vec![
                obs("2024", "M04", "April", "35.10", false),
                obs("2024", "M03", "March", "34.98", true),
            ],
        );
        let latest = latest_value(&s).unwrap();
        assert_eq!(latest.value, "34.98");
        assert_eq!(latest.label, "March-2024");
    }

    #[test]
    fn latest_value_without_flag_is_data_shape_error() {
        let s = series("LNS14000000", vec![obs("2024", "M02", "February", "3.9", false)]);
        match latest_value(&s) {
            Err(AppError::DataShape { context, .. }) => assert_eq!(context, "LNS14000000"),
            other => panic!("expected DataShape, got {other:?}"),
        }
    }

    #[test]
    fn latest_value_with_missing_fields_is_data_shape_error() {
        let s = series("CES0500000003", vec![obs("2024", "M03", "", "34.98", true)]);
        match latest_value(&s) {
            Err(AppError::DataShape { context, message }) => {
                assert_eq!(context, "CES0500000003");
                assert_eq!(message, "latest observation has no periodName");
            }
            other => panic!("expected DataShape, got {other:?}"),
        }

        let s = series("CES0500000003", vec![obs("2024", "M03", "March", "", true)]);
        let err = latest_value(&s).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn trended_data_selects_by_label() {
        let catalog = SeriesCatalog::new(vec![
            SeriesSpec::new("A", "Alpha"),
            SeriesSpec::new("B", "Beta"),
        ]);
        let all = vec![
            series("A", vec![obs("2023", "M01", "January", "1", false)]),
            series("B", vec![obs("2023", "M01", "January", "2", false)]),
        ];
        let data = trended_data(&all, &catalog, "Beta").unwrap();
        assert_eq!(data[0].value, "2");

        let err = trended_data(&all, &catalog, "Gamma").unwrap_err();
        assert!(matches!(err, AppError::DataShape { .. }));
    }

    #[test]
    fn latest_by_label_rejects_unknown_series() {
        let catalog = SeriesCatalog::new(vec![SeriesSpec::new("A", "Alpha")]);
        let all = vec![
            series("A", vec![obs("2023", "M01", "January", "1", true)]),
            series("Z", vec![obs("2023", "M01", "January", "2", true)]),
        ];
        assert!(matches!(
            latest_by_label(&all, &catalog),
            Err(AppError::DataShape { .. })
        ));

        let latest = latest_by_label(&all[..1], &catalog).unwrap();
        assert_eq!(require_latest(&latest, "Alpha").unwrap().value, "1");
        assert!(require_latest(&latest, "Beta").is_err());
    }
}
