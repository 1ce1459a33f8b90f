use energy_forecast::clean::{Cleaner, ImputeStrategy, RangeFilter};
use energy_forecast::error::ForecastError;
use polars::prelude::*;
use rstest::rstest;
use std::str::FromStr;

fn frame_with_gap() -> DataFrame {
    DataFrame::new(vec![
        Series::new("energy_kwh", vec![Some(1.0), None, Some(3.0)]),
        Series::new("site", vec!["a", "b", "c"]),
    ])
    .unwrap()
}

#[rstest]
#[case(ImputeStrategy::Mean, 2.0)]
#[case(ImputeStrategy::Median, 2.0)]
#[case(ImputeStrategy::Mode, 1.0)]
#[case(ImputeStrategy::Zero, 0.0)]
fn imputes_missing_numeric_value(#[case] strategy: ImputeStrategy, #[case] expected: f64) {
    let cleaner = Cleaner::new(strategy);
    let cleaned = cleaner.transform(&frame_with_gap()).unwrap();

    let col = cleaned.column("energy_kwh").unwrap();
    assert_eq!(col.null_count(), 0);
    assert_eq!(col.f64().unwrap().get(1), Some(expected));

    // Rows and untouched values survive
    assert_eq!(cleaned.height(), 3);
    assert_eq!(col.f64().unwrap().get(0), Some(1.0));
    assert_eq!(col.f64().unwrap().get(2), Some(3.0));
}

#[test]
fn mode_prefers_most_frequent_then_smallest() {
    let df = DataFrame::new(vec![Series::new(
        "x",
        vec![Some(2.0), Some(2.0), Some(5.0), None],
    )])
    .unwrap();
    let cleaned = Cleaner::new(ImputeStrategy::Mode).transform(&df).unwrap();
    assert_eq!(cleaned.column("x").unwrap().f64().unwrap().get(3), Some(2.0));

    // Tied counts resolve to the smallest value
    let df = DataFrame::new(vec![Series::new("x", vec![Some(7.0), Some(3.0), None])]).unwrap();
    let cleaned = Cleaner::new(ImputeStrategy::Mode).transform(&df).unwrap();
    assert_eq!(cleaned.column("x").unwrap().f64().unwrap().get(2), Some(3.0));
}

#[test]
fn skip_is_an_explicit_noop() {
    let cleaned = Cleaner::new(ImputeStrategy::Skip)
        .transform(&frame_with_gap())
        .unwrap();
    assert_eq!(cleaned.column("energy_kwh").unwrap().null_count(), 1);
}

#[test]
fn unknown_imputation_method_is_rejected() {
    let err = ImputeStrategy::from_str("interpolate").unwrap_err();
    assert!(matches!(err, ForecastError::UnsupportedConfiguration(_)));

    for name in ["mean", "median", "mode", "zero", "skip"] {
        assert!(ImputeStrategy::from_str(name).is_ok());
    }
}

#[test]
fn non_numeric_columns_are_never_imputed() {
    let df = DataFrame::new(vec![
        Series::new("x", vec![Some(1.0), None]),
        Series::new("label", vec![Some("on"), None]),
    ])
    .unwrap();

    let cleaned = Cleaner::new(ImputeStrategy::Zero).transform(&df).unwrap();
    assert_eq!(cleaned.column("x").unwrap().null_count(), 0);
    assert_eq!(cleaned.column("label").unwrap().null_count(), 1);
}

#[test]
fn drops_configured_columns_and_ignores_absent_names() {
    let cleaner = Cleaner::new(ImputeStrategy::Mean)
        .drop_column("site")
        .drop_column("does_not_exist");
    let cleaned = cleaner.transform(&frame_with_gap()).unwrap();

    assert_eq!(cleaned.get_column_names(), vec!["energy_kwh"]);
}

#[test]
fn range_filters_are_inclusive() {
    let df = DataFrame::new(vec![Series::new(
        "energy_kwh",
        vec![1.0, 2.0, 3.0, 4.0, 5.0],
    )])
    .unwrap();

    let cleaned = Cleaner::new(ImputeStrategy::Mean)
        .with_filter("energy_kwh", RangeFilter::between(2.0, 4.0))
        .transform(&df)
        .unwrap();

    let values: Vec<f64> = cleaned
        .column("energy_kwh")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(values, vec![2.0, 3.0, 4.0]);
}

#[test]
fn filters_run_after_imputation() {
    // The gap imputes to the mean of 1 and 9, which the filter then keeps
    let df = DataFrame::new(vec![Series::new(
        "energy_kwh",
        vec![Some(1.0), None, Some(9.0)],
    )])
    .unwrap();

    let cleaned = Cleaner::new(ImputeStrategy::Mean)
        .with_filter("energy_kwh", RangeFilter::between(2.0, 8.0))
        .transform(&df)
        .unwrap();

    let values: Vec<f64> = cleaned
        .column("energy_kwh")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(values, vec![5.0]);
}

#[test]
fn filtering_a_missing_column_is_an_error() {
    let result = Cleaner::new(ImputeStrategy::Mean)
        .with_filter("voltage", RangeFilter::at_least(0.0))
        .transform(&frame_with_gap());
    assert!(result.is_err());
}

#[test]
fn fit_is_stateless_and_chainable() {
    let df = frame_with_gap();
    let cleaner = Cleaner::new(ImputeStrategy::Mean);
    let cleaned = cleaner.fit(&df).transform(&df).unwrap();
    assert_eq!(cleaned.height(), 3);
}
