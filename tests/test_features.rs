use assert_approx_eq::assert_approx_eq;
use chrono::{Duration, TimeZone, Utc};
use energy_forecast::features::FeatureEngineer;
use polars::prelude::*;
use pretty_assertions::assert_eq;

fn hourly_frame(values: &[f64]) -> DataFrame {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let timestamps: Vec<String> = (0..values.len())
        .map(|i| {
            (start + Duration::hours(i as i64))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .collect();

    DataFrame::new(vec![
        Series::new("timestamp", timestamps),
        Series::new("energy_kwh", values.to_vec()),
    ])
    .unwrap()
}

fn column_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect()
}

#[test]
fn lag_features_match_earlier_target_values() {
    let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let engineer = FeatureEngineer::new("energy_kwh", "timestamp")
        .with_lags(vec![1, 3])
        .with_rolling_windows(vec![2]);

    let matrix = engineer.transform(&hourly_frame(&values)).unwrap();

    let target = column_values(&matrix, "energy_kwh");
    let lag_1 = column_values(&matrix, "energy_kwh_lag_1");
    let lag_3 = column_values(&matrix, "energy_kwh_lag_3");

    for i in 0..target.len() {
        assert_approx_eq!(lag_1[i], target[i] - 1.0);
        assert_approx_eq!(lag_3[i], target[i] - 3.0);
    }
}

#[test]
fn rolling_mean_never_includes_the_current_row() {
    // A spike at one row must not appear in that row's own rolling feature
    let mut values = vec![1.0; 20];
    values[10] = 100.0;

    let engineer = FeatureEngineer::new("energy_kwh", "timestamp")
        .with_lags(vec![1])
        .with_rolling_windows(vec![3]);
    let matrix = engineer.transform(&hourly_frame(&values)).unwrap();

    let target = column_values(&matrix, "energy_kwh");
    let roll = column_values(&matrix, "energy_kwh_roll_mean_3");

    // First output row corresponds to source row 3
    let spike_row = 10 - 3;
    assert_approx_eq!(target[spike_row], 100.0);
    assert_approx_eq!(roll[spike_row], 1.0);

    // The spike enters the window for the three following rows
    assert_approx_eq!(roll[spike_row + 1], (1.0 + 1.0 + 100.0) / 3.0);
    assert_approx_eq!(roll[spike_row + 3], (100.0 + 1.0 + 1.0) / 3.0);
    assert_approx_eq!(roll[spike_row + 4], 1.0);
}

#[test]
fn output_matrix_is_warm() {
    let values: Vec<f64> = (0..60).map(|i| (i as f64).sin()).collect();
    let engineer = FeatureEngineer::new("energy_kwh", "timestamp");
    let matrix = engineer.transform(&hourly_frame(&values)).unwrap();

    // Default max lag is 24, so the first 24 rows are cold and dropped
    assert_eq!(matrix.height(), 60 - 24);
    for col in matrix.get_columns() {
        assert_eq!(col.null_count(), 0, "column {} has nulls", col.name());
    }
}

#[test]
fn derived_columns_are_named_after_the_target() {
    let values: Vec<f64> = (0..40).map(|i| i as f64).collect();
    let matrix = FeatureEngineer::new("energy_kwh", "timestamp")
        .transform(&hourly_frame(&values))
        .unwrap();

    let names: Vec<String> = matrix
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for expected in [
        "energy_kwh_lag_1",
        "energy_kwh_lag_24",
        "energy_kwh_roll_mean_3",
        "energy_kwh_roll_mean_12",
        "hour",
        "dayofweek",
        "month",
        "day",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {}", expected);
    }
}

#[test]
fn calendar_features_follow_monday_zero_convention() {
    // 2023-01-02 is a Monday; frame starts there at midnight
    let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let engineer = FeatureEngineer::new("energy_kwh", "timestamp")
        .with_lags(vec![1])
        .with_rolling_windows(vec![2]);
    let matrix = engineer.transform(&hourly_frame(&values)).unwrap();

    let hours = matrix.column("hour").unwrap().i32().unwrap();
    let dows = matrix.column("dayofweek").unwrap().i32().unwrap();
    let months = matrix.column("month").unwrap().i32().unwrap();
    let days = matrix.column("day").unwrap().i32().unwrap();

    // First warm row is source row 2, i.e. 02:00 on Monday Jan 2nd
    assert_eq!(hours.get(0), Some(2));
    assert_eq!(dows.get(0), Some(0));
    assert_eq!(months.get(0), Some(1));
    assert_eq!(days.get(0), Some(2));

    // Row 22 hours later crosses into Tuesday
    assert_eq!(dows.get(22), Some(1));
    assert_eq!(days.get(22), Some(3));
}

#[test]
fn rows_are_sorted_by_timestamp_before_derivation() {
    // Supply rows in reverse order; lags must still look at chronological
    // predecessors
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let timestamps: Vec<String> = (0..10)
        .rev()
        .map(|i| {
            (start + Duration::hours(i as i64))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .collect();
    let values: Vec<f64> = (0..10).rev().map(|i| i as f64).collect();

    let df = DataFrame::new(vec![
        Series::new("timestamp", timestamps),
        Series::new("energy_kwh", values),
    ])
    .unwrap();

    let matrix = FeatureEngineer::new("energy_kwh", "timestamp")
        .with_lags(vec![1])
        .with_rolling_windows(vec![2])
        .transform(&df)
        .unwrap();

    let target = column_values(&matrix, "energy_kwh");
    let lag_1 = column_values(&matrix, "energy_kwh_lag_1");
    assert_eq!(target, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    for i in 0..target.len() {
        assert_approx_eq!(lag_1[i], target[i] - 1.0);
    }
}
