use chrono::{TimeZone, Utc};
use energy_forecast::data::{SeriesFrame, SeriesLoader};
use energy_forecast::error::ForecastError;
use polars::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn sample_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    writeln!(file, "timestamp,energy_kwh,site").unwrap();
    writeln!(file, "2023-03-01 00:00:00,10.5,a").unwrap();
    writeln!(file, "2023-03-01 01:00:00,11.0,a").unwrap();
    writeln!(file, "2023-03-01 02:00:00,9.5,b").unwrap();
    writeln!(file, "2023-03-01 03:00:00,12.0,b").unwrap();

    file
}

#[test]
fn loads_series_from_csv() {
    let file = sample_csv();
    let data = SeriesLoader::from_csv(file.path(), "timestamp", "energy_kwh").unwrap();

    assert_eq!(data.len(), 4);
    assert!(!data.is_empty());
    assert_eq!(data.timestamp_column(), "timestamp");
    assert_eq!(data.target_column(), "energy_kwh");

    let timestamps = data.timestamps().unwrap();
    assert_eq!(
        timestamps[0],
        Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn missing_csv_file_is_an_io_error() {
    let result = SeriesLoader::from_csv("/nonexistent/readings.csv", "timestamp", "energy_kwh");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn missing_designated_columns_are_rejected() {
    let df = DataFrame::new(vec![Series::new("value", vec![1.0, 2.0])]).unwrap();

    let result = SeriesFrame::new(df.clone(), "timestamp", "value");
    assert!(matches!(result, Err(ForecastError::DataError(_))));

    let result = SeriesFrame::new(df, "value", "energy_kwh");
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn observations_sort_ascending_and_drop_unconvertible_rows() {
    // Rows out of order, with one string target that cannot coerce
    let df = DataFrame::new(vec![
        Series::new(
            "timestamp",
            vec![
                "2023-03-01 02:00:00",
                "2023-03-01 00:00:00",
                "2023-03-01 01:00:00",
            ],
        ),
        Series::new("energy_kwh", vec!["9.5", "10.5", "bad"]),
    ])
    .unwrap();

    let data = SeriesFrame::new(df, "timestamp", "energy_kwh").unwrap();
    let (timestamps, values) = data.observations().unwrap();

    assert_eq!(values, vec![10.5, 9.5]);
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn fully_unconvertible_target_is_invalid_data() {
    let df = DataFrame::new(vec![
        Series::new("timestamp", vec!["2023-03-01 00:00:00"]),
        Series::new("energy_kwh", vec!["n/a"]),
    ])
    .unwrap();

    let data = SeriesFrame::new(df, "timestamp", "energy_kwh").unwrap();
    assert!(matches!(
        data.observations(),
        Err(ForecastError::InvalidData(_))
    ));
}

#[test]
fn integer_timestamps_are_epoch_milliseconds() {
    let base = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
    let millis: Vec<i64> = (0..3).map(|i| base.timestamp_millis() + i * 3_600_000).collect();

    let df = DataFrame::new(vec![
        Series::new("timestamp", millis),
        Series::new("energy_kwh", vec![1.0, 2.0, 3.0]),
    ])
    .unwrap();

    let data = SeriesFrame::new(df, "timestamp", "energy_kwh").unwrap();
    let timestamps = data.timestamps().unwrap();
    assert_eq!(timestamps[0], base);
    assert_eq!(timestamps[2], base + chrono::Duration::hours(2));
}

#[test]
fn sorted_by_time_is_stable() {
    // Two rows share a timestamp; their relative order must survive
    let df = DataFrame::new(vec![
        Series::new(
            "timestamp",
            vec![
                "2023-03-01 01:00:00",
                "2023-03-01 00:00:00",
                "2023-03-01 00:00:00",
            ],
        ),
        Series::new("energy_kwh", vec![3.0, 1.0, 2.0]),
    ])
    .unwrap();

    let data = SeriesFrame::new(df, "timestamp", "energy_kwh").unwrap();
    let sorted = data.sorted_by_time().unwrap();

    let values: Vec<Option<f64>> = sorted.target_values().unwrap();
    assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
}
