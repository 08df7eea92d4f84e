use hypertune::{ParameterGrid, Search};

use crate::estimators::{NearestCentroid, blobs};

fn fitted() -> hypertune::SearchResult<crate::estimators::CentroidModel> {
    let data = blobs(30, 2, 4.0, 3);
    let grid = ParameterGrid::builder()
        .add("shrink", [0.0, 2.0])
        .add("metric", ["euclidean", "man,hattan"])
        .build()
        .unwrap();
    Search::builder(NearestCentroid)
        .grid(grid)
        .n_folds(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap()
}

#[test]
fn test_csv_has_one_row_per_candidate() {
    let result = fitted();
    let mut buf = Vec::new();
    result.to_csv(&mut buf).unwrap();
    let csv = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), result.n_candidates() + 1);
    assert_eq!(
        lines[0],
        "index,rank,state,mean_score,std_score,mean_train_score,std_train_score,\
         mean_fit_time_s,split0_score,split1_score,split2_score,shrink,metric,error"
    );
    assert!(lines[1].starts_with("0,1,Complete,"));
    assert!(lines[1].ends_with(",0,euclidean,"));
}

#[test]
fn test_csv_escapes_and_reports_failures() {
    let result = fitted();
    let mut buf = Vec::new();
    result.to_csv(&mut buf).unwrap();
    let csv = String::from_utf8(buf).unwrap();

    // the made-up metric name needs quoting and fails to fit
    let row = csv.lines().nth(2).unwrap();
    assert!(row.starts_with("1,,Failed,"));
    assert!(row.contains("\"man,hattan\""));
    assert!(row.ends_with("unknown metric man,hattan\""));

    // shrink 2.0 fails for every metric
    assert_eq!(csv.lines().filter(|l| l.contains(",Failed,")).count(), 3);
}

#[test]
fn test_summary() {
    let result = fitted();
    let summary = result.summary();
    assert!(summary.contains("4 candidates x 3 folds"));
    assert!(summary.contains("metric: accuracy"));
    assert!(summary.contains("(3 failed)"));
    assert!(summary.contains("Best score:"));
    assert!(summary.contains("shrink = 0"));
    assert!(summary.contains("metric = euclidean"));
    assert_eq!(result.to_string(), summary);
}

#[test]
fn test_export_csv_writes_file() {
    let result = fitted();
    let path = std::env::temp_dir().join(format!("hypertune_export_{}.csv", std::process::id()));
    result.export_csv(&path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(contents.lines().count(), 5);
}
