//! 按被试汇总切片预测。

use crate::error::{AgeError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// 一张切片的预测。
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionRecord {
    pub subject: String,
    pub prediction: f32,
}

/// 一个被试的最终预测（该被试所有切片预测的中位数）。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubjectAge {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Pred_Age")]
    pub pred_age: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultOrder {
    /// 被试首次出现的顺序。
    #[default]
    FirstSeen,
    /// 按ID排序。
    Sorted,
}

/// 中位数：奇数个取正中间，偶数个取中间两个的平均。
pub fn median(values: &[f32]) -> Result<f64> {
    if values.is_empty() {
        return Err(AgeError::Empty("中位数计算"));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(AgeError::NotANumber);
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid] as f64)
    } else {
        Ok((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    }
}

/// 按下标一一对应地组合被试ID与预测值，两者长度必须相等。
pub fn zip_records(ids: Vec<String>, predictions: Vec<f32>) -> Result<Vec<PredictionRecord>> {
    if ids.len() != predictions.len() {
        return Err(AgeError::LengthMismatch {
            ids: ids.len(),
            predictions: predictions.len(),
        });
    }
    Ok(ids
        .into_iter()
        .zip(predictions)
        .map(|(subject, prediction)| PredictionRecord {
            subject,
            prediction,
        })
        .collect())
}

pub fn aggregate(records: &[PredictionRecord], order: ResultOrder) -> Result<Vec<SubjectAge>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<f32>)> = Vec::new();
    for r in records {
        let i = *index.entry(r.subject.as_str()).or_insert_with(|| {
            groups.push((r.subject.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(r.prediction);
    }
    if order == ResultOrder::Sorted {
        groups.sort_by(|a, b| a.0.cmp(b.0));
    }
    groups
        .into_iter()
        .map(|(id, preds)| {
            Ok(SubjectAge {
                id: id.to_string(),
                pred_age: median(&preds)?,
            })
        })
        .collect()
}

/// 写出`ID,Pred_Age`表，覆盖已有文件。
pub fn write_results(path: &Path, results: &[SubjectAge]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in results {
        writer.serialize(row)?;
    }
    if results.is_empty() {
        writer.write_record(["ID", "Pred_Age"])?;
    }
    writer.flush().map_err(|e| AgeError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn records(pairs: &[(&str, f32)]) -> Vec<PredictionRecord> {
        pairs
            .iter()
            .map(|&(s, p)| PredictionRecord {
                subject: s.to_string(),
                prediction: p,
            })
            .collect()
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[42.0]).unwrap(), 42.0);
        assert!(matches!(median(&[]), Err(AgeError::Empty(_))));
    }

    #[test]
    fn test_median_order_independent() {
        let a = [61.0, 70.5, 58.0, 66.0, 73.0, 64.0];
        let mut b = a;
        b.reverse();
        b.swap(1, 4);
        assert_eq!(median(&a).unwrap(), median(&b).unwrap());
    }

    #[test]
    fn test_zip_records_length_mismatch() {
        let ids = vec!["a".to_string(), "a".to_string()];
        assert!(matches!(
            zip_records(ids, vec![1.0]),
            Err(AgeError::LengthMismatch {
                ids: 2,
                predictions: 1
            })
        ));
    }

    #[test]
    fn test_aggregate_groups_and_orders() {
        let recs = records(&[
            ("sub02", 50.0),
            ("sub01", 30.0),
            ("sub02", 70.0),
            ("sub01", 10.0),
            ("sub01", 20.0),
        ]);
        let first_seen = aggregate(&recs, ResultOrder::FirstSeen).unwrap();
        assert_eq!(
            first_seen,
            [
                SubjectAge {
                    id: "sub02".into(),
                    pred_age: 60.0
                },
                SubjectAge {
                    id: "sub01".into(),
                    pred_age: 20.0
                },
            ]
        );
        let sorted = aggregate(&recs, ResultOrder::Sorted).unwrap();
        assert_eq!(sorted[0].id, "sub01");
        assert_eq!(sorted[1].id, "sub02");
    }

    #[test]
    fn test_write_results_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale").unwrap();
        let rows = [
            SubjectAge {
                id: "sub01".into(),
                pred_age: 63.5,
            },
            SubjectAge {
                id: "sub02".into(),
                pred_age: 71.0,
            },
        ];
        write_results(&path, &rows).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ID,Pred_Age\nsub01,63.5\nsub02,71.0\n"
        );
    }
}
