// ============================================================
// BATCH RESULT JOINER
// ============================================================
// Align per-row outcomes back onto the source rows by position

use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{
    JoinedRecord, NormalizedRow, Outcome, PredictionError, PredictionResult,
};
use crate::domain::row::RawRow;

/// Pair every raw row with its outcome.
///
/// `predictions` holds one entry per row that normalized successfully, in
/// row order; rows that failed normalization were never dispatched. The
/// output has exactly one record per raw row. Prediction errors are
/// re-attributed to the index of the source row.
pub fn join(
    raw_rows: &[RawRow],
    normalized: &[NormalizedRow],
    predictions: Vec<PredictionResult>,
) -> Result<Vec<JoinedRecord>> {
    if raw_rows.len() != normalized.len() {
        return Err(AppError::Internal(format!(
            "join expects one normalization outcome per row ({} rows, {} outcomes)",
            raw_rows.len(),
            normalized.len()
        )));
    }

    let dispatched = normalized.iter().filter(|n| n.is_features()).count();
    if predictions.len() != dispatched {
        return Err(AppError::Internal(format!(
            "join expects one prediction per dispatched row ({} dispatched, {} predictions)",
            dispatched,
            predictions.len()
        )));
    }

    let mut cursor = predictions.into_iter();
    let mut records = Vec::with_capacity(raw_rows.len());

    for (index, (raw, normalized)) in raw_rows.iter().zip(normalized).enumerate() {
        let outcome = match normalized {
            NormalizedRow::Invalid(err) => Outcome::NormalizationError {
                invalid_fields: err.invalid_fields.clone(),
            },
            NormalizedRow::Features(_) => match cursor.next() {
                Some(PredictionResult::Value { prediction }) => Outcome::Prediction { prediction },
                Some(PredictionResult::Error(err)) => Outcome::PredictionError(PredictionError {
                    row: index,
                    message: err.message,
                }),
                // Counts were checked above
                None => {
                    return Err(AppError::Internal(
                        "prediction cursor exhausted".to_string(),
                    ))
                }
            },
        };

        records.push(JoinedRecord {
            raw: raw.clone(),
            outcome,
        });
    }

    Ok(records)
}

/// Attribute one batch-wide dispatch failure to every dispatched row
pub fn dispatch_failure(normalized: &[NormalizedRow], message: &str) -> Vec<PredictionResult> {
    normalized
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_features())
        .map(|(row, _)| PredictionResult::error(row, message))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{FeatureVector, PredictionValue, RowError};

    fn row(i: usize) -> RawRow {
        RawRow::new().with("id", i.to_string())
    }

    fn ok_row() -> NormalizedRow {
        NormalizedRow::Features(FeatureVector::new(vec![1.0]))
    }

    fn bad_row(raw: RawRow) -> NormalizedRow {
        NormalizedRow::Invalid(RowError {
            raw,
            invalid_fields: vec!["a".to_string()],
        })
    }

    #[test]
    fn test_cursor_skips_invalid_rows() {
        let raws: Vec<RawRow> = (0..4).map(row).collect();
        let normalized = vec![ok_row(), bad_row(raws[1].clone()), ok_row(), ok_row()];
        let predictions = vec![
            PredictionResult::value(10.0),
            PredictionResult::error(1, "row rejected"),
            PredictionResult::value(30.0),
        ];

        let records = join(&raws, &normalized, predictions).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].prediction(), Some(PredictionValue(10.0)));
        assert_eq!(
            records[1].outcome,
            Outcome::NormalizationError {
                invalid_fields: vec!["a".to_string()]
            }
        );
        // Error at batch position 1 belongs to source row 2
        assert_eq!(
            records[2].outcome,
            Outcome::PredictionError(PredictionError {
                row: 2,
                message: "row rejected".to_string()
            })
        );
        assert_eq!(records[3].prediction(), Some(PredictionValue(30.0)));
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.raw, raws[i]);
        }
    }

    /// Every combination of normalization and prediction failures for
    /// batches up to six rows.
    #[test]
    fn test_length_preserved_for_all_masks() {
        for n in 0..=6usize {
            for norm_mask in 0..(1u32 << n) {
                let raws: Vec<RawRow> = (0..n).map(row).collect();
                let normalized: Vec<NormalizedRow> = (0..n)
                    .map(|i| {
                        if norm_mask & (1 << i) != 0 {
                            ok_row()
                        } else {
                            bad_row(raws[i].clone())
                        }
                    })
                    .collect();
                let dispatched = norm_mask.count_ones();

                for pred_mask in 0..(1u32 << dispatched) {
                    let predictions: Vec<PredictionResult> = (0..dispatched)
                        .map(|j| {
                            if pred_mask & (1 << j) != 0 {
                                PredictionResult::value(j as f64)
                            } else {
                                PredictionResult::error(j as usize, "failed")
                            }
                        })
                        .collect();

                    let records = join(&raws, &normalized, predictions).unwrap();
                    assert_eq!(records.len(), n);

                    let errors = records.iter().filter(|r| r.is_error()).count() as u32;
                    let expected_errors =
                        (n as u32 - dispatched) + (dispatched - pred_mask.count_ones());
                    assert_eq!(errors, expected_errors);
                    for (i, record) in records.iter().enumerate() {
                        assert_eq!(record.raw, raws[i]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let raws = vec![row(0)];
        assert!(matches!(
            join(&raws, &[], Vec::new()),
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            join(&raws, &[ok_row()], Vec::new()),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_dispatch_failure_targets_dispatched_rows() {
        let normalized = vec![ok_row(), bad_row(row(1)), ok_row()];
        let failures = dispatch_failure(&normalized, "service down");
        assert_eq!(
            failures,
            vec![
                PredictionResult::error(0, "service down"),
                PredictionResult::error(2, "service down"),
            ]
        );
    }
}
