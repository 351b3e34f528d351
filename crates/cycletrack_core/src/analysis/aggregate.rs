//! Distribution helpers consumed by chart and summary views.

use crate::model::cycle::CycleRecord;
use serde::Serialize;
use std::collections::HashMap;

const MAX_HISTOGRAM_BUCKETS: i64 = 10;

/// Occurrences of one symptom tag across records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomCount {
    pub symptom: String,
    pub count: usize,
}

/// Inclusive cycle-length range and how many records fall into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthBucket {
    pub min_days: i64,
    pub max_days: i64,
    pub count: usize,
}

/// Counts symptom tags, most frequent first; ties sort by tag name.
pub fn symptom_frequency(records: &[CycleRecord]) -> Vec<SymptomCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for symptom in records.iter().flat_map(|record| record.symptoms.iter()) {
        *counts.entry(symptom.as_str()).or_default() += 1;
    }

    let mut frequency: Vec<SymptomCount> = counts
        .into_iter()
        .map(|(symptom, count)| SymptomCount {
            symptom: symptom.to_string(),
            count,
        })
        .collect();
    frequency.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.symptom.cmp(&b.symptom)));
    frequency
}

/// Buckets present cycle lengths into at most ten contiguous, equal-width
/// ranges starting at the shortest observed length.
///
/// Records without a cycle length are skipped. Buckets with a zero count are
/// kept so the ranges have no gaps.
pub fn cycle_length_histogram(records: &[CycleRecord]) -> Vec<LengthBucket> {
    let lengths: Vec<i64> = records
        .iter()
        .filter_map(|record| record.cycle_length)
        .collect();
    let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
        return Vec::new();
    };

    let span = max - min + 1;
    let width = ((span + MAX_HISTOGRAM_BUCKETS - 1) / MAX_HISTOGRAM_BUCKETS).max(1);
    let bucket_count = (span + width - 1) / width;

    let mut buckets: Vec<LengthBucket> = (0..bucket_count)
        .map(|index| LengthBucket {
            min_days: min + index * width,
            max_days: min + (index + 1) * width - 1,
            count: 0,
        })
        .collect();
    for length in lengths {
        let index = ((length - min) / width) as usize;
        buckets[index].count += 1;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(cycle_length: Option<i64>, symptoms: &[&str]) -> CycleRecord {
        let start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        CycleRecord {
            id: 1,
            start_date,
            end_date: start_date,
            cycle_length,
            period_length: 1,
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            mood: None,
            flow_level: None,
            notes: None,
            created_at: start_date.and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn symptom_frequency_orders_by_count_then_name() {
        let records = [
            record(None, &["Cramps", "Headache"]),
            record(Some(28), &["Bloating", "Cramps"]),
            record(Some(30), &["Headache", "Cramps"]),
            record(Some(29), &[]),
        ];

        let frequency = symptom_frequency(&records);
        let pairs: Vec<(&str, usize)> = frequency
            .iter()
            .map(|item| (item.symptom.as_str(), item.count))
            .collect();
        assert_eq!(
            pairs,
            vec![("Cramps", 3), ("Headache", 2), ("Bloating", 1)]
        );
    }

    #[test]
    fn symptom_frequency_is_empty_without_tags() {
        assert!(symptom_frequency(&[record(Some(28), &[])]).is_empty());
    }

    #[test]
    fn histogram_skips_missing_lengths_and_uses_unit_width_for_narrow_spans() {
        let records = [
            record(None, &[]),
            record(Some(28), &[]),
            record(Some(28), &[]),
            record(Some(30), &[]),
        ];

        let buckets = cycle_length_histogram(&records);
        assert_eq!(
            buckets,
            vec![
                LengthBucket { min_days: 28, max_days: 28, count: 2 },
                LengthBucket { min_days: 29, max_days: 29, count: 0 },
                LengthBucket { min_days: 30, max_days: 30, count: 1 },
            ]
        );
    }

    #[test]
    fn histogram_caps_bucket_count_for_wide_spans() {
        let records: Vec<CycleRecord> = [21, 25, 28, 35, 45]
            .iter()
            .map(|length| record(Some(*length), &[]))
            .collect();

        let buckets = cycle_length_histogram(&records);
        assert!(buckets.len() <= 10);
        assert_eq!(buckets.first().unwrap().min_days, 21);
        assert!(buckets.last().unwrap().max_days >= 45);
        assert_eq!(buckets.iter().map(|bucket| bucket.count).sum::<usize>(), 5);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].max_days + 1, pair[1].min_days);
        }
    }

    #[test]
    fn histogram_is_empty_without_lengths() {
        assert!(cycle_length_histogram(&[record(None, &[])]).is_empty());
    }
}
