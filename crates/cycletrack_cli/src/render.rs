//! Plain-text views over core results.

use chrono::NaiveDate;
use cycletrack_core::{
    days_until, CycleRecord, CycleStats, FertilityOutlook, LengthBucket, PredictionStatus,
    SymptomCount,
};

const MISSING: &str = "N/A";

pub fn history(cycles: &[CycleRecord]) -> String {
    if cycles.is_empty() {
        return "No cycles recorded yet. Use `cycletrack add` to log your first period.\n"
            .to_string();
    }

    let mut out = format!(
        "{:>4}  {:<10}  {:<10}  {:>5}  {:>6}  {:<12}  {:<10}  SYMPTOMS\n",
        "ID", "START", "END", "CYCLE", "PERIOD", "MOOD", "FLOW"
    );
    for cycle in cycles {
        out.push_str(&format!(
            "{:>4}  {:<10}  {:<10}  {:>5}  {:>6}  {:<12}  {:<10}  {}\n",
            cycle.id,
            cycle.start_date,
            cycle.end_date,
            cycle
                .cycle_length
                .map_or_else(|| MISSING.to_string(), |days| days.to_string()),
            cycle.period_length,
            cycle.mood.as_deref().unwrap_or(MISSING),
            cycle.flow_level.as_deref().unwrap_or(MISSING),
            if cycle.symptoms.is_empty() {
                "None".to_string()
            } else {
                cycle.symptoms.join(", ")
            }
        ));
    }
    out
}

pub fn stats(stats: &CycleStats) -> String {
    format!(
        "Total cycles:          {}\n\
         Average cycle length:  {}\n\
         Average period length: {}\n\
         Tracking since:        {}\n",
        stats.total_cycles,
        days_or_missing(stats.avg_cycle_length),
        days_or_missing(stats.avg_period_length),
        stats
            .first_record_date
            .map_or_else(|| MISSING.to_string(), |date| date.to_string())
    )
}

pub fn outlook(outlook: &FertilityOutlook, today: NaiveDate) -> String {
    let prediction = &outlook.prediction;
    let days = days_until(prediction.predicted_start, today);
    let status = PredictionStatus::from_days_until(days);

    format!(
        "Predicted start:    {}\n\
         Days until:         {days}\n\
         Status:             {}\n\
         \x20                   {}\n\
         Fertility window:   {} - {}\n\
         Expected ovulation: {}\n\
         Based on typical ovulation occurring 14 days before the next period.\n",
        prediction.predicted_start.format("%B %d, %Y"),
        status.label(),
        prediction.explanation,
        outlook.window.window_start.format("%b %d"),
        outlook.window.window_end.format("%b %d, %Y"),
        outlook.window.ovulation_date.format("%B %d, %Y"),
    )
}

pub fn symptoms(frequency: &[SymptomCount]) -> String {
    if frequency.is_empty() {
        return "No symptoms recorded.\n".to_string();
    }
    let width = frequency
        .iter()
        .map(|item| item.symptom.chars().count())
        .max()
        .unwrap_or(0);
    frequency
        .iter()
        .map(|item| format!("{:<width$}  {}\n", item.symptom, item.count))
        .collect()
}

pub fn histogram(buckets: &[LengthBucket]) -> String {
    if buckets.is_empty() {
        return "No cycle length data available.\n".to_string();
    }
    buckets
        .iter()
        .map(|bucket| {
            let range = if bucket.min_days == bucket.max_days {
                format!("{} days", bucket.min_days)
            } else {
                format!("{}-{} days", bucket.min_days, bucket.max_days)
            };
            format!("{range:>12}  {} {}\n", "#".repeat(bucket.count), bucket.count)
        })
        .collect()
}

fn days_or_missing(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |days| format!("{days:.1} days"))
}
