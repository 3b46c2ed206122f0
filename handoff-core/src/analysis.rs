//! Grouped aggregations over [`UsageRecord`]s.
//!
//! Every grouping keeps keys in the order they are first seen in the input,
//! so reports are stable across runs and ranking ties resolve to the
//! feature that appears first in the dataset.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::usage::UsageRecord;

/// Sum of `session_revenue_usd` over all records.
pub fn total_revenue(records: &[UsageRecord]) -> f64 {
    records.iter().map(|r| r.session_revenue_usd).sum()
}

/// Partition `records` by `key`, groups in first-seen key order.
pub fn group_by<'a, F>(records: &'a [UsageRecord], key: F) -> Vec<(String, Vec<&'a UsageRecord>)>
where
    F: Fn(&UsageRecord) -> &str,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a UsageRecord>)> = Vec::new();
    for record in records {
        let k = key(record);
        match positions.get(k) {
            Some(&i) => groups[i].1.push(record),
            None => {
                positions.insert(k, groups.len());
                groups.push((k.to_string(), vec![record]));
            }
        }
    }
    groups
}

fn sum_by<F, V>(records: &[UsageRecord], key: F, value: V) -> Vec<(String, f64)>
where
    F: Fn(&UsageRecord) -> &str,
    V: Fn(&UsageRecord) -> f64,
{
    group_by(records, key)
        .into_iter()
        .map(|(k, rows)| (k, rows.into_iter().map(&value).sum()))
        .collect()
}

pub fn revenue_by_user_segment(records: &[UsageRecord]) -> Vec<(String, f64)> {
    sum_by(records, |r| r.user_segment.as_str(), |r| r.session_revenue_usd)
}

pub fn revenue_by_feature(records: &[UsageRecord]) -> Vec<(String, f64)> {
    sum_by(records, |r| r.feature_name.as_str(), |r| r.session_revenue_usd)
}

/// Mean `tokens_used` per feature.
pub fn avg_tokens_by_feature(records: &[UsageRecord]) -> Vec<(String, f64)> {
    group_by(records, |r| r.feature_name.as_str())
        .into_iter()
        .map(|(feature, rows)| {
            let total: u64 = rows.iter().map(|r| r.tokens_used).sum();
            (feature, total as f64 / rows.len() as f64)
        })
        .collect()
}

/// Features ranked by revenue, highest first. Ties keep first-seen order.
pub fn top_n_features_by_revenue(records: &[UsageRecord], n: usize) -> Vec<(String, f64)> {
    let mut ranked = revenue_by_feature(records);
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Mean `response_time_ms`, or `0.0` when there are no records.
pub fn average_latency(records: &[UsageRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let total: u64 = records.iter().map(|r| r.response_time_ms).sum();
    total as f64 / records.len() as f64
}

/// The six results printed by the usage report, in print order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub total_revenue: f64,
    pub revenue_by_user_segment: Vec<(String, f64)>,
    pub revenue_by_feature: Vec<(String, f64)>,
    pub avg_tokens_by_feature: Vec<(String, f64)>,
    pub top_n: usize,
    pub top_features_by_revenue: Vec<(String, f64)>,
    pub average_latency_ms: f64,
}

impl UsageReport {
    pub fn from_records(records: &[UsageRecord], top_n: usize) -> Self {
        Self {
            total_revenue: total_revenue(records),
            revenue_by_user_segment: revenue_by_user_segment(records),
            revenue_by_feature: revenue_by_feature(records),
            avg_tokens_by_feature: avg_tokens_by_feature(records),
            top_n,
            top_features_by_revenue: top_n_features_by_revenue(records, top_n),
            average_latency_ms: average_latency(records),
        }
    }
}

/// Two decimal places, printed in shortest form (`40.0`, `132.5`).
struct Rounded(f64);

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `+ 0.0` turns -0.0 (the sum of no values) into 0.0
        write!(f, "{:?}", (self.0 * 100.0).round() / 100.0 + 0.0)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, rows: &[(String, f64)]) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    for (key, value) in rows {
        writeln!(f, "{key} {}", Rounded(*value))?;
    }
    Ok(())
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total revenue: {}", Rounded(self.total_revenue))?;
        write_section(f, "Revenue by user segment:", &self.revenue_by_user_segment)?;
        write_section(f, "Revenue by feature:", &self.revenue_by_feature)?;
        write_section(f, "Average tokens used per feature:", &self.avg_tokens_by_feature)?;
        write_section(
            f,
            &format!("Top {} revenue generating features:", self.top_n),
            &self.top_features_by_revenue,
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Average response time (ms): {}",
            Rounded(self.average_latency_ms)
        )
    }
}
