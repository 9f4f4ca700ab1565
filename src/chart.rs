//! Chart specification selection over a finalized summary.
//!
//! This module decides *what* to chart and emits plain serde structs; it
//! never draws. The dashboard front end turns these specs into figures.

use serde::Serialize;

use crate::summary::DatasetSummary;

const BAR_TOP_N: usize = 10;

/// Daily record-volume line chart over the time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub title: String,
    pub points: Vec<(String, u64)>,
}

/// Top-value bar chart for the single best-populated categorical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub column: String,
    pub bars: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub trend: Option<TrendChart>,
    pub categories: Option<BarChart>,
}

pub fn select_charts(summary: &DatasetSummary) -> ChartSet {
    ChartSet {
        trend: trend_chart(summary),
        categories: category_chart(summary),
    }
}

/// A usable trend needs at least two distinct days.
pub fn trend_chart(summary: &DatasetSummary) -> Option<TrendChart> {
    if !summary.has_trend() {
        return None;
    }
    Some(TrendChart {
        title: "Records per day".to_string(),
        points: summary
            .trend_sorted
            .iter()
            .map(|(day, count)| (day.clone(), *count))
            .collect(),
    })
}

/// Picks the categorical column with the greatest total tracked frequency
/// mass (not the most distinct values, not the first alphabetically) and
/// charts its top 10 values.
pub fn category_chart(summary: &DatasetSummary) -> Option<BarChart> {
    let (column, table) = summary
        .categorical_stats
        .iter()
        .max_by_key(|(name, table)| {
            let mass: u64 = table.iter().map(|(_, count)| count).sum();
            (mass, std::cmp::Reverse(name.as_str()))
        })
        .filter(|(_, table)| !table.is_empty())?;
    Some(BarChart {
        title: format!("Top values of {column}"),
        column: column.clone(),
        bars: table.iter().take(BAR_TOP_N).cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn base_summary() -> DatasetSummary {
        DatasetSummary {
            rows: 0,
            cols: 0,
            numeric_stats: BTreeMap::new(),
            categorical_stats: BTreeMap::new(),
            missing_values: BTreeMap::new(),
            total_missing: 0,
            date_range: "N/A".to_string(),
            trend_sorted: BTreeMap::new(),
        }
    }

    #[test]
    fn trend_requires_two_distinct_days() {
        let mut summary = base_summary();
        assert!(trend_chart(&summary).is_none());
        summary
            .trend_sorted
            .insert("2024-01-01".to_string(), 3);
        assert!(trend_chart(&summary).is_none());
        summary
            .trend_sorted
            .insert("2024-01-02".to_string(), 2);
        let chart = trend_chart(&summary).expect("trend");
        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.points[0].0, "2024-01-01");
    }

    #[test]
    fn category_chart_picks_heaviest_tracked_mass() {
        let mut summary = base_summary();
        // "many_distinct" has more keys; "heavy" has more tracked mass.
        summary.categorical_stats.insert(
            "many_distinct".to_string(),
            vec![("a".into(), 1), ("b".into(), 1), ("c".into(), 1)],
        );
        summary
            .categorical_stats
            .insert("heavy".to_string(), vec![("x".into(), 100)]);
        let chart = category_chart(&summary).expect("bar chart");
        assert_eq!(chart.column, "heavy");
        assert_eq!(chart.bars, vec![("x".to_string(), 100)]);
    }

    #[test]
    fn empty_tables_yield_no_bar_chart() {
        let mut summary = base_summary();
        summary
            .categorical_stats
            .insert("label".to_string(), Vec::new());
        assert!(category_chart(&summary).is_none());
    }

    #[test]
    fn bar_chart_caps_at_ten_bars() {
        let mut summary = base_summary();
        let table: Vec<(String, u64)> = (0..20).map(|i| (format!("v{i:02}"), 20 - i)).collect();
        summary
            .categorical_stats
            .insert("label".to_string(), table);
        let chart = category_chart(&summary).expect("bar chart");
        assert_eq!(chart.bars.len(), 10);
    }
}
