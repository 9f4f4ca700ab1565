//! Narrative generation over a finalized summary.
//!
//! The backend is fixed at construction time by a capability check on the
//! credential: a present, non-blank API key selects the hosted model, and
//! anything else selects the deterministic template. The hosted call is
//! attempted exactly once, with no retry; any failure falls back locally
//! to the template, which is built from summary fields alone and cannot
//! fail. Narrative problems never surface to the caller as errors.

use std::{fmt::Write as _, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde_json::json;

use crate::summary::DatasetSummary;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const NUMERIC_COLUMN_LIMIT: usize = 5;
const CATEGORICAL_COLUMN_LIMIT: usize = 3;
const CATEGORICAL_VALUE_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct HostedConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
enum Backend {
    Hosted(HostedConfig),
    Template,
}

pub struct NarrativeGenerator {
    backend: Backend,
}

impl NarrativeGenerator {
    /// Selects the backend once. The credential qualifies only if present
    /// and non-blank; there is no per-request re-check.
    pub fn from_credential(credential: Option<&str>, model: &str, base_url: &str) -> Self {
        let backend = match credential.map(str::trim).filter(|key| !key.is_empty()) {
            Some(key) => Backend::Hosted(HostedConfig {
                api_key: key.to_string(),
                model: model.to_string(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
            None => Backend::Template,
        };
        Self { backend }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self.backend, Backend::Hosted(_))
    }

    /// Produces the narrative. Infallible by contract: hosted failures
    /// degrade to the deterministic template.
    pub fn generate(&self, summary: &DatasetSummary) -> String {
        match &self.backend {
            Backend::Template => render_template(summary),
            Backend::Hosted(config) => match hosted_insight(config, summary) {
                Ok(text) => text,
                Err(err) => {
                    warn!("Hosted narrative failed, using template: {err:#}");
                    render_template(summary)
                }
            },
        }
    }
}

/// Single chat-completions POST; no retry, no backoff.
fn hosted_insight(config: &HostedConfig, summary: &DatasetSummary) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Building HTTP client")?;
    let url = format!("{}/chat/completions", config.base_url);
    let body = json!({
        "model": config.model,
        "messages": [
            {
                "role": "system",
                "content": "You are a data analyst. Summarize the dataset profile below as \
                            concise Markdown with sections for key insights, risks, and \
                            recommended actions."
            },
            {
                "role": "user",
                "content": build_prompt(summary)
            }
        ],
        "temperature": 0.2,
    });
    let response = client
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .context("Sending narrative request")?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().unwrap_or_default();
        return Err(anyhow!("Narrative service returned {status}: {text}"));
    }
    let parsed: serde_json::Value = response.json().context("Parsing narrative response")?;
    let content = parsed["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow!("Narrative response missing message content"))?;
    info!("Hosted narrative produced {} byte(s)", content.len());
    Ok(content.to_string())
}

/// Prompt context: overview plus the first 5 numeric and first 3
/// categorical columns (top 3 values each).
pub fn build_prompt(summary: &DatasetSummary) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Dataset: {} rows, {} columns, date range {}.",
        summary.rows, summary.cols, summary.date_range
    );
    for (name, stats) in summary.numeric_stats.iter().take(NUMERIC_COLUMN_LIMIT) {
        let _ = writeln!(
            prompt,
            "Numeric '{name}': mean {:.4}, min {}, max {}, std {:.4}, {} missing.",
            stats.mean, stats.min, stats.max, stats.std, stats.missing
        );
    }
    for (name, table) in summary
        .categorical_stats
        .iter()
        .take(CATEGORICAL_COLUMN_LIMIT)
    {
        let values = table
            .iter()
            .take(CATEGORICAL_VALUE_LIMIT)
            .map(|(value, count)| format!("{value} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "Categorical '{name}': top values {values}.");
    }
    prompt
}

/// Deterministic fallback. Uses only summary fields and always produces
/// well-formed Markdown.
pub fn render_template(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Dataset profile\n");
    let _ = writeln!(
        out,
        "- **{} rows** across **{} columns** ({} missing value(s) overall).",
        summary.rows, summary.cols, summary.total_missing
    );
    let _ = writeln!(out, "- Date range: **{}**.", summary.date_range);

    let numeric: Vec<_> = summary
        .numeric_stats
        .iter()
        .take(NUMERIC_COLUMN_LIMIT)
        .collect();
    if !numeric.is_empty() {
        let _ = writeln!(out, "\n### Numeric columns\n");
        for (name, stats) in numeric {
            let _ = writeln!(
                out,
                "- `{name}`: mean {:.2} (min {}, max {}, std {:.2}), {} valid / {} missing.",
                stats.mean, stats.min, stats.max, stats.std, stats.count, stats.missing
            );
        }
    }

    let categorical: Vec<_> = summary
        .categorical_stats
        .iter()
        .take(CATEGORICAL_COLUMN_LIMIT)
        .collect();
    if !categorical.is_empty() {
        let _ = writeln!(out, "\n### Categorical columns\n");
        for (name, table) in categorical {
            if table.is_empty() {
                let _ = writeln!(out, "- `{name}`: no tracked values.");
                continue;
            }
            let values = table
                .iter()
                .take(CATEGORICAL_VALUE_LIMIT)
                .map(|(value, count)| format!("{value} ({count})"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "- `{name}`: most frequent {values}.");
        }
    }

    if summary.has_trend() {
        let _ = writeln!(
            out,
            "\nRecord volume spans {} distinct day(s); see the trend chart for the shape.",
            summary.trend_sorted.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::NumericSummary;
    use std::collections::BTreeMap;

    fn sample_summary() -> DatasetSummary {
        let mut numeric_stats = BTreeMap::new();
        numeric_stats.insert(
            "sales".to_string(),
            NumericSummary {
                min: 10.0,
                max: 30.0,
                mean: 20.0,
                std: 7.07,
                count: 5,
                missing: 0,
            },
        );
        let mut categorical_stats = BTreeMap::new();
        categorical_stats.insert(
            "region".to_string(),
            vec![("East".to_string(), 3), ("West".to_string(), 2)],
        );
        let mut trend = BTreeMap::new();
        trend.insert("2024-01-01".to_string(), 2);
        trend.insert("2024-01-02".to_string(), 3);
        DatasetSummary {
            rows: 5,
            cols: 3,
            numeric_stats,
            categorical_stats,
            missing_values: BTreeMap::new(),
            total_missing: 0,
            date_range: "2024-01-01 to 2024-01-02".to_string(),
            trend_sorted: trend,
        }
    }

    #[test]
    fn credential_check_fixes_the_backend_once() {
        let hosted =
            NarrativeGenerator::from_credential(Some("sk-test"), DEFAULT_MODEL, DEFAULT_BASE_URL);
        assert!(hosted.is_hosted());
        let blank =
            NarrativeGenerator::from_credential(Some("   "), DEFAULT_MODEL, DEFAULT_BASE_URL);
        assert!(!blank.is_hosted());
        let absent = NarrativeGenerator::from_credential(None, DEFAULT_MODEL, DEFAULT_BASE_URL);
        assert!(!absent.is_hosted());
    }

    #[test]
    fn template_is_deterministic_and_uses_summary_fields() {
        let summary = sample_summary();
        let first = render_template(&summary);
        let second = render_template(&summary);
        assert_eq!(first, second);
        assert!(first.contains("**5 rows** across **3 columns**"));
        assert!(first.contains("2024-01-01 to 2024-01-02"));
        assert!(first.contains("`sales`"));
        assert!(first.contains("East (3)"));
    }

    #[test]
    fn template_handles_degenerate_summaries() {
        let summary = DatasetSummary {
            rows: 0,
            cols: 0,
            numeric_stats: BTreeMap::new(),
            categorical_stats: BTreeMap::new(),
            missing_values: BTreeMap::new(),
            total_missing: 0,
            date_range: "N/A".to_string(),
            trend_sorted: BTreeMap::new(),
        };
        let text = render_template(&summary);
        assert!(text.contains("**0 rows**"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn prompt_limits_columns_per_contract() {
        let mut summary = sample_summary();
        for i in 0..9 {
            summary.numeric_stats.insert(
                format!("n{i}"),
                NumericSummary {
                    min: 0.0,
                    max: 1.0,
                    mean: 0.5,
                    std: 0.1,
                    count: 1,
                    missing: 0,
                },
            );
        }
        let prompt = build_prompt(&summary);
        let numeric_lines = prompt
            .lines()
            .filter(|line| line.starts_with("Numeric"))
            .count();
        assert_eq!(numeric_lines, 5);
    }
}
