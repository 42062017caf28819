//! Evaluation results and their HTML rendering

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::InferenceError;
use crate::error::Result;

const METRICS_TABLE_TEMPLATE: &str = r#"<html>
    <head>
        <style>
            table, th, td {
                border: 1px solid black;
                border-collapse: collapse;
                padding: 10px;
            }
            th {
                background-color: #f2f2f2;
            }
        </style>
    </head>
    <body>
        <table>
            <tr>
                <th>Metric</th>
                <th>Value</th>
            </tr>
{% for row in rows %}            <tr><td>{{ row.label }}</td><td>{{ row.value }}</td></tr>
{% endfor %}        </table>
    </body>
</html>
"#;

/// Metric values with their labels, as returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: Vec<f64>,
    pub labels: Vec<String>,
}

#[derive(Serialize)]
struct MetricRow<'a> {
    label: &'a str,
    value: String,
}

impl Evaluation {
    pub fn new(metrics: Vec<f64>, labels: Vec<String>) -> Self {
        Self { metrics, labels }
    }

    /// Labels and metrics must pair up one-to-one
    pub fn check(&self) -> std::result::Result<(), InferenceError> {
        if self.metrics.len() != self.labels.len() {
            return Err(InferenceError::ModelFailure(format!(
                "evaluation returned {} metrics for {} labels",
                self.metrics.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// Metric values keyed by label
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.labels
            .iter()
            .cloned()
            .zip(self.metrics.iter().copied())
            .collect()
    }

    /// HTML table in model order, values rounded to four decimals
    pub fn to_html(&self) -> Result<String> {
        let rows: Vec<MetricRow<'_>> = self
            .labels
            .iter()
            .zip(&self.metrics)
            .map(|(label, value)| MetricRow {
                label,
                value: format!("{:.4}", value),
            })
            .collect();

        let mut env = Environment::new();
        env.add_template("metrics.html", METRICS_TABLE_TEMPLATE)?;
        let html = env.get_template("metrics.html")?.render(context! { rows => rows })?;
        Ok(html)
    }
}
