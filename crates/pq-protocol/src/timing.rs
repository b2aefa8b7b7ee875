//! Timing breakdown reported by the agent and its text rendering.

use serde_json::Value;

/// Per-phase timings of one agent run, in milliseconds.
///
/// Every field is optional on the wire; anything absent or non-numeric is
/// read as zero. Tool order follows the order received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSummary {
    pub planner_llm_ms: f64,
    pub synthesis_llm_ms: f64,
    pub tools_ms: Vec<(String, f64)>,
    pub total_ms: f64,
}

impl TimingSummary {
    /// Read a `timing_summary` object. Non-object values yield all zeros.
    pub fn from_value(value: &Value) -> Self {
        let tools_ms = value
            .get("tools_ms")
            .and_then(Value::as_object)
            .map(|tools| {
                tools
                    .iter()
                    .map(|(name, ms)| (name.clone(), ms.as_f64().unwrap_or(0.0)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            planner_llm_ms: number_field(value, "planner_llm_ms"),
            synthesis_llm_ms: number_field(value, "synthesis_llm_ms"),
            tools_ms,
            total_ms: number_field(value, "total_ms"),
        }
    }

    /// Lines of the timing panel, top to bottom. The `Tools:` block is only
    /// present when at least one tool reported a duration.
    pub fn panel_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Planner LLM: {} s", format_seconds(self.planner_llm_ms)),
            format!("Synthesis LLM: {} s", format_seconds(self.synthesis_llm_ms)),
        ];
        if !self.tools_ms.is_empty() {
            lines.push("Tools:".to_string());
            for (name, ms) in &self.tools_ms {
                lines.push(format!("  • {}: {} s", name, format_seconds(*ms)));
            }
        }
        lines.push(self.total_line());
        lines
    }

    pub fn total_line(&self) -> String {
        format!("Total: {} s", format_seconds(self.total_ms))
    }
}

fn number_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Render milliseconds as seconds in shortest decimal form, always with a
/// fractional part: 4200 -> "4.2", 1000 -> "1.0", 1234 -> "1.234".
pub fn format_seconds(ms: f64) -> String {
    let text = (ms / 1000.0).to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
