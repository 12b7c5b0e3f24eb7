use serde_json::Value;

use crate::models::report::Report;
use crate::utils::formatting::format_duration;

/// Render a report for humans: summary table, issues, mitigations.
pub fn format_report_markdown(report: &Report) -> String {
    let mut out = format!("# {} Report\n\n", title_case(&report.agent));

    out.push_str("## Summary\n\n| Field | Value |\n|---|---|\n");
    out.push_str(&format!("| Status | {} |\n", report.status));
    out.push_str(&format!("| Generated | {} |\n", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push_str(&format!("| Duration | {} |\n", format_duration(report.duration_ms)));
    for (key, value) in &report.stage_fields {
        out.push_str(&format!("| {} | {} |\n", title_case(key), cell(value)));
    }

    out.push_str("\n## Issues\n\n");
    push_list(&mut out, &report.issues, "No issues detected.");
    out.push_str("\n## Mitigations\n\n");
    push_list(&mut out, &report.mitigations, "No mitigations needed.");
    out
}

fn push_list(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        out.push_str(empty);
        out.push('\n');
        return;
    }
    for item in items {
        out.push_str(&format!("- {}\n", item.replace('\n', " ")));
    }
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    };
    text.replace('|', "\\|").replace('\n', " ")
}

/// `log-analysis` / `pod_status` -> `Log Analysis` / `Pod Status`
fn title_case(name: &str) -> String {
    name.split(|c| c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
