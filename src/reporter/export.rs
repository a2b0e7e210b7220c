use anyhow::{Context, Result};
use std::fs;
use tera::{Context as TeraContext, Tera};

use crate::reporter::Report;

pub struct JsonExporter;

impl JsonExporter {
    pub fn export(report: &Report, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json).with_context(|| format!("Failed to write to {}", path))?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Report> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let report: Report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report file: {}", path))?;
        Ok(report)
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    pub fn export(report: &Report, path: &str) -> Result<()> {
        let mut tera = Tera::default();
        tera.add_raw_template("report", Self::get_template())?;

        let mut context = TeraContext::new();
        context.insert("target", &report.target);
        context.insert(
            "scan_time",
            &report.completed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        context.insert("truncated", &report.truncated);
        context.insert("overall_risk", &report.summary.overall_risk.to_string());
        context.insert("mean_score", &format!("{:.1}", report.summary.mean_risk_score));
        context.insert("total_endpoints", &report.summary.total_endpoints);
        context.insert("vulnerable_endpoints", &report.summary.vulnerable_endpoints);
        context.insert("critical_count", &report.summary.critical);
        context.insert("high_count", &report.summary.high);
        context.insert("medium_count", &report.summary.medium);
        context.insert("low_count", &report.summary.low);
        context.insert("info_count", &report.summary.info);

        let rows: Vec<HtmlFindingRow> = report
            .findings
            .iter()
            .map(|f| HtmlFindingRow {
                severity: f.severity.to_string(),
                severity_class: f.severity.to_string().to_lowercase(),
                kind: f.kind.to_string(),
                endpoint: f.endpoint.to_string(),
                cvss: format!("{:.1}", f.cvss_score),
                weakness_id: f.weakness_id.clone(),
                evidence: f.evidence.clone(),
            })
            .collect();
        context.insert("findings", &rows);

        let recs: Vec<HtmlRecRow> = report
            .summary
            .recommendations
            .iter()
            .map(|r| HtmlRecRow {
                kind: r.kind.to_string(),
                weakness_id: r.weakness_id.clone(),
                advice: r.advice.clone(),
                affected: r.affected.len(),
            })
            .collect();
        context.insert("recommendations", &recs);

        let html = tera.render("report", &context)?;
        fs::write(path, html).with_context(|| format!("Failed to write to {}", path))?;
        Ok(())
    }

    fn get_template() -> &'static str {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Talon Assessment Report</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0d1117; color: #c9d1d9; line-height: 1.6; }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        h1 { color: #58a6ff; margin-bottom: 0.5rem; }
        h2 { color: #c9d1d9; margin: 2rem 0 1rem; }
        .subtitle { color: #8b949e; margin-bottom: 2rem; }
        .banner { padding: 0.75rem 1rem; border-radius: 6px; margin-bottom: 2rem; font-weight: 600; }
        .banner.truncated { background: #d2992233; color: #d29922; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
        .stat { background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; text-align: center; }
        .stat-value { font-size: 2rem; font-weight: bold; }
        .stat-label { color: #8b949e; font-size: 0.875rem; }
        .critical .stat-value { color: #f85149; }
        .high .stat-value { color: #f85149; }
        .medium .stat-value { color: #d29922; }
        .low .stat-value { color: #58a6ff; }
        .info .stat-value { color: #8b949e; }
        .secure .stat-value { color: #3fb950; }
        table { width: 100%; border-collapse: collapse; background: #161b22; border: 1px solid #30363d; border-radius: 6px; overflow: hidden; }
        th, td { padding: 0.75rem 1rem; text-align: left; border-bottom: 1px solid #30363d; }
        th { background: #21262d; color: #c9d1d9; font-weight: 600; }
        tr:hover { background: #21262d; }
        .severity { padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }
        .severity.critical { background: #f8514933; color: #f85149; }
        .severity.high { background: #f8514933; color: #f85149; }
        .severity.medium { background: #d2992233; color: #d29922; }
        .severity.low { background: #58a6ff33; color: #58a6ff; }
        .severity.info { background: #8b949e33; color: #8b949e; }
        .evidence { font-size: 0.875rem; color: #8b949e; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Talon Assessment Report</h1>
        <p class="subtitle">{{ target }} &mdash; generated {{ scan_time }}</p>
        {% if truncated %}
        <div class="banner truncated">Session was truncated; results are partial</div>
        {% endif %}

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{{ total_endpoints }}</div>
                <div class="stat-label">Endpoints</div>
            </div>
            <div class="stat">
                <div class="stat-value">{{ vulnerable_endpoints }}</div>
                <div class="stat-label">Vulnerable</div>
            </div>
            <div class="stat critical">
                <div class="stat-value">{{ critical_count }}</div>
                <div class="stat-label">Critical</div>
            </div>
            <div class="stat high">
                <div class="stat-value">{{ high_count }}</div>
                <div class="stat-label">High</div>
            </div>
            <div class="stat medium">
                <div class="stat-value">{{ medium_count }}</div>
                <div class="stat-label">Medium</div>
            </div>
            <div class="stat low">
                <div class="stat-value">{{ low_count }}</div>
                <div class="stat-label">Low</div>
            </div>
            <div class="stat secure">
                <div class="stat-value">{{ overall_risk }}</div>
                <div class="stat-label">Overall risk ({{ mean_score }})</div>
            </div>
        </div>

        <h2>Findings</h2>
        <table>
            <thead>
                <tr>
                    <th>Severity</th>
                    <th>Class</th>
                    <th>Endpoint</th>
                    <th>CVSS</th>
                    <th>CWE</th>
                </tr>
            </thead>
            <tbody>
                {% for f in findings %}
                <tr>
                    <td><span class="severity {{ f.severity_class }}">{{ f.severity }}</span></td>
                    <td>{{ f.kind }}<div class="evidence">{{ f.evidence }}</div></td>
                    <td>{{ f.endpoint }}</td>
                    <td>{{ f.cvss }}</td>
                    <td>{{ f.weakness_id }}</td>
                </tr>
                {% endfor %}
            </tbody>
        </table>

        <h2>Recommendations</h2>
        <table>
            <thead>
                <tr>
                    <th>Class</th>
                    <th>CWE</th>
                    <th>Remediation</th>
                    <th>Affected</th>
                </tr>
            </thead>
            <tbody>
                {% for r in recommendations %}
                <tr>
                    <td>{{ r.kind }}</td>
                    <td>{{ r.weakness_id }}</td>
                    <td>{{ r.advice }}</td>
                    <td>{{ r.affected }}</td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
    </div>
</body>
</html>"#
    }
}

#[derive(serde::Serialize)]
struct HtmlFindingRow {
    severity: String,
    severity_class: String,
    kind: String,
    endpoint: String,
    cvss: String,
    weakness_id: String,
    evidence: String,
}

#[derive(serde::Serialize)]
struct HtmlRecRow {
    kind: String,
    weakness_id: String,
    advice: String,
    affected: usize,
}
