use colored::Colorize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::models::Severity;
use crate::reporter::Report;
use crate::risk::RiskBucket;

pub struct ConsoleReporter;

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "CVSS")]
    cvss: String,
    #[tabled(rename = "CWE")]
    cwe: String,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, report: &Report) {
        self.print_summary(report);
        self.print_findings(report);
        self.print_recommendations(report);
        self.print_notes(report);
    }

    fn severity_label(severity: Severity) -> String {
        match severity {
            Severity::Critical => "CRITICAL".red().bold().to_string(),
            Severity::High => "HIGH".red().to_string(),
            Severity::Medium => "MEDIUM".yellow().to_string(),
            Severity::Low => "LOW".blue().to_string(),
            Severity::Info => "INFO".cyan().to_string(),
        }
    }

    fn risk_label(bucket: RiskBucket) -> String {
        match bucket {
            RiskBucket::Critical => "CRITICAL".red().bold().to_string(),
            RiskBucket::High => "HIGH".red().to_string(),
            RiskBucket::Medium => "MEDIUM".yellow().to_string(),
            RiskBucket::Low => "LOW".blue().to_string(),
            RiskBucket::Secure => "SECURE".green().to_string(),
        }
    }

    fn print_summary(&self, report: &Report) {
        let summary = &report.summary;
        println!("\n{}", "Summary".bold().underline());
        println!("Target: {}", report.target.white().bold());
        println!(
            "{} endpoints discovered, {} vulnerable, {} findings",
            summary.total_endpoints,
            summary.vulnerable_endpoints,
            summary.total_findings()
        );
        if summary.critical > 0 {
            println!("  {}: {}", "CRITICAL".red().bold(), summary.critical);
        }
        if summary.high > 0 {
            println!("  {}: {}", "HIGH".red(), summary.high);
        }
        if summary.medium > 0 {
            println!("  {}: {}", "MEDIUM".yellow(), summary.medium);
        }
        if summary.low > 0 {
            println!("  {}: {}", "LOW".blue(), summary.low);
        }
        if summary.info > 0 {
            println!("  {}: {}", "INFO".cyan(), summary.info);
        }
        println!(
            "Overall risk: {} (mean endpoint score {:.1})",
            Self::risk_label(summary.overall_risk),
            summary.mean_risk_score
        );
        if report.truncated {
            println!(
                "{}",
                "Session was truncated; results are partial".yellow().bold()
            );
        }
    }

    fn print_findings(&self, report: &Report) {
        if report.findings.is_empty() {
            println!("\n{}", "No findings".green());
            return;
        }

        let mut findings = report.findings.clone();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));

        let rows: Vec<FindingRow> = findings
            .iter()
            .map(|f| FindingRow {
                severity: Self::severity_label(f.severity),
                class: f.kind.to_string(),
                endpoint: f.endpoint.to_string(),
                cvss: format!("{:.1}", f.cvss_score),
                cwe: f.weakness_id.clone(),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("\n{}", table);

        println!("\n{}", "Evidence".bold().underline());
        for finding in &findings {
            println!(
                "\n[{}] {} at {}",
                Self::severity_label(finding.severity),
                finding.kind.to_string().yellow(),
                finding.endpoint
            );
            println!("  → {}", finding.evidence);
        }
    }

    fn print_recommendations(&self, report: &Report) {
        let recs = &report.summary.recommendations;
        if recs.is_empty() {
            return;
        }
        println!("\n{}", "Recommendations".bold().underline());
        for rec in recs {
            println!(
                "\n[{}] {} ({})",
                Self::severity_label(rec.max_severity),
                rec.kind.to_string().white().bold(),
                rec.weakness_id
            );
            println!("  {}: {}", "Fix".cyan(), rec.advice);
            println!("  Affected: {} endpoint(s)", rec.affected.len());
        }
    }

    fn print_notes(&self, report: &Report) {
        if report.inconclusive.is_empty() && report.notes.is_empty() {
            return;
        }
        println!("\n{}", "Session notes".bold().underline());
        for note in &report.notes {
            println!("  [{}] {}", note.source.cyan(), note.message);
        }
        for entry in &report.inconclusive {
            println!(
                "  [{}] {} on {}: {}",
                "inconclusive".yellow(),
                entry.probe,
                entry.endpoint,
                entry.reason
            );
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
