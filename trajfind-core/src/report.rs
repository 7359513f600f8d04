// Report generation for locate runs

use crate::retry::RunOutcome;
use chrono::{DateTime, Utc};
use colored::Colorize;
use trajfind_scanner::TrajectoryRecord;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Found,
    Exhausted,
    Stopped,
    Ignored,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Found => "found",
            RunStatus::Exhausted => "exhausted",
            RunStatus::Stopped => "stopped",
            RunStatus::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocateReport {
    /// Where the host graph came from, e.g. a snapshot file path.
    pub source: String,
    pub status: RunStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub record: Option<TrajectoryRecord>,
}

impl LocateReport {
    pub fn from_outcome(
        source: impl Into<String>,
        outcome: RunOutcome,
        max_attempts: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let (status, attempts, record) = match outcome {
            RunOutcome::Found { record, attempt } => (RunStatus::Found, attempt, Some(record)),
            RunOutcome::Exhausted { attempts } => (RunStatus::Exhausted, attempts, None),
            RunOutcome::Stopped { attempts } => (RunStatus::Stopped, attempts, None),
            RunOutcome::Ignored(_) => (RunStatus::Ignored, 0, None),
        };

        Self {
            source: source.into(),
            status,
            attempts,
            max_attempts,
            started_at,
            finished_at,
            record,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Found
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

pub fn render_report(report: &LocateReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => generate_json_report(report),
    }
}

pub fn generate_text_report(report: &LocateReport) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');
    out.push_str("                         TRAJFIND LOCATE REPORT\n");
    out.push_str(RULE);
    out.push_str("\n\n");

    let status = match report.status {
        RunStatus::Found => "FOUND".green().bold(),
        RunStatus::Exhausted => "NOT FOUND".red().bold(),
        RunStatus::Stopped => "STOPPED".yellow().bold(),
        RunStatus::Ignored => "IGNORED".yellow(),
    };

    out.push_str(&format!("Source:       {}\n", report.source));
    out.push_str(&format!("Status:       {}\n", status));
    out.push_str(&format!(
        "Attempts:     {} of {}\n",
        report.attempts, report.max_attempts
    ));
    out.push_str(&format!("Started:      {}\n", report.started_at.to_rfc3339()));
    out.push_str(&format!("Duration:     {} ms\n", report.duration_ms()));

    if let Some(ref record) = report.record {
        out.push('\n');
        out.push_str(RULE);
        out.push('\n');
        out.push_str("TRAJECTORY\n");
        out.push_str(RULE);
        out.push_str("\n\n");
        out.push_str(&format!("UUID:         {}\n", display_value(record.uuid())));
        out.push_str(&format!("Location:     {}\n", record.location()));
        match record.step_count() {
            Some(count) => out.push_str(&format!("Steps:        {}\n", count)),
            None => out.push_str(&format!("Steps:        {}\n", display_value(record.steps()))),
        }
    }

    out.push('\n');
    out
}

pub fn generate_json_report(report: &LocateReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "trajfind",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "format": "json"
            },
            "run": {
                "source": report.source,
                "status": report.status.as_str(),
                "attempts": report.attempts,
                "max_attempts": report.max_attempts,
                "started_at": report.started_at.to_rfc3339(),
                "finished_at": report.finished_at.to_rfc3339(),
                "duration_ms": report.duration_ms()
            },
            "trajectory": report.record.as_ref().map(|record| serde_json::json!({
                "location": record.location(),
                "data": record.as_value()
            }))
        }
    });

    serde_json::to_string_pretty(&json_report)
}

fn display_value(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
