//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the LitScout CLI.

use crate::progress::{ProgressEvent, ProgressEventType, SessionStatus, StatusRecord};
use crate::types::{ReportStatus, ResearchReport};
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the LitScout banner
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "LitScout".bright_cyan().bold(),
                version.dimmed(),
                "Parallel literature research".bright_white()
            );
        } else {
            println!("\n   LitScout {}\n   Parallel literature research\n", version);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print one line per subtopic report
    pub fn report_line(&self, task_id: &str, subtopic: &str, report: &ResearchReport) {
        let (marker, plain) = match report.status {
            ReportStatus::Complete => ("✓", "OK"),
            ReportStatus::Error => ("✗", "ERROR"),
            ReportStatus::Timeout => ("⏱", "TIMEOUT"),
        };

        if self.colored {
            let marker = match report.status {
                ReportStatus::Complete => marker.green().bold().to_string(),
                ReportStatus::Error => marker.red().bold().to_string(),
                ReportStatus::Timeout => marker.yellow().bold().to_string(),
            };
            println!(
                "  {} {} {} {}",
                marker,
                task_id.dimmed(),
                subtopic.bright_white(),
                format!("({} chars)", report.text.len()).dimmed()
            );
        } else {
            println!(
                "  [{}] {} {} ({} chars)",
                plain,
                task_id,
                subtopic,
                report.text.len()
            );
        }
    }

    /// Print one progress log event
    pub fn event(&self, event: &ProgressEvent) {
        let time = event.timestamp.format("%H:%M:%S").to_string();
        let task = event.task.as_deref().unwrap_or("-");
        let percent = event
            .progress
            .map(|p| format!("{:>3}%", p))
            .unwrap_or_else(|| "    ".to_string());

        if self.colored {
            let kind = format!("{:<16}", event.event_type.to_string());
            let kind = match event.event_type {
                ProgressEventType::PhaseStart | ProgressEventType::PhaseComplete => {
                    kind.bright_cyan().bold().to_string()
                }
                ProgressEventType::TaskComplete => kind.green().to_string(),
                ProgressEventType::TaskStart | ProgressEventType::ProgressUpdate => {
                    kind.blue().to_string()
                }
            };
            println!(
                "  {} {} {} {:<12} {}",
                time.dimmed(),
                kind,
                percent.bright_white(),
                task.dimmed(),
                event.details
            );
        } else {
            println!(
                "  {} {:<16} {} {:<12} {}",
                time,
                event.event_type.to_string(),
                percent,
                task,
                event.details
            );
        }
    }

    /// Print the contents of a status file
    pub fn status(&self, record: &StatusRecord) {
        let status = record.status.to_string();
        let status = if self.colored {
            match record.status {
                SessionStatus::Completed => status.green().bold().to_string(),
                SessionStatus::Error => status.red().bold().to_string(),
                SessionStatus::Running | SessionStatus::Initializing => {
                    status.yellow().bold().to_string()
                }
                SessionStatus::New | SessionStatus::Paused => status.dimmed().to_string(),
            }
        } else {
            status
        };

        let session = record
            .session_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        self.kv("session", &session);
        if self.colored {
            println!("    {}: {}", "status".dimmed(), status);
        } else {
            println!("    status: {}", status);
        }
        self.kv("last updated", &record.last_updated.to_rfc3339());
        if let Some(error) = &record.error {
            self.kv("error", error);
        }
    }

    /// Print a written file path
    pub fn created(&self, path: &str) {
        if self.colored {
            println!("  {} {} {}", "✓".green().bold(), "report".dimmed(), path.bright_white());
        } else {
            println!("  [CREATED] report {}", path);
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
