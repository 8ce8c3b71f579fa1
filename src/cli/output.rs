//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ServerConfig, ValidationResult};
use crate::glesys::{PowerState, ServerSnapshot};
use crate::planner::ActionDecision;
use crate::reconciler::{ReconcileOutcome, ReconcilePlan, ServerReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Server attribute row for table display.
#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Address row for table display.
#[derive(Tabled)]
struct AddressRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Version")]
    version: String,
}

/// Field change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Desired")]
    desired: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of `apply` or `destroy`.
    #[must_use]
    pub fn format_outcome(&self, outcome: &ReconcileOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => Self::format_outcome_text(outcome),
        }
    }

    fn format_outcome_text(outcome: &ReconcileOutcome) -> String {
        let mut output = String::new();

        let headline = if outcome.changed {
            format!("{} Changed", "~".yellow())
        } else {
            format!("{} Unchanged", "✓".green())
        };
        let _ = writeln!(output, "\n{headline}");

        if let Some(msg) = &outcome.msg {
            let _ = writeln!(output, "   {msg}");
        }

        if let Some(server) = &outcome.server {
            output.push('\n');
            output.push_str(&Self::format_report_text(server));
        }

        let _ = writeln!(
            output,
            "\nFinished at {}",
            outcome.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        output
    }

    /// Formats a plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ReconcilePlan, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan, detailed),
        }
    }

    fn format_plan_text(plan: &ReconcilePlan, detailed: bool) -> String {
        if !plan.has_changes() {
            return format!(
                "{} No changes required - the server is up to date.\n",
                "✓".green()
            );
        }

        let mut output = String::from("\nPlan\n");

        let action = match &plan.decision {
            ActionDecision::Create => "create".green().to_string(),
            ActionDecision::Update(_) => plan.decision.to_string().yellow().to_string(),
            ActionDecision::Delete => "delete".red().to_string(),
            ActionDecision::NoOp => "none".dimmed().to_string(),
        };
        let _ = writeln!(output, "   Action: {action}");

        if let Some(power) = plan.power {
            let _ = writeln!(output, "   Power:  {}", power.to_string().cyan());
        }

        if detailed {
            if let ActionDecision::Update(set) = &plan.decision {
                let rows: Vec<ChangeRow> = set
                    .changes
                    .iter()
                    .map(|c| ChangeRow {
                        field: c.field,
                        current: c.current.clone().unwrap_or_else(|| String::from("-")),
                        desired: c.desired.clone(),
                    })
                    .collect();
                output.push('\n');
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
            }
        }

        output
    }

    /// Formats the current server, or its absence.
    #[must_use]
    pub fn format_status(&self, snapshot: Option<&ServerSnapshot>) -> String {
        match self.format {
            OutputFormat::Json => {
                let report = snapshot.cloned().map(ServerReport::from);
                serde_json::to_string_pretty(&report).unwrap_or_default()
            }
            OutputFormat::Text => snapshot.map_or_else(
                || String::from("\n   Server not found.\n"),
                |s| Self::format_report_text(&ServerReport::from(s.clone())),
            ),
        }
    }

    fn format_report_text(report: &ServerReport) -> String {
        let server = &report.snapshot;
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Server {} ({})",
            server.hostname.bold(),
            server.serverid
        );

        let number = |v: Option<u32>| v.map_or_else(|| String::from("-"), |v| v.to_string());
        let text = |v: Option<&String>| v.cloned().unwrap_or_else(|| String::from("-"));

        let rows = vec![
            AttributeRow {
                field: "State",
                value: server
                    .state
                    .as_ref()
                    .map_or_else(|| String::from("-"), Self::format_state),
            },
            AttributeRow {
                field: "Address",
                value: text(report.ipaddress.as_ref()),
            },
            AttributeRow {
                field: "CPU cores",
                value: number(server.cpucores),
            },
            AttributeRow {
                field: "Memory (MB)",
                value: number(server.memorysize),
            },
            AttributeRow {
                field: "Disk (GB)",
                value: number(server.disksize),
            },
            AttributeRow {
                field: "Bandwidth",
                value: number(server.bandwidth),
            },
            AttributeRow {
                field: "Datacenter",
                value: text(server.datacenter.as_ref()),
            },
            AttributeRow {
                field: "Platform",
                value: text(server.platform.as_ref()),
            },
        ];
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if !server.iplist.is_empty() {
            let rows: Vec<AddressRow> = server
                .iplist
                .iter()
                .map(|ip| AddressRow {
                    address: ip.ipaddress.clone(),
                    version: format!("IPv{}", ip.version),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        output
    }

    fn format_state(state: &PowerState) -> String {
        match state {
            PowerState::Running => state.to_string().green().to_string(),
            PowerState::Stopped => state.to_string().red().to_string(),
            PowerState::Locked => state.to_string().yellow().to_string(),
            PowerState::Other(_) => state.to_string(),
        }
    }

    /// Formats the result of `validate`.
    #[must_use]
    pub fn format_validation(
        &self,
        config: &ServerConfig,
        result: &ValidationResult,
        show_warnings: bool,
    ) -> String {
        if let OutputFormat::Json = self.format {
            let json = serde_json::json!({
                "valid": result.is_valid(),
                "server": config.server,
                "warnings": result.warnings,
            });
            return serde_json::to_string_pretty(&json).unwrap_or_default();
        }

        let server = &config.server;
        let mut output = format!("{} Configuration is valid\n", "✓".green());
        let _ = writeln!(output, "   Server:   {}", server.label());
        let _ = writeln!(output, "   State:    {}", server.state);
        let _ = writeln!(
            output,
            "   Location: {} / {} / {}",
            server.datacenter, server.platform, server.template
        );

        if show_warnings {
            for warning in &result.warnings {
                let _ = writeln!(output, "{} {warning}", "⚠".yellow());
            }
        } else if result.warning_count() > 0 {
            let _ = writeln!(
                output,
                "   {} warning(s), use --warnings to show them",
                result.warning_count()
            );
        }

        output
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "status": "ok", "message": message }).to_string(),
            OutputFormat::Text => format!("{} {message}", "✓".green()),
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::json!({ "failed": true, "msg": message }).to_string()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }
}
