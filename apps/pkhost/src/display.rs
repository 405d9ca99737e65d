//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::Style;
use pk_backend::{CapabilityTable, TransactionOutcome};
use pk_types::{ExitStatus, InfoKind, PackageList};
use serde_json::json;
use std::io;
use std::path::Path;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the backend's bound roles
    pub fn render_roles(&self, table: &CapabilityTable) -> io::Result<()> {
        if self.json_output {
            let roles: Vec<&str> = table.roles().map(|role| role.as_str()).collect();
            return print_json(&json!({
                "description": table.description(),
                "author": table.author(),
                "cancel": table.supports_cancel(),
                "roles": roles,
                "groups": table.groups().iter().map(|g| g.as_str()).collect::<Vec<_>>(),
                "filters": table.filters().to_string(),
            }));
        }

        println!(
            "{} ({})",
            Style::new().bold().apply_to(table.description()),
            table.author()
        );
        for role in table.roles() {
            println!("  {role}");
        }
        if table.supports_cancel() {
            println!("  cancel");
        }
        Ok(())
    }

    /// Render a finished transaction
    pub fn render_outcome(&self, outcome: &TransactionOutcome) -> io::Result<()> {
        if self.json_output {
            let errors: Vec<_> = outcome
                .errors
                .iter()
                .map(|(kind, details)| json!({ "kind": kind.as_str(), "details": details }))
                .collect();
            return print_json(&json!({
                "transaction_id": outcome.transaction_id,
                "role": outcome.role,
                "exit": outcome.exit,
                "runtime_ms": outcome.runtime.map(|r| r.as_millis()),
                "packages": outcome.packages,
                "errors": errors,
            }));
        }

        if outcome.exit == Some(ExitStatus::Cancelled) {
            println!("{}", Style::new().yellow().apply_to("Transaction cancelled."));
        }
        if outcome.packages.is_empty() {
            if outcome.is_success() {
                println!("No packages found.");
            }
            return Ok(());
        }
        self.render_package_table(&outcome.packages);
        Ok(())
    }

    /// Render the offline cache contents
    pub fn render_cache(&self, path: &Path, packages: &PackageList) -> io::Result<()> {
        if self.json_output {
            return print_json(&json!({
                "path": path.display().to_string(),
                "packages": packages,
            }));
        }

        if packages.is_empty() {
            println!("Cache at {} is empty.", path.display());
            return Ok(());
        }
        self.render_package_table(packages);
        Ok(())
    }

    /// Render a one-line success message
    pub fn render_success_message(&self, message: &str) -> io::Result<()> {
        if self.json_output {
            return print_json(&json!({ "success": true, "message": message }));
        }
        println!("{message}");
        Ok(())
    }

    fn render_package_table(&self, packages: &PackageList) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Info").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Summary").add_attribute(Attribute::Bold),
        ]);

        for record in packages {
            table.add_row(vec![
                self.format_info(record.info()),
                Cell::new(record.package_id()),
                Cell::new(record.summary().unwrap_or("-")),
            ]);
        }

        println!("{table}");
    }

    fn format_info(&self, info: InfoKind) -> Cell {
        let cell = Cell::new(info);
        match info {
            InfoKind::Installed => cell.fg(Color::Green),
            InfoKind::Security | InfoKind::Important => cell.fg(Color::Red),
            InfoKind::Blocked => cell.fg(Color::Yellow),
            _ => cell,
        }
    }
}

fn print_json(value: &serde_json::Value) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}
