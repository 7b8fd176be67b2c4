//! Display formatting for CLI output

use console::style;
use extship_core::ValidationResult;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

/// Validation findings for one manifest, grouped for display
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub file: String,
    pub issues: Vec<ValidationIssue>,
    pub filled: Vec<String>,
}

impl ValidationReport {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn from_result(file: impl Into<String>, result: &ValidationResult) -> Self {
        let mut report = Self::new(file);
        for error in &result.errors {
            report.add_error(error);
        }
        for warning in &result.warnings {
            report.add_warning(warning);
        }
        report.filled = result.filled.clone();
        report
    }

    pub fn add_error(&mut self, message: &str) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, message: &str) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.to_string(),
        });
    }

    /// Print filled fields and findings, errors first
    pub fn display(&self) {
        if self.filled.is_empty() && self.issues.is_empty() {
            return;
        }

        println!();
        println!("{}", style(&self.file).cyan().bold());

        for field in &self.filled {
            println!("  {} added {}", style("+").green(), style(field).bold());
        }

        let mut issues: Vec<&ValidationIssue> = self.issues.iter().collect();
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));

        for issue in issues {
            let icon = match issue.severity {
                Severity::Error => style("✗").red(),
                Severity::Warning => style("⚠").yellow(),
            };
            println!("  {} {}", icon, issue.message);
        }
    }

    /// Error and warning counts
    pub fn summary(&self) -> (usize, usize) {
        let errors = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        (errors, self.issues.len() - errors)
    }

    pub fn has_errors(&self) -> bool {
        self.summary().0 > 0
    }

    pub fn print_summary(&self) {
        let (errors, warnings) = self.summary();
        if self.has_errors() {
            println!(
                "{} Validation failed: {} error(s), {} warning(s)",
                style("✗").red().bold(),
                errors,
                warnings
            );
        } else if warnings > 0 {
            println!(
                "{} Validation passed with {} warning(s)",
                style("⚠").yellow().bold(),
                warnings
            );
        } else {
            println!("{} Validation passed!", style("✓").green().bold());
        }
    }
}
