//! Finding and report structures for breaking-change analysis.

use serde::{Deserialize, Serialize};

use crate::scope::{SymbolKind, SymbolRef};
use crate::types::Position;

/// Why a before-symbol is incompatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// No usable symbol of that name remains.
    Removed,
    /// The name now declares a different kind of entity, or a struct became
    /// a non-struct (or the reverse).
    KindChanged,
    /// Same kind of entity, incompatible type.
    TypeChanged,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Removed => "removed",
            ChangeKind::KindChanged => "kind changed",
            ChangeKind::TypeChanged => "type changed",
        }
    }
}

/// One side of a finding, rendered for humans and serializers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: SymbolKind,

    /// Go-style type text. Type declarations show their definition.
    pub type_text: String,

    pub position: Option<Position>,
}

impl Declaration {
    /// Render a symbol's declaration.
    pub fn of(symbol: SymbolRef<'_>) -> Self {
        let types = &symbol.table.types;
        let type_text = match symbol.kind() {
            SymbolKind::Type => types.display_definition(symbol.symbol.ty),
            _ => types.display(symbol.symbol.ty),
        };
        Self {
            kind: symbol.kind(),
            type_text,
            position: symbol.position().cloned(),
        }
    }

    /// `func F(int)` style one-liner.
    pub fn signature(&self, name: &str) -> String {
        match (self.kind, self.type_text.strip_prefix("func")) {
            (SymbolKind::Func, Some(rest)) => format!("func {}{}", name, rest),
            _ => format!("{} {} {}", self.kind.as_str(), name, self.type_text),
        }
    }
}

/// A before-symbol judged incompatible with the after snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    pub change: ChangeKind,
    pub before: Declaration,

    /// Absent when the symbol was removed.
    pub after: Option<Declaration>,
}

impl Finding {
    pub fn removed(before: SymbolRef<'_>) -> Self {
        Self {
            name: before.name().to_string(),
            change: ChangeKind::Removed,
            before: Declaration::of(before),
            after: None,
        }
    }

    pub fn changed(change: ChangeKind, before: SymbolRef<'_>, after: SymbolRef<'_>) -> Self {
        Self {
            name: before.name().to_string(),
            change,
            before: Declaration::of(before),
            after: Some(Declaration::of(after)),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        self.before.kind
    }

    /// Human-readable one-line description of the change.
    pub fn details(&self) -> String {
        match &self.after {
            None => format!("{} removed", self.before.signature(&self.name)),
            Some(after) => format!(
                "{} -> {}",
                self.before.signature(&self.name),
                after.signature(&self.name)
            ),
        }
    }

    /// File and line of the before declaration, when known.
    pub fn location(&self) -> String {
        self.before
            .position
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default()
    }
}

/// Counts per change kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub removed: u32,
    pub kind_changed: u32,
    pub type_changed: u32,

    /// Findings matched by the allow-list.
    pub allowed: u32,

    pub breaking: u32,
}

impl ReportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a reported finding.
    pub fn record(&mut self, change: ChangeKind) {
        match change {
            ChangeKind::Removed => self.removed += 1,
            ChangeKind::KindChanged => self.kind_changed += 1,
            ChangeKind::TypeChanged => self.type_changed += 1,
        }
        self.breaking += 1;
    }

    /// Generate human-readable summary string.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        if self.removed > 0 {
            parts.push(format!("{} removed", self.removed));
        }
        if self.kind_changed > 0 {
            parts.push(format!("{} kind changed", self.kind_changed));
        }
        if self.type_changed > 0 {
            parts.push(format!("{} type changed", self.type_changed));
        }

        let mut text = if parts.is_empty() {
            "No breaking changes".to_string()
        } else {
            format!(
                "{} breaking change{}: {}",
                self.breaking,
                if self.breaking == 1 { "" } else { "s" },
                parts.join(", ")
            )
        };
        if self.allowed > 0 {
            text.push_str(&format!(" ({} allowed)", self.allowed));
        }
        text
    }
}

/// Complete result of comparing two snapshots.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BreakingReport {
    /// Package name of the before snapshot.
    pub package: String,

    /// Breaking findings, in before-table order.
    pub findings: Vec<Finding>,

    /// Findings suppressed by the allow-list.
    pub allowed: Vec<Finding>,

    pub summary: ReportSummary,

    /// Human-readable summary text
    pub summary_text: String,

    /// Duration of the analysis in milliseconds
    pub duration_ms: f64,
}

impl BreakingReport {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }

    /// Add a breaking finding and update the summary.
    pub fn add_finding(&mut self, finding: Finding) {
        self.summary.record(finding.change);
        self.findings.push(finding);
    }

    /// Keep a finding the caller chose to accept.
    pub fn add_allowed(&mut self, finding: Finding) {
        self.summary.allowed += 1;
        self.allowed.push(finding);
    }

    /// Finalize the report with timing and summary text.
    pub fn finalize(&mut self, duration_ms: f64) {
        self.duration_ms = duration_ms;
        self.summary_text = self.summary.text();
    }

    pub fn is_breaking(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Names of the breaking findings, in order.
    pub fn names(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.name.as_str()).collect()
    }

    /// Filter findings by change kind.
    pub fn filter_change(&self, change: ChangeKind) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.change == change).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(kind: SymbolKind, type_text: &str) -> Declaration {
        Declaration {
            kind,
            type_text: type_text.to_string(),
            position: None,
        }
    }

    fn finding(name: &str, change: ChangeKind) -> Finding {
        Finding {
            name: name.to_string(),
            change,
            before: decl(SymbolKind::Func, "func(int)"),
            after: match change {
                ChangeKind::Removed => None,
                _ => Some(decl(SymbolKind::Func, "func(int, string)")),
            },
        }
    }

    #[test]
    fn test_change_kind_as_str() {
        assert_eq!(ChangeKind::Removed.as_str(), "removed");
        assert_eq!(ChangeKind::KindChanged.as_str(), "kind changed");
        assert_eq!(ChangeKind::TypeChanged.as_str(), "type changed");
    }

    #[test]
    fn test_declaration_signature() {
        assert_eq!(
            decl(SymbolKind::Func, "func(int) error").signature("F"),
            "func F(int) error"
        );
        assert_eq!(decl(SymbolKind::Var, "[]string").signature("V"), "var V []string");
        assert_eq!(
            decl(SymbolKind::Type, "struct{Foo int}").signature("T"),
            "type T struct{Foo int}"
        );
    }

    #[test]
    fn test_finding_details() {
        assert_eq!(
            finding("F", ChangeKind::TypeChanged).details(),
            "func F(int) -> func F(int, string)"
        );
        assert_eq!(finding("F", ChangeKind::Removed).details(), "func F(int) removed");
    }

    #[test]
    fn test_summary_text() {
        let mut summary = ReportSummary::new();
        assert_eq!(summary.text(), "No breaking changes");

        summary.record(ChangeKind::Removed);
        assert_eq!(summary.text(), "1 breaking change: 1 removed");

        summary.record(ChangeKind::TypeChanged);
        summary.allowed = 2;
        assert_eq!(
            summary.text(),
            "2 breaking changes: 1 removed, 1 type changed (2 allowed)"
        );
    }

    #[test]
    fn test_report_add_and_finalize() {
        let mut report = BreakingReport::new("pkg");
        report.add_finding(finding("A", ChangeKind::Removed));
        report.add_finding(finding("B", ChangeKind::TypeChanged));
        report.add_allowed(finding("C", ChangeKind::Removed));
        report.finalize(1.5);

        assert!(report.is_breaking());
        assert_eq!(report.names(), vec!["A", "B"]);
        assert_eq!(report.summary.breaking, 2);
        assert_eq!(report.summary.allowed, 1);
        assert_eq!(report.filter_change(ChangeKind::Removed).len(), 1);
        assert_eq!(report.duration_ms, 1.5);
        assert!(report.summary_text.contains("2 breaking changes"));
    }

    #[test]
    fn test_finding_serializes() {
        let json = serde_json::to_value(finding("F", ChangeKind::Removed)).unwrap();
        assert_eq!(json["name"], "F");
        assert_eq!(json["change"], "removed");
        assert_eq!(json["before"]["kind"], "func");
        assert!(json["after"].is_null());
    }
}
