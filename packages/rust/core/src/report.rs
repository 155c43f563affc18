//! Violation aggregation and rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Value, json};

use frontcheck_loader::Corpus;
use frontcheck_shared::{Domain, Rule, Severity, Violation};

/// Where one domain's records came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub domain: Domain,
    pub path: String,
    pub records: usize,
    pub sha256: String,
}

/// Outcome of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    violations: Vec<Violation>,
    sources: Vec<SourceSummary>,
}

/// Merge per-component violation lists into one report.
///
/// Violations are put in report order and exact duplicates dropped, so the
/// result does not depend on the order the lists were produced in.
pub fn aggregate(lists: Vec<Vec<Violation>>) -> Report {
    let mut violations: Vec<Violation> = lists.into_iter().flatten().collect();
    violations.sort_by(Violation::report_order);
    violations.dedup();
    Report {
        violations,
        sources: Vec::new(),
    }
}

impl Report {
    /// Record the source files of `corpus`.
    pub fn with_sources(mut self, corpus: &Corpus) -> Self {
        self.sources = corpus
            .iter()
            .map(|records| SourceSummary {
                domain: records.domain(),
                path: records.path().display().to_string(),
                records: records.len(),
                sha256: records.sha256().to_string(),
            })
            .collect();
        self
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(Violation::is_error)
    }

    /// 0 when no ERROR is present (warnings allowed), 1 otherwise.
    pub fn to_exit_code(&self) -> i32 {
        i32::from(self.has_errors())
    }

    pub fn counts_by_rule(&self) -> BTreeMap<Rule, usize> {
        let mut counts = BTreeMap::new();
        for v in &self.violations {
            *counts.entry(v.rule).or_insert(0) += 1;
        }
        counts
    }

    /// Human-readable report: summary line, then violations grouped by
    /// domain and record, then per-rule counts.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let records: usize = self.sources.iter().map(|s| s.records).sum();
        let _ = writeln!(
            out,
            "{}, {} ({} records in {} files)",
            plural(self.error_count(), "error"),
            plural(self.warning_count(), "warning"),
            records,
            self.sources.len()
        );

        let mut current: Option<(Domain, &str)> = None;
        for v in &self.violations {
            if current.map(|(d, _)| d) != Some(v.domain) {
                let _ = writeln!(out, "\n{}", v.domain.title());
            }
            if current != Some((v.domain, v.id.as_str())) {
                let _ = writeln!(out, "  {}", v.id);
                current = Some((v.domain, v.id.as_str()));
            }
            let path = if v.field_path.is_root() {
                "(record)".to_string()
            } else {
                v.field_path.to_string()
            };
            let _ = writeln!(
                out,
                "    {:<7} {path}: {} [{}]",
                v.severity.to_string(),
                v.message,
                v.rule
            );
        }

        let counts = self.counts_by_rule();
        if !counts.is_empty() {
            let _ = writeln!(out, "\nBy rule:");
            for (rule, count) in counts {
                let _ = writeln!(out, "  {rule:<28} {count}");
            }
        }

        out
    }

    /// Machine-readable report. Object keys are sorted and violations are in
    /// report order, so unchanged input renders byte-identically.
    pub fn to_json(&self) -> Value {
        let by_rule: serde_json::Map<String, Value> = self
            .counts_by_rule()
            .into_iter()
            .map(|(rule, count)| (rule.to_string(), json!(count)))
            .collect();

        let violations: Vec<Value> = self
            .violations
            .iter()
            .map(|v| {
                let mut entry = json!({
                    "domain": v.domain,
                    "id": v.id,
                    "field_path": v.field_path.to_string(),
                    "rule": v.rule,
                    "severity": v.severity,
                    "message": v.message,
                });
                if let (Some(reference), Some(map)) = (&v.reference, entry.as_object_mut()) {
                    map.insert(
                        "reference".to_string(),
                        json!({
                            "target_domain": reference.target_domain,
                            "target_id": reference.target_id,
                        }),
                    );
                }
                entry
            })
            .collect();

        let sources: serde_json::Map<String, Value> = self
            .sources
            .iter()
            .map(|s| {
                (
                    s.domain.to_string(),
                    json!({
                        "path": s.path,
                        "records": s.records,
                        "sha256": s.sha256,
                    }),
                )
            })
            .collect();

        json!({
            "summary": {
                "errors": self.error_count(),
                "warnings": self.warning_count(),
                "passed": !self.has_errors(),
                "by_rule": by_rule,
            },
            "sources": sources,
            "violations": violations,
        })
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontcheck_shared::FieldPath;

    fn sample() -> Vec<Vec<Violation>> {
        vec![
            vec![
                Violation::warning(
                    Domain::Settings,
                    "aluminum-settings",
                    FieldPath::key("relationships").child("suitable_materials"),
                    Rule::RelationshipSectionMeta,
                    "no sectionDescription",
                ),
                Violation::error(
                    Domain::Materials,
                    "steel-laser-cleaning",
                    FieldPath::key("category"),
                    Rule::RequiredField,
                    "missing required field 'category'",
                ),
            ],
            vec![
                Violation::error(
                    Domain::Materials,
                    "aluminum-laser-cleaning",
                    FieldPath::root(),
                    Rule::IdFormat,
                    "not kebab-case",
                ),
                Violation::error(
                    Domain::Contaminants,
                    "rust-contamination",
                    FieldPath::key("relationships")
                        .child("found_on_materials")
                        .child("items")
                        .index(0)
                        .child("id"),
                    Rule::CrossReference,
                    "'does-not-exist' does not exist in materials",
                )
                .with_reference(Domain::Materials, "does-not-exist"),
            ],
        ]
    }

    #[test]
    fn empty_report_passes() {
        let report = aggregate(Vec::new());
        assert!(!report.has_errors());
        assert_eq!(report.to_exit_code(), 0);
        assert!(report.to_text().starts_with("0 errors, 0 warnings"));
        assert!(!report.to_text().contains("By rule"));
    }

    #[test]
    fn warnings_alone_pass() {
        let report = aggregate(vec![vec![Violation::warning(
            Domain::Materials,
            "a",
            FieldPath::root(),
            Rule::IdSuffix,
            "suffix",
        )]]);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.to_exit_code(), 0);
    }

    #[test]
    fn errors_fail() {
        let report = aggregate(sample());
        assert_eq!(report.error_count(), 3);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.to_exit_code(), 1);
    }

    #[test]
    fn violations_sorted_by_domain_then_id() {
        let report = aggregate(sample());
        let keys: Vec<(Domain, &str)> = report
            .violations()
            .iter()
            .map(|v| (v.domain, v.id.as_str()))
            .collect();
        assert_eq!(
            keys,
            [
                (Domain::Materials, "aluminum-laser-cleaning"),
                (Domain::Materials, "steel-laser-cleaning"),
                (Domain::Contaminants, "rust-contamination"),
                (Domain::Settings, "aluminum-settings"),
            ]
        );
    }

    #[test]
    fn order_independent_of_input_order() {
        let forward = aggregate(sample());
        let mut lists = sample();
        lists.reverse();
        for list in &mut lists {
            list.reverse();
        }
        let backward = aggregate(lists);
        assert_eq!(
            forward.to_json().to_string(),
            backward.to_json().to_string()
        );
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut lists = sample();
        lists.push(sample().remove(0));
        assert_eq!(aggregate(lists).violations().len(), 4);
    }

    #[test]
    fn text_groups_by_domain_and_record() {
        let text = aggregate(sample()).to_text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("3 errors, 1 warning (0 records in 0 files)"));
        assert!(text.contains("\nMaterials\n  aluminum-laser-cleaning\n    ERROR   (record): not kebab-case [id-format]\n"));
        assert!(text.contains("  steel-laser-cleaning\n    ERROR   category: missing required field 'category' [required-field]\n"));
        assert!(text.contains("\nSettings\n  aluminum-settings\n    WARNING relationships.suitable_materials"));
        assert!(text.contains("By rule:"));
        assert_eq!(text.matches("\nMaterials\n").count(), 1);
    }

    #[test]
    fn json_shape() {
        let json = aggregate(sample()).to_json();
        assert_eq!(json["summary"]["errors"], 3);
        assert_eq!(json["summary"]["warnings"], 1);
        assert_eq!(json["summary"]["passed"], false);
        assert_eq!(json["summary"]["by_rule"]["cross-reference"], 1);

        let cross = &json["violations"][2];
        assert_eq!(cross["rule"], "cross-reference");
        assert_eq!(cross["severity"], "ERROR");
        assert_eq!(cross["domain"], "contaminants");
        assert_eq!(
            cross["field_path"],
            "relationships.found_on_materials.items[0].id"
        );
        assert_eq!(cross["reference"]["target_id"], "does-not-exist");
        assert!(json["violations"][0].get("reference").is_none());
    }

    #[test]
    fn json_keys_are_sorted() {
        let text = serde_json::to_string(&aggregate(sample()).to_json()).expect("json");
        let summary = text.find("\"summary\"").expect("summary");
        let sources = text.find("\"sources\"").expect("sources");
        let violations = text.find("\"violations\"").expect("violations");
        assert!(sources < summary && summary < violations);
    }
}
