//! Core domain types: domains, severities, rules, field paths and violations.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// One of the four data stores the validator understands.
///
/// Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Materials,
    Contaminants,
    Compounds,
    Settings,
}

impl Domain {
    /// Every domain, in report order.
    pub const ALL: [Domain; 4] = [
        Domain::Materials,
        Domain::Contaminants,
        Domain::Compounds,
        Domain::Settings,
    ];

    /// Lowercase name used in config, CLI flags and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Materials => "materials",
            Domain::Contaminants => "contaminants",
            Domain::Compounds => "compounds",
            Domain::Settings => "settings",
        }
    }

    /// Top-level key holding the `id -> record` mapping in the domain file.
    pub fn items_key(&self) -> &'static str {
        match self {
            Domain::Materials => "materials",
            Domain::Contaminants => "contamination_patterns",
            Domain::Compounds => "compounds",
            Domain::Settings => "settings",
        }
    }

    /// Capitalized name used in the text report.
    pub fn title(&self) -> &'static str {
        match self {
            Domain::Materials => "Materials",
            Domain::Contaminants => "Contaminants",
            Domain::Compounds => "Compounds",
            Domain::Settings => "Settings",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "materials" | "material" => Ok(Domain::Materials),
            "contaminants" | "contaminant" | "contamination_patterns" => Ok(Domain::Contaminants),
            "compounds" | "compound" => Ok(Domain::Compounds),
            "settings" | "setting" => Ok(Domain::Settings),
            other => Err(format!(
                "unknown domain '{other}': expected materials, contaminants, compounds, or settings"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How a violation affects the run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Blocks the report from passing.
    Error,
    /// Advisory only; never affects the exit code.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Identifier of the rule that produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    RecordShape,
    RequiredField,
    CategoryEnum,
    SubcategoryEnum,
    IdMismatch,
    IdFormat,
    IdSuffix,
    UnitMissing,
    UnitMismatch,
    UnitDimensionlessLiteral,
    PropertyValue,
    PropertyRange,
    ConfidenceMissing,
    SettingsParameterMissing,
    RelationshipLegacyList,
    LegacyPropertiesWrapper,
    RelationshipShape,
    RelationshipItem,
    RelationshipSectionMeta,
    RelationshipUndeclared,
    CrossReference,
    AsymmetricRelationship,
}

impl Rule {
    /// Kebab-case rule name as it appears in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::RecordShape => "record-shape",
            Rule::RequiredField => "required-field",
            Rule::CategoryEnum => "category-enum",
            Rule::SubcategoryEnum => "subcategory-enum",
            Rule::IdMismatch => "id-mismatch",
            Rule::IdFormat => "id-format",
            Rule::IdSuffix => "id-suffix",
            Rule::UnitMissing => "unit-missing",
            Rule::UnitMismatch => "unit-mismatch",
            Rule::UnitDimensionlessLiteral => "unit-dimensionless-literal",
            Rule::PropertyValue => "property-value",
            Rule::PropertyRange => "property-range",
            Rule::ConfidenceMissing => "confidence-missing",
            Rule::SettingsParameterMissing => "settings-parameter-missing",
            Rule::RelationshipLegacyList => "relationship-legacy-list",
            Rule::LegacyPropertiesWrapper => "legacy-properties-wrapper",
            Rule::RelationshipShape => "relationship-shape",
            Rule::RelationshipItem => "relationship-item",
            Rule::RelationshipSectionMeta => "relationship-section-meta",
            Rule::RelationshipUndeclared => "relationship-undeclared",
            Rule::CrossReference => "cross-reference",
            Rule::AsymmetricRelationship => "asymmetric-relationship",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

/// One step into a YAML tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a field inside a record, rendered as `a.b.items[2].id`.
///
/// The empty path refers to the record itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The record-level path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A single top-level key.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![Segment::Key(key.into())])
    }

    /// Extend the path with a mapping key.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// Extend the path with a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// Target of a cross-domain reference, attached to graph findings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Reference {
    pub target_domain: Domain,
    pub target_id: String,
}

/// A single rule failure on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Domain the offending record was loaded from.
    pub domain: Domain,
    /// Record id (the key it was loaded under).
    pub id: String,
    /// Path of the offending field inside the record.
    pub field_path: FieldPath,
    pub rule: Rule,
    pub severity: Severity,
    /// One-line description with expected vs actual.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
}

impl Violation {
    /// Create an ERROR violation.
    pub fn error(
        domain: Domain,
        id: impl Into<String>,
        field_path: FieldPath,
        rule: Rule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            id: id.into(),
            field_path,
            rule,
            severity: Severity::Error,
            message: message.into(),
            reference: None,
        }
    }

    /// Create a WARNING violation.
    pub fn warning(
        domain: Domain,
        id: impl Into<String>,
        field_path: FieldPath,
        rule: Rule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(domain, id, field_path, rule, message)
        }
    }

    /// Attach the target of a cross-domain reference.
    pub fn with_reference(mut self, target_domain: Domain, target_id: impl Into<String>) -> Self {
        self.reference = Some(Reference {
            target_domain,
            target_id: target_id.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Total report order: domain, id, field path, then rule and message.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.domain
            .cmp(&other.domain)
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.field_path.cmp(&other.field_path))
            .then_with(|| self.rule.cmp(&other.rule))
            .then_with(|| self.severity.cmp(&other.severity))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.reference.cmp(&other.reference))
    }
}
