//! Property entry rules: unit vocabulary, numeric consistency, machine settings.
//!
//! A property entry is any mapping holding a `value` or `unit` key below one
//! of the domain's property roots. Entries sit directly in the root or inside
//! category groups, which may carry `label`/`description`/`percentage`.
//! The dimensionless-literal check is wider and covers every `{value, unit}`
//! mapping in the record.

use frontcheck_catalog::{Catalog, DIMENSIONLESS_LITERAL};
use frontcheck_shared::{AccessError, Domain, FieldPath, Node, Rule, Violation};

/// Group-level keys that describe a category group rather than a property.
pub(crate) const METADATA_KEYS: [&str; 5] = ["label", "description", "percentage", "title", "_section"];

/// A located property entry.
#[derive(Debug, Clone)]
pub struct PropertyEntry<'a> {
    /// Property name (the key the entry sits under).
    pub name: &'a str,
    pub path: FieldPath,
    pub node: &'a Node,
}

/// Whether `node` looks like a property entry rather than a group.
pub(crate) fn is_property_entry(node: &Node) -> bool {
    node.has("value") || node.has("unit")
}

/// Every property entry under the domain's property roots, in key order.
pub fn property_entries<'a>(
    domain: Domain,
    record: &'a Node,
    catalog: &Catalog,
) -> Vec<PropertyEntry<'a>> {
    let mut out = Vec::new();
    for root in &catalog.domain(domain).property_roots {
        if let Some(node) = record.get(root) {
            collect_entries(node, FieldPath::key(root.as_str()), &mut out);
        }
    }
    out
}

fn collect_entries<'a>(node: &'a Node, path: FieldPath, out: &mut Vec<PropertyEntry<'a>>) {
    let Some(map) = node.as_mapping() else {
        return;
    };
    for (key, child) in map {
        if METADATA_KEYS.contains(&key.as_str()) || child.as_mapping().is_none() {
            continue;
        }
        let child_path = path.child(key.as_str());
        if is_property_entry(child) {
            out.push(PropertyEntry {
                name: key,
                path: child_path,
                node: child,
            });
        } else {
            collect_entries(child, child_path, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Every property entry's unit must match the vocabulary.
///
/// `unit: "dimensionless"` yields exactly one error recommending `unit: ""`
/// wherever the entry sits, and suppresses the other unit checks for it.
pub fn check_unit_consistency(
    domain: Domain,
    id: &str,
    record: &Node,
    catalog: &Catalog,
) -> Vec<Violation> {
    let mut out = Vec::new();
    dimensionless_literals(domain, id, record, FieldPath::root(), &mut out);

    for entry in property_entries(domain, record, catalog) {
        let unit_path = entry.path.child("unit");
        let expected = describe_expected(catalog, entry.name);

        let unit = match entry.node.str_field("unit") {
            Ok(unit) => unit,
            Err(AccessError::WrongType { found, .. }) if found != "null" => {
                out.push(Violation::error(
                    domain,
                    id,
                    unit_path,
                    Rule::UnitMismatch,
                    format!("unit should be a string, found {found}"),
                ));
                continue;
            }
            Err(_) => {
                out.push(Violation::error(
                    domain,
                    id,
                    unit_path,
                    Rule::UnitMissing,
                    format!("property '{}' has no unit{expected}", entry.name),
                ));
                continue;
            }
        };

        if is_dimensionless_literal(unit) {
            continue;
        }

        if !catalog.knows_property(entry.name) {
            continue;
        }

        let want = catalog.expected_unit(entry.name).unwrap_or("");
        if unit == want {
            continue;
        }

        let hint = match catalog.canonical_unit_for_alias(unit) {
            Some(canonical) if canonical == want => {
                format!(" ('{unit}' is a loose spelling of '{want}')")
            }
            _ => String::new(),
        };
        out.push(Violation::error(
            domain,
            id,
            unit_path,
            Rule::UnitMismatch,
            format!("expected unit \"{want}\", found \"{unit}\"{hint}"),
        ));
    }

    out
}

fn is_dimensionless_literal(unit: &str) -> bool {
    unit.trim().eq_ignore_ascii_case(DIMENSIONLESS_LITERAL)
}

/// Report `unit: "dimensionless"` on every property-shaped mapping in the
/// tree, inside or outside the property roots. `_section` blocks are skipped.
fn dimensionless_literals(
    domain: Domain,
    id: &str,
    node: &Node,
    path: FieldPath,
    out: &mut Vec<Violation>,
) {
    match node {
        Node::Mapping(_) if is_property_entry(node) => match node.str_field("unit") {
            Ok(unit) if is_dimensionless_literal(unit) => out.push(Violation::error(
                domain,
                id,
                path.child("unit"),
                Rule::UnitDimensionlessLiteral,
                format!(
                    "unit '{unit}' is not a unit; write unit: \"\" for dimensionless quantities"
                ),
            )),
            _ => {}
        },
        Node::Mapping(map) => {
            for (key, child) in map {
                if key != "_section" {
                    dimensionless_literals(domain, id, child, path.child(key.as_str()), out);
                }
            }
        }
        Node::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                dimensionless_literals(domain, id, item, path.index(i), out);
            }
        }
        _ => {}
    }
}

fn describe_expected(catalog: &Catalog, property: &str) -> String {
    if !catalog.knows_property(property) {
        return String::new();
    }
    match catalog.expected_unit(property) {
        Some(unit) => format!("; expected \"{unit}\""),
        None => "; expected \"\" (dimensionless)".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Numeric consistency
// ---------------------------------------------------------------------------

/// `value`, `min`, `max` are numbers; `min <= value <= max`; confidence in `[0, 1]`.
///
/// A missing confidence is a warning.
pub fn check_property_values(
    domain: Domain,
    id: &str,
    record: &Node,
    catalog: &Catalog,
) -> Vec<Violation> {
    let mut out = Vec::new();

    for entry in property_entries(domain, record, catalog) {
        let value = numeric_key(domain, id, &entry, "value", true, &mut out);
        let min = numeric_key(domain, id, &entry, "min", false, &mut out);
        let max = numeric_key(domain, id, &entry, "max", false, &mut out);

        match (min, max) {
            (Some(lo), Some(hi)) if lo > hi => out.push(Violation::error(
                domain,
                id,
                entry.path.clone(),
                Rule::PropertyRange,
                format!("property '{}' has min {lo} greater than max {hi}", entry.name),
            )),
            _ => {
                if let Some(v) = value {
                    let below = min.is_some_and(|lo| v < lo);
                    let above = max.is_some_and(|hi| v > hi);
                    if below || above {
                        out.push(Violation::error(
                            domain,
                            id,
                            entry.path.child("value"),
                            Rule::PropertyRange,
                            format!(
                                "value {v} of '{}' lies outside [{}, {}]",
                                entry.name,
                                min.map_or("-inf".to_string(), |m| m.to_string()),
                                max.map_or("inf".to_string(), |m| m.to_string()),
                            ),
                        ));
                    }
                }
            }
        }

        match entry.node.number_field("confidence") {
            Err(AccessError::Missing { .. }) => out.push(Violation::warning(
                domain,
                id,
                entry.path.child("confidence"),
                Rule::ConfidenceMissing,
                format!("property '{}' has no confidence score", entry.name),
            )),
            Ok(c) if !(0.0..=1.0).contains(&c) => out.push(Violation::error(
                domain,
                id,
                entry.path.child("confidence"),
                Rule::PropertyRange,
                format!("confidence {c} is outside [0, 1]"),
            )),
            Err(AccessError::WrongType { found, .. }) => out.push(Violation::error(
                domain,
                id,
                entry.path.child("confidence"),
                Rule::PropertyValue,
                format!("confidence should be a number, found {found}"),
            )),
            Ok(_) | Err(AccessError::NotAMapping { .. }) => {}
        }
    }

    out
}

/// Read `key` as a number, reporting a wrong type. Absent optional keys are `None`.
fn numeric_key(
    domain: Domain,
    id: &str,
    entry: &PropertyEntry<'_>,
    key: &str,
    required: bool,
    out: &mut Vec<Violation>,
) -> Option<f64> {
    match entry.node.number_field(key) {
        Ok(n) => Some(n),
        Err(AccessError::Missing { .. }) if !required => None,
        Err(AccessError::Missing { .. }) => {
            out.push(Violation::error(
                domain,
                id,
                entry.path.child(key),
                Rule::PropertyValue,
                format!("property '{}' has no {key}", entry.name),
            ));
            None
        }
        Err(AccessError::WrongType { found, .. }) => {
            out.push(Violation::error(
                domain,
                id,
                entry.path.child(key),
                Rule::PropertyValue,
                format!("{key} of '{}' should be a number, found {found}", entry.name),
            ));
            None
        }
        Err(AccessError::NotAMapping { .. }) => None,
    }
}

// ---------------------------------------------------------------------------
// Machine settings
// ---------------------------------------------------------------------------

/// Settings records must define every required machine parameter with an
/// operating window (`min` and `max`).
///
/// Value types are checked by [`check_property_values`]; this rule only adds
/// presence and window requirements.
pub fn check_settings_data(id: &str, record: &Node, catalog: &Catalog) -> Vec<Violation> {
    let domain = Domain::Settings;
    let schema = catalog.domain(domain);
    let entries = property_entries(domain, record, catalog);
    let root = schema
        .property_roots
        .first()
        .map(String::as_str)
        .unwrap_or("machine_settings");

    let mut out = Vec::new();
    for parameter in &schema.required_parameters {
        let Some(entry) = entries.iter().find(|e| e.name == parameter.as_str()) else {
            out.push(Violation::error(
                domain,
                id,
                FieldPath::key(root).child(parameter.as_str()),
                Rule::SettingsParameterMissing,
                format!("machine parameter '{parameter}' is not defined"),
            ));
            continue;
        };

        let missing: Vec<&str> = ["min", "max"]
            .into_iter()
            .filter(|k| !entry.node.has(k))
            .collect();
        if !missing.is_empty() {
            out.push(Violation::error(
                domain,
                id,
                entry.path.clone(),
                Rule::PropertyRange,
                format!(
                    "machine parameter '{parameter}' has no operating window (missing {})",
                    missing.join(" and ")
                ),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{builtin, yaml};
    use frontcheck_shared::Severity;

    #[test]
    fn entries_found_in_groups_and_root() {
        let record = yaml(
            r#"
properties:
  density: { value: 2.7, unit: "g/cm³" }
  thermal:
    label: Thermal
    percentage: 40
    meltingPoint: { value: 660, unit: "°C" }
    nested:
      specificHeat: { value: 900, unit: "J/(kg·K)" }
"#,
        );
        let catalog = builtin();
        let names: Vec<&str> = property_entries(Domain::Materials, &record, &catalog)
            .iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["density", "meltingPoint", "specificHeat"]);
    }

    #[test]
    fn dimensionless_literal_is_exactly_one_error() {
        let catalog = builtin();
        // Known dimensionless, known dimensioned, and unknown properties alike.
        for property in ["absorptivity", "density", "inventedQuantity"] {
            let record = yaml(&format!(
                "properties:\n  {property}:\n    value: 0.4\n    unit: dimensionless\n    confidence: 0.9\n"
            ));
            let violations =
                check_unit_consistency(Domain::Contaminants, "rust-contamination", &record, &catalog);
            assert_eq!(violations.len(), 1, "{property}: {violations:?}");
            assert_eq!(violations[0].rule, Rule::UnitDimensionlessLiteral);
            assert_eq!(violations[0].severity, Severity::Error);
            assert!(violations[0].message.contains("unit: \"\""));
        }
    }

    #[test]
    fn dimensionless_literal_outside_property_roots() {
        let record = yaml(
            r#"
laser_properties:
  optical:
    absorptivity: { value: 0.4, unit: dimensionless, confidence: 0.9 }
relationships:
  produces_compounds:
    presentation: card
    items:
      - id: iron-oxide-compound
        properties:
          yield: { value: 0.2, unit: Dimensionless }
    _section:
      note: { value: 1, unit: dimensionless }
"#,
        );
        let violations =
            check_unit_consistency(Domain::Contaminants, "rust-contamination", &record, &builtin());
        let paths: Vec<String> = violations.iter().map(|v| v.field_path.to_string()).collect();
        assert_eq!(
            paths,
            [
                "laser_properties.optical.absorptivity.unit",
                "relationships.produces_compounds.items[0].properties.yield.unit",
            ]
        );
        assert!(violations.iter().all(|v| v.rule == Rule::UnitDimensionlessLiteral));
    }

    #[test]
    fn dimensionless_literal_ignores_case() {
        let record = yaml("properties:\n  reflectivity: { value: 0.9, unit: Dimensionless }\n");
        let violations = check_unit_consistency(Domain::Materials, "m", &record, &builtin());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::UnitDimensionlessLiteral);
    }

    #[test]
    fn empty_unit_is_correct_for_dimensionless_property() {
        let record = yaml("properties:\n  absorptivity: { value: 0.4, unit: \"\" }\n");
        assert!(check_unit_consistency(Domain::Materials, "m", &record, &builtin()).is_empty());
    }

    #[test]
    fn mismatched_unit_mentions_alias() {
        let record = yaml("properties:\n  density: { value: 2.7, unit: g/cm3 }\n");
        let violations = check_unit_consistency(Domain::Materials, "m", &record, &builtin());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::UnitMismatch);
        assert!(violations[0].message.contains("loose spelling"));
        assert_eq!(violations[0].field_path.to_string(), "properties.density.unit");
    }

    #[test]
    fn missing_unit_is_an_error() {
        let record = yaml("properties:\n  density: { value: 2.7 }\n");
        let violations = check_unit_consistency(Domain::Materials, "m", &record, &builtin());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::UnitMissing);
        assert!(violations[0].message.contains("g/cm³"));
    }

    #[test]
    fn unknown_properties_accept_any_unit() {
        let record = yaml("properties:\n  glossLevel: { value: 80, unit: GU }\n");
        assert!(check_unit_consistency(Domain::Materials, "m", &record, &builtin()).is_empty());
    }

    #[test]
    fn numeric_rules() {
        let record = yaml(
            r#"
properties:
  density: { value: 2.7, unit: "g/cm³", min: 3.0, max: 2.0, confidence: 0.9 }
  meltingPoint: { value: 900, unit: "°C", min: 600, max: 700, confidence: 0.9 }
  hardness: { value: "hard", unit: HV, confidence: 1.5 }
  porosity: { value: 1, unit: "%" }
"#,
        );
        let violations = check_property_values(Domain::Materials, "m", &record, &builtin());
        let summary: Vec<(String, Rule)> = violations
            .iter()
            .map(|v| (v.field_path.to_string(), v.rule))
            .collect();
        assert_eq!(
            summary,
            [
                ("properties.density".to_string(), Rule::PropertyRange),
                ("properties.hardness.value".to_string(), Rule::PropertyValue),
                ("properties.hardness.confidence".to_string(), Rule::PropertyRange),
                ("properties.meltingPoint.value".to_string(), Rule::PropertyRange),
                ("properties.porosity.confidence".to_string(), Rule::ConfidenceMissing),
            ]
        );
        assert_eq!(violations[4].severity, Severity::Warning);
    }

    #[test]
    fn settings_data_requires_parameters_and_windows() {
        let record = yaml(
            r#"
machine_settings:
  powerRange: { value: 100, unit: W, min: 20, max: 200 }
  wavelength: { value: 1064, unit: nm }
  spotSize: { value: 50, unit: "μm", min: 20, max: 100 }
  repetitionRate: { value: 50, unit: kHz, min: 20, max: 100 }
  pulseWidth: { value: 100, unit: ns, min: 10, max: 200 }
"#,
        );
        let violations = check_settings_data("aluminum-settings", &record, &builtin());
        assert_eq!(violations.len(), 2, "{violations:?}");
        assert_eq!(violations[0].rule, Rule::PropertyRange);
        assert_eq!(violations[0].field_path.to_string(), "machine_settings.wavelength");
        assert_eq!(violations[1].rule, Rule::SettingsParameterMissing);
        assert_eq!(violations[1].field_path.to_string(), "machine_settings.scanSpeed");
    }
}
