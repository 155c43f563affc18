//! Record-level field rules: shape, required keys, category enums, ids.

use std::sync::LazyLock;

use regex::Regex;

use frontcheck_catalog::Catalog;
use frontcheck_shared::{Domain, FieldPath, Node, Rule, Violation};

/// Kebab-case: lowercase alphanumerics separated by single dashes.
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("id regex"));

/// A record payload must be a mapping before any other rule can look at it.
pub fn check_record_shape(domain: Domain, id: &str, record: &Node) -> Option<Violation> {
    if record.as_mapping().is_some() {
        return None;
    }
    Some(Violation::error(
        domain,
        id,
        FieldPath::root(),
        Rule::RecordShape,
        format!("record should be a mapping, found {}", record.kind()),
    ))
}

/// One ERROR per required top-level key that is absent, null, or an empty string.
pub fn check_required_fields(
    domain: Domain,
    id: &str,
    record: &Node,
    required: &[String],
) -> Vec<Violation> {
    required
        .iter()
        .filter_map(|field| {
            let message = match record.get(field) {
                None => format!("missing required field '{field}'"),
                Some(value) if value.is_blank() => {
                    format!("required field '{field}' is empty")
                }
                Some(_) => return None,
            };
            Some(Violation::error(
                domain,
                id,
                FieldPath::key(field.as_str()),
                Rule::RequiredField,
                message,
            ))
        })
        .collect()
}

/// Category and subcategory membership.
///
/// A missing category is the required-field rule's business and is not
/// reported here. Subcategories are only checked under a valid category.
pub fn check_category_enum(
    domain: Domain,
    id: &str,
    record: &Node,
    catalog: &Catalog,
) -> Vec<Violation> {
    if !catalog.has_categories(domain) {
        return Vec::new();
    }

    let category = match record.get("category") {
        None => return Vec::new(),
        Some(node) if node.is_blank() => return Vec::new(),
        Some(Node::String(category)) => category.as_str(),
        Some(other) => {
            return vec![Violation::error(
                domain,
                id,
                FieldPath::key("category"),
                Rule::CategoryEnum,
                format!("category should be a string, found {}", other.kind()),
            )];
        }
    };

    if !catalog.is_valid_category(domain, category) {
        let allowed: Vec<&str> = catalog.categories(domain).collect();
        return vec![Violation::error(
            domain,
            id,
            FieldPath::key("category"),
            Rule::CategoryEnum,
            format!(
                "unknown category '{category}'; expected one of: {}",
                allowed.join(", ")
            ),
        )];
    }

    let subcategory = match record.get("subcategory") {
        None => return Vec::new(),
        Some(node) if node.is_blank() => return Vec::new(),
        Some(Node::String(sub)) => sub.as_str(),
        Some(other) => {
            return vec![Violation::error(
                domain,
                id,
                FieldPath::key("subcategory"),
                Rule::SubcategoryEnum,
                format!("subcategory should be a string, found {}", other.kind()),
            )];
        }
    };

    let allowed = catalog.valid_subcategories(domain, category);
    if allowed.contains(subcategory) {
        return Vec::new();
    }

    vec![Violation::error(
        domain,
        id,
        FieldPath::key("subcategory"),
        Rule::SubcategoryEnum,
        format!(
            "subcategory '{subcategory}' is not valid for category '{category}'; expected one of: {}",
            allowed.into_iter().collect::<Vec<_>>().join(", ")
        ),
    )]
}

/// The record's own `id`, when present, must equal the key it was loaded under.
pub fn check_id_field(domain: Domain, expected_id: &str, record: &Node) -> Vec<Violation> {
    let message = match record.get("id") {
        None => return Vec::new(),
        Some(Node::String(actual)) if actual == expected_id => return Vec::new(),
        Some(Node::String(actual)) => {
            format!("id '{actual}' does not match the record key '{expected_id}'")
        }
        Some(other) => format!("id should be a string, found {}", other.kind()),
    };

    vec![Violation::error(
        domain,
        expected_id,
        FieldPath::key("id"),
        Rule::IdMismatch,
        message,
    )]
}

/// Ids are kebab-case and should carry the domain's suffix.
pub fn check_naming_convention(domain: Domain, id: &str, catalog: &Catalog) -> Vec<Violation> {
    if !ID_RE.is_match(id) {
        return vec![Violation::error(
            domain,
            id,
            FieldPath::root(),
            Rule::IdFormat,
            format!("id '{id}' is not kebab-case (lowercase letters, digits, single dashes)"),
        )];
    }

    match catalog.domain(domain).id_suffix.as_deref() {
        Some(suffix) if !id.ends_with(suffix) => vec![Violation::warning(
            domain,
            id,
            FieldPath::root(),
            Rule::IdSuffix,
            format!("id '{id}' should end with '{suffix}'"),
        )],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{builtin, yaml};
    use frontcheck_shared::Severity;

    fn required(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn non_mapping_record_is_reported_once() {
        let v = check_record_shape(Domain::Compounds, "x-compound", &yaml("[1, 2]"))
            .expect("violation");
        assert_eq!(v.rule, Rule::RecordShape);
        assert!(v.message.contains("sequence"));
        assert!(check_record_shape(Domain::Compounds, "x", &yaml("{}")).is_none());
    }

    #[test]
    fn one_error_per_missing_required_field() {
        let fields = required(&["name", "category", "subcategory"]);
        let record = yaml("name: Aluminum\n");

        let violations =
            check_required_fields(Domain::Materials, "aluminum-laser-cleaning", &record, &fields);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.severity == Severity::Error));
        assert!(violations.iter().all(|v| v.rule == Rule::RequiredField));
        let paths: Vec<String> = violations.iter().map(|v| v.field_path.to_string()).collect();
        assert_eq!(paths, ["category", "subcategory"]);
    }

    #[test]
    fn required_fields_exhaustive_over_subsets() {
        let fields = ["name", "category", "subcategory", "description"];
        // every subset of present fields
        for mask in 0u32..(1 << fields.len()) {
            let mut text = String::new();
            for (i, field) in fields.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    text.push_str(&format!("{field}: present\n"));
                }
            }
            let record = if text.is_empty() { yaml("{}") } else { yaml(&text) };
            let missing = fields.len() - mask.count_ones() as usize;
            let violations =
                check_required_fields(Domain::Materials, "m", &record, &required(&fields));
            assert_eq!(violations.len(), missing, "mask {mask:#06b}");
        }
    }

    #[test]
    fn null_and_empty_count_as_missing() {
        let record = yaml("name: \"\"\ncategory:\n");
        let violations =
            check_required_fields(Domain::Materials, "m", &record, &required(&["name", "category"]));
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.contains("is empty"));
    }

    #[test]
    fn valid_category_and_subcategory_pass() {
        let record = yaml("category: metal\nsubcategory: non-ferrous\n");
        assert!(check_category_enum(Domain::Materials, "a", &record, &builtin()).is_empty());
    }

    #[test]
    fn unknown_category_is_an_error_and_skips_subcategory() {
        let record = yaml("category: metals\nsubcategory: whatever\n");
        let violations = check_category_enum(Domain::Materials, "a", &record, &builtin());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::CategoryEnum);
        assert!(violations[0].message.contains("'metals'"));
    }

    #[test]
    fn subcategory_must_belong_to_category() {
        let record = yaml("category: metal\nsubcategory: hardwood\n");
        let violations = check_category_enum(Domain::Materials, "a", &record, &builtin());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::SubcategoryEnum);
        assert_eq!(violations[0].field_path.to_string(), "subcategory");
    }

    #[test]
    fn missing_category_is_left_to_required_fields() {
        let record = yaml("name: Aluminum\nsubcategory: non-ferrous\n");
        assert!(check_category_enum(Domain::Materials, "a", &record, &builtin()).is_empty());
    }

    #[test]
    fn domains_without_enum_skip_category_checks() {
        let record = yaml("category: anything\n");
        assert!(check_category_enum(Domain::Settings, "a", &record, &builtin()).is_empty());
    }

    #[test]
    fn id_field_must_match_key() {
        let record = yaml("id: copper-laser-cleaning\n");
        let violations = check_id_field(Domain::Materials, "aluminum-laser-cleaning", &record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::IdMismatch);
        assert!(violations[0].message.contains("copper-laser-cleaning"));

        let ok = yaml("id: aluminum-laser-cleaning\n");
        assert!(check_id_field(Domain::Materials, "aluminum-laser-cleaning", &ok).is_empty());
        assert!(check_id_field(Domain::Materials, "x", &yaml("name: X\n")).is_empty());
        assert_eq!(check_id_field(Domain::Materials, "x", &yaml("id: 7\n")).len(), 1);
    }

    #[test]
    fn naming_convention() {
        let catalog = builtin();
        assert!(check_naming_convention(Domain::Materials, "aluminum-laser-cleaning", &catalog)
            .is_empty());

        let bad = check_naming_convention(Domain::Materials, "Aluminum_Laser", &catalog);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].rule, Rule::IdFormat);
        assert!(bad[0].is_error());

        let suffix = check_naming_convention(Domain::Contaminants, "rust", &catalog);
        assert_eq!(suffix.len(), 1);
        assert_eq!(suffix[0].rule, Rule::IdSuffix);
        assert_eq!(suffix[0].severity, Severity::Warning);

        assert_eq!(check_naming_convention(Domain::Compounds, "double--dash", &catalog).len(), 1);
    }
}
