//! Structural checks for relationship sections and property groups.
//!
//! The canonical relationship section is
//! `{presentation, items: [{id, ...}], _section: {sectionTitle, sectionDescription}}`.
//! Sections sit directly under the relationship root or one level down in a
//! named group. Every superseded layout (bare lists, `properties` wrappers,
//! sections without metadata) is an error.

use frontcheck_catalog::{Catalog, PRESENTATIONS};
use frontcheck_shared::{Domain, FieldPath, Mapping, Node, Rule, Violation};

use crate::properties::is_property_entry;

/// Keys that mark a mapping as a relationship section.
const SECTION_KEYS: [&str; 4] = ["presentation", "items", "_section", "properties"];

/// Keys whose presence next to a `properties` wrapper marks the legacy group layout.
const GROUP_METADATA: [&str; 3] = ["label", "description", "percentage"];

/// A relationship section located inside a record.
#[derive(Debug, Clone)]
pub struct SectionRef<'a> {
    /// Section key, e.g. `found_on_materials`.
    pub name: &'a str,
    pub path: FieldPath,
    pub node: &'a Node,
}

impl<'a> SectionRef<'a> {
    /// `(index, id)` of every item that carries a non-empty string id.
    pub fn item_ids(&self) -> Vec<(usize, &'a str)> {
        self.node
            .sequence_field("items")
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match item.str_field("id") {
                Ok(id) if !id.trim().is_empty() => Some((i, id)),
                _ => None,
            })
            .collect()
    }
}

/// Every mapping-shaped relationship section of a record, grouped or not.
///
/// Sections with a broken outer shape are skipped; the shape check reports them.
pub fn relationship_sections<'a>(
    domain: Domain,
    record: &'a Node,
    catalog: &Catalog,
) -> Vec<SectionRef<'a>> {
    let root_key = catalog.domain(domain).relationship_root.as_str();
    let Ok(root) = record.mapping_field(root_key) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let root_path = FieldPath::key(root_key);
    for (name, node) in root {
        let Some(map) = node.as_mapping() else {
            continue;
        };
        let path = root_path.child(name.as_str());
        if is_section(domain, name, map, false, catalog) {
            out.push(SectionRef { name, path, node });
            continue;
        }
        for (child_name, child) in map {
            if child.as_mapping().is_some() {
                out.push(SectionRef {
                    name: child_name,
                    path: path.child(child_name.as_str()),
                    node: child,
                });
            }
        }
    }
    out
}

/// A mapping under the relationship root is a section when it is inside a
/// group, is declared in the catalog, carries a section key, or is empty.
fn is_section(domain: Domain, name: &str, map: &Mapping, in_group: bool, catalog: &Catalog) -> bool {
    in_group
        || map.is_empty()
        || catalog.relationship(domain, name).is_some()
        || SECTION_KEYS.iter().any(|k| map.contains_key(*k))
}

/// Check every relationship section and property group of a record.
pub fn check_relationship_shape(
    domain: Domain,
    id: &str,
    record: &Node,
    catalog: &Catalog,
) -> Vec<Violation> {
    let mut checker = ShapeChecker {
        domain,
        id,
        catalog,
        out: Vec::new(),
    };

    let schema = catalog.domain(domain);
    for root in &schema.property_roots {
        if let Some(node) = record.get(root) {
            checker.property_root(root, node);
        }
    }

    let root_key = schema.relationship_root.as_str();
    if let Some(node) = record.get(root_key) {
        checker.relationship_root(root_key, node);
    }

    checker.out
}

struct ShapeChecker<'a> {
    domain: Domain,
    id: &'a str,
    catalog: &'a Catalog,
    out: Vec<Violation>,
}

impl ShapeChecker<'_> {
    fn error(&mut self, path: FieldPath, rule: Rule, message: String) {
        self.out
            .push(Violation::error(self.domain, self.id, path, rule, message));
    }

    fn warning(&mut self, path: FieldPath, rule: Rule, message: String) {
        self.out
            .push(Violation::warning(self.domain, self.id, path, rule, message));
    }

    // -- property groups ----------------------------------------------------

    fn property_root(&mut self, key: &str, node: &Node) {
        let path = FieldPath::key(key);
        match node.as_mapping() {
            Some(map) => self.property_group(map, &path),
            None => self.error(
                path,
                Rule::RecordShape,
                format!("'{key}' should be a mapping, found {}", node.kind()),
            ),
        }
    }

    fn property_group(&mut self, map: &Mapping, path: &FieldPath) {
        for (key, child) in map {
            let Some(child_map) = child.as_mapping() else {
                continue;
            };
            let child_path = path.child(key.as_str());

            if key == "properties" {
                let with_metadata = GROUP_METADATA.iter().any(|k| map.contains_key(*k));
                let message = if with_metadata {
                    "group mixes label/description/percentage with a nested 'properties' wrapper; \
                     properties must be direct children of the group"
                } else {
                    "nested 'properties' wrapper; properties must be direct children of their group"
                };
                self.error(
                    child_path.clone(),
                    Rule::LegacyPropertiesWrapper,
                    message.to_string(),
                );
            }

            if !is_property_entry(child) {
                self.property_group(child_map, &child_path);
            }
        }
    }

    // -- relationships ------------------------------------------------------

    fn relationship_root(&mut self, key: &str, node: &Node) {
        let path = FieldPath::key(key);
        let Some(map) = node.as_mapping() else {
            self.error(
                path,
                Rule::RelationshipShape,
                format!("'{key}' should be a mapping of sections, found {}", node.kind()),
            );
            return;
        };

        for (name, child) in map {
            self.section_or_group(name, child, path.child(name.as_str()), false);
        }
    }

    fn section_or_group(&mut self, name: &str, node: &Node, path: FieldPath, in_group: bool) {
        match node {
            Node::Sequence(_) => self.error(
                path,
                Rule::RelationshipLegacyList,
                format!(
                    "section '{name}' is a bare list; expected {{presentation, items, _section}}"
                ),
            ),
            Node::Mapping(map) => {
                if is_section(self.domain, name, map, in_group, self.catalog) {
                    self.section(name, map, &path);
                } else {
                    for (child_name, child) in map {
                        self.section_or_group(
                            child_name,
                            child,
                            path.child(child_name.as_str()),
                            true,
                        );
                    }
                }
            }
            other => self.error(
                path,
                Rule::RelationshipShape,
                format!("section '{name}' should be a mapping, found {}", other.kind()),
            ),
        }
    }

    fn section(&mut self, name: &str, map: &Mapping, path: &FieldPath) {
        match (map.contains_key("properties"), map.contains_key("items")) {
            (true, false) => {
                self.error(
                    path.child("properties"),
                    Rule::LegacyPropertiesWrapper,
                    format!("section '{name}' nests its links under 'properties'; move them to 'items'"),
                );
                return;
            }
            (true, true) => self.error(
                path.child("properties"),
                Rule::LegacyPropertiesWrapper,
                format!("section '{name}' carries both 'items' and a legacy 'properties' wrapper"),
            ),
            _ => {}
        }

        self.presentation(name, map, path);
        self.items(name, map, path);
        self.section_meta(name, map, path);
    }

    fn presentation(&mut self, name: &str, map: &Mapping, path: &FieldPath) {
        let p = path.child("presentation");
        match map.get("presentation") {
            None => self.error(
                p,
                Rule::RelationshipShape,
                format!("section '{name}' has no 'presentation'"),
            ),
            Some(Node::String(s)) if PRESENTATIONS.contains(&s.as_str()) => {}
            Some(Node::String(s)) => self.error(
                p,
                Rule::RelationshipShape,
                format!(
                    "presentation '{s}' is not one of: {}",
                    PRESENTATIONS.join(", ")
                ),
            ),
            Some(other) => self.error(
                p,
                Rule::RelationshipShape,
                format!("presentation should be a string, found {}", other.kind()),
            ),
        }
    }

    fn items(&mut self, name: &str, map: &Mapping, path: &FieldPath) {
        let items_path = path.child("items");
        let items = match map.get("items") {
            Some(Node::Sequence(items)) => items,
            None => {
                self.error(
                    items_path,
                    Rule::RelationshipShape,
                    format!("section '{name}' has no 'items' sequence"),
                );
                return;
            }
            Some(other) => {
                self.error(
                    items_path,
                    Rule::RelationshipShape,
                    format!("items should be a sequence, found {}", other.kind()),
                );
                return;
            }
        };

        for (i, item) in items.iter().enumerate() {
            let item_path = items_path.index(i);
            let Some(item_map) = item.as_mapping() else {
                self.error(
                    item_path,
                    Rule::RelationshipItem,
                    format!("item should be a mapping with an 'id', found {}", item.kind()),
                );
                continue;
            };

            match item.str_field("id") {
                Ok(id) if !id.trim().is_empty() => {}
                Ok(_) => self.error(
                    item_path.child("id"),
                    Rule::RelationshipItem,
                    "item id is empty".to_string(),
                ),
                Err(e) => self.error(item_path.child("id"), Rule::RelationshipItem, format!("item {e}")),
            }

            if item_map.get("properties").is_some_and(|p| p.as_mapping().is_some())
                && GROUP_METADATA.iter().any(|k| item_map.contains_key(*k))
            {
                self.error(
                    item_path.child("properties"),
                    Rule::LegacyPropertiesWrapper,
                    "item mixes label/description/percentage with a nested 'properties' wrapper"
                        .to_string(),
                );
            }
        }
    }

    fn section_meta(&mut self, name: &str, map: &Mapping, path: &FieldPath) {
        let meta_path = path.child("_section");
        let meta = match map.get("_section") {
            Some(node @ Node::Mapping(_)) => node,
            None => {
                self.error(
                    meta_path,
                    Rule::RelationshipSectionMeta,
                    format!("section '{name}' has no '_section' metadata"),
                );
                return;
            }
            Some(other) => {
                self.error(
                    meta_path,
                    Rule::RelationshipSectionMeta,
                    format!("_section should be a mapping, found {}", other.kind()),
                );
                return;
            }
        };

        match meta.get("sectionTitle") {
            Some(Node::String(s)) if !s.trim().is_empty() => {}
            _ => self.error(
                meta_path.child("sectionTitle"),
                Rule::RelationshipSectionMeta,
                format!("section '{name}' needs a sectionTitle"),
            ),
        }

        match meta.get("sectionDescription") {
            Some(Node::String(s)) if !s.trim().is_empty() => {}
            _ => self.warning(
                meta_path.child("sectionDescription"),
                Rule::RelationshipSectionMeta,
                format!("section '{name}' has no sectionDescription"),
            ),
        }

        if let Some(order) = meta.get("order") {
            if order.as_i64().is_none() {
                self.error(
                    meta_path.child("order"),
                    Rule::RelationshipSectionMeta,
                    format!("order should be an integer, found {}", order.kind()),
                );
            }
        }

        for key in ["icon", "variant"] {
            if let Some(value) = meta.get(key) {
                if value.as_str().is_none() {
                    self.error(
                        meta_path.child(key),
                        Rule::RelationshipSectionMeta,
                        format!("{key} should be a string, found {}", value.kind()),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{builtin, yaml};
    use frontcheck_shared::Severity;

    fn check(domain: Domain, text: &str) -> Vec<Violation> {
        check_relationship_shape(domain, "record", &yaml(text), &builtin())
    }

    const CANONICAL: &str = r#"
relationships:
  interactions:
    contaminated_by:
      presentation: card
      items:
        - id: rust-contamination
          frequency: common
      _section:
        sectionTitle: Common Contaminants
        sectionDescription: Contaminants typically removed from this material
        icon: droplet
        order: 1
"#;

    #[test]
    fn canonical_grouped_section_passes() {
        assert!(check(Domain::Materials, CANONICAL).is_empty());
    }

    #[test]
    fn canonical_ungrouped_section_passes() {
        let text = r#"
relationships:
  suitable_materials:
    presentation: table
    items: []
    _section: { sectionTitle: Materials, sectionDescription: Where it applies }
"#;
        assert!(check(Domain::Settings, text).is_empty());
    }

    #[test]
    fn bare_list_section_is_one_error() {
        let violations = check(Domain::Settings, "relationships:\n  suitable_materials: []\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::RelationshipLegacyList);
        assert_eq!(violations[0].severity, Severity::Error);
        assert_eq!(
            violations[0].field_path.to_string(),
            "relationships.suitable_materials"
        );
    }

    #[test]
    fn nested_properties_section_wrapper() {
        let text = r#"
relationships:
  contaminated_by:
    properties:
      rust-contamination: { label: Rust }
"#;
        let violations = check(Domain::Materials, text);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::LegacyPropertiesWrapper);
    }

    #[test]
    fn missing_section_parts_are_reported() {
        let text = r#"
relationships:
  contaminated_by:
    items:
      - id: rust-contamination
      - name: no id here
      - just-a-string
    _section:
      sectionDescription: ""
      order: first
"#;
        let violations = check(Domain::Materials, text);
        let rules: Vec<(String, Rule, Severity)> = violations
            .iter()
            .map(|v| (v.field_path.to_string(), v.rule, v.severity))
            .collect();
        assert_eq!(
            rules,
            [
                (
                    "relationships.contaminated_by.presentation".to_string(),
                    Rule::RelationshipShape,
                    Severity::Error
                ),
                (
                    "relationships.contaminated_by.items[1].id".to_string(),
                    Rule::RelationshipItem,
                    Severity::Error
                ),
                (
                    "relationships.contaminated_by.items[2]".to_string(),
                    Rule::RelationshipItem,
                    Severity::Error
                ),
                (
                    "relationships.contaminated_by._section.sectionTitle".to_string(),
                    Rule::RelationshipSectionMeta,
                    Severity::Error
                ),
                (
                    "relationships.contaminated_by._section.sectionDescription".to_string(),
                    Rule::RelationshipSectionMeta,
                    Severity::Warning
                ),
                (
                    "relationships.contaminated_by._section.order".to_string(),
                    Rule::RelationshipSectionMeta,
                    Severity::Error
                ),
            ]
        );
    }

    #[test]
    fn invalid_presentation_and_scalar_items() {
        let text = r#"
relationships:
  contaminated_by:
    presentation: carousel
    items: rust-contamination
    _section: { sectionTitle: T, sectionDescription: D }
"#;
        let violations = check(Domain::Materials, text);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.contains("carousel"));
        assert!(violations[1].message.contains("sequence"));
    }

    #[test]
    fn missing_section_metadata_is_an_error() {
        let text = "relationships:\n  contaminated_by:\n    presentation: card\n    items: []\n";
        let violations = check(Domain::Materials, text);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::RelationshipSectionMeta);
        assert!(violations[0].is_error());
    }

    #[test]
    fn relationship_root_must_be_a_mapping() {
        let violations = check(Domain::Materials, "relationships: [a, b]\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::RelationshipShape);
    }

    #[test]
    fn property_group_wrapper_is_flagged() {
        let text = r#"
properties:
  laser_material_interaction:
    label: Laser Interaction
    percentage: 35
    properties:
      absorptivity: { value: 0.4, unit: "" }
  material_characteristics:
    density: { value: 2.7, unit: "g/cm³" }
"#;
        let violations = check(Domain::Materials, text);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::LegacyPropertiesWrapper);
        assert_eq!(
            violations[0].field_path.to_string(),
            "properties.laser_material_interaction.properties"
        );
        assert!(violations[0].message.contains("label/description/percentage"));
    }

    #[test]
    fn empty_section_reports_missing_parts() {
        let violations = check(Domain::Materials, "relationships:\n  related_materials: {}\n");
        assert_eq!(violations.len(), 3, "{violations:?}");
        assert!(violations.iter().all(|v| v.is_error()));
    }

    #[test]
    fn sections_found_at_both_levels() {
        let text = r#"
relationships:
  interactions:
    contaminated_by:
      presentation: card
      items: [{ id: rust-contamination }, { id: "" }, { id: paint-contamination }]
  related_materials:
    presentation: card
    items: [{ id: steel-laser-cleaning }]
  legacy: [a, b]
"#;
        let record = yaml(text);
        let sections = relationship_sections(Domain::Materials, &record, &builtin());
        let names: Vec<&str> = sections.iter().map(|s| s.name).collect();
        assert_eq!(names, ["contaminated_by", "related_materials"]);
        assert_eq!(
            sections[0].path.to_string(),
            "relationships.interactions.contaminated_by"
        );
        assert_eq!(
            sections[0].item_ids(),
            [(0, "rust-contamination"), (2, "paint-contamination")]
        );
        assert_eq!(sections[1].item_ids(), [(0, "steel-laser-cleaning")]);
    }

    #[test]
    fn property_root_must_be_a_mapping() {
        let violations = check(Domain::Materials, "properties: [density]\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::RecordShape);
    }
}
