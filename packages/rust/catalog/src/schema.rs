//! On-disk catalog format.
//!
//! Every field is optional so several files can be layered: a later file
//! overrides scalar settings, adds categories and units, and replaces
//! relationship declarations with the same `(domain, section)`.

use std::collections::BTreeMap;

use serde::Deserialize;

use frontcheck_shared::Domain;

/// One catalog file as written by hand.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CatalogFile {
    #[serde(default)]
    pub domains: BTreeMap<Domain, DomainFile>,

    /// Property name -> unit. An empty string marks a dimensionless quantity.
    #[serde(default)]
    pub units: BTreeMap<String, String>,

    /// Loose spelling -> canonical unit.
    #[serde(default)]
    pub unit_aliases: BTreeMap<String, String>,

    #[serde(default)]
    pub relationships: Vec<RelationshipFile>,
}

/// `domains.<name>` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DomainFile {
    pub required_fields: Option<Vec<String>>,
    pub id_suffix: Option<String>,
    pub property_roots: Option<Vec<String>>,
    pub relationship_root: Option<String>,
    pub required_parameters: Option<Vec<String>>,
    /// Category -> allowed subcategories.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

/// One entry of the `relationships` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RelationshipFile {
    pub domain: Domain,
    pub section: String,
    pub target: Domain,
    #[serde(default)]
    pub inverse: Option<String>,
}

impl CatalogFile {
    /// Layer `other` on top of `self`.
    pub(crate) fn merge(&mut self, other: CatalogFile) {
        for (domain, incoming) in other.domains {
            let slot = self.domains.entry(domain).or_default();
            if incoming.required_fields.is_some() {
                slot.required_fields = incoming.required_fields;
            }
            if incoming.id_suffix.is_some() {
                slot.id_suffix = incoming.id_suffix;
            }
            if incoming.property_roots.is_some() {
                slot.property_roots = incoming.property_roots;
            }
            if incoming.relationship_root.is_some() {
                slot.relationship_root = incoming.relationship_root;
            }
            if incoming.required_parameters.is_some() {
                slot.required_parameters = incoming.required_parameters;
            }
            slot.categories.extend(incoming.categories);
        }

        self.units.extend(other.units);
        self.unit_aliases.extend(other.unit_aliases);

        for decl in other.relationships {
            self.relationships
                .retain(|r| !(r.domain == decl.domain && r.section == decl.section));
            self.relationships.push(decl);
        }
    }
}
