//! Schema catalog: allowed categories, subcategories, units and relationship
//! declarations for every domain.
//!
//! The catalog is loaded once per run and passed by reference into every
//! rule. It is never mutated after [`load_catalog`] or [`Catalog::builtin`]
//! returns.

mod schema;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use frontcheck_shared::{Domain, FrontcheckError, Result};

use crate::schema::{CatalogFile, DomainFile};

/// The catalog shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

/// Unit spelling that is never allowed in the vocabulary or in records.
pub const DIMENSIONLESS_LITERAL: &str = "dimensionless";

/// Allowed values for a relationship section's `presentation`.
pub const PRESENTATIONS: [&str; 3] = ["card", "table", "descriptive"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-domain rules.
#[derive(Debug, Clone, Serialize)]
pub struct DomainSchema {
    /// Top-level keys every record must carry.
    pub required_fields: Vec<String>,
    /// Suffix every id should end with (e.g. `-laser-cleaning`).
    pub id_suffix: Option<String>,
    /// Top-level keys holding property entries.
    pub property_roots: Vec<String>,
    /// Top-level key holding relationship sections.
    pub relationship_root: String,
    /// Machine parameters every settings record must define.
    pub required_parameters: Vec<String>,
    /// Category -> allowed subcategories. Empty means no category enum.
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl Default for DomainSchema {
    fn default() -> Self {
        Self {
            required_fields: vec!["name".to_string()],
            id_suffix: None,
            property_roots: vec!["properties".to_string()],
            relationship_root: "relationships".to_string(),
            required_parameters: Vec::new(),
            categories: BTreeMap::new(),
        }
    }
}

/// A section key that links records of one domain to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipDecl {
    /// Domain whose records carry the section.
    pub domain: Domain,
    /// Section key, e.g. `found_on_materials`.
    pub section: String,
    /// Domain the item ids point into.
    pub target: Domain,
    /// Section on the target record expected to link back.
    pub inverse: Option<String>,
}

/// Immutable rule set for one validation run.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    domains: BTreeMap<Domain, DomainSchema>,
    units: BTreeMap<String, String>,
    unit_aliases: BTreeMap<String, String>,
    relationships: Vec<RelationshipDecl>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and merge catalog files in order.
///
/// Files ending in `.json` are read as JSON, `.yaml`/`.yml` as YAML. A
/// missing or malformed file fails the whole load.
#[instrument(skip_all, fields(files = paths.len()))]
pub fn load_catalog(paths: &[PathBuf]) -> Result<Catalog> {
    if paths.is_empty() {
        return Err(FrontcheckError::config("no catalog files given"));
    }

    let mut merged = CatalogFile::default();
    for path in paths {
        merged.merge(read_catalog_file(path)?);
        debug!(path = %path.display(), "catalog file loaded");
    }

    Catalog::from_file(merged)
}

fn read_catalog_file(path: &Path) -> Result<CatalogFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FrontcheckError::config(format!("cannot read catalog {}: {e}", path.display()))
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|e| {
            FrontcheckError::config(format!("malformed catalog {}: {e}", path.display()))
        }),
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            FrontcheckError::config(format!("malformed catalog {}: {e}", path.display()))
        }),
        _ => Err(FrontcheckError::config(format!(
            "unsupported catalog format for {}: expected .yaml, .yml, or .json",
            path.display()
        ))),
    }
}

impl Catalog {
    /// The default laser-cleaning catalog embedded in the binary.
    pub fn builtin() -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(BUILTIN_CATALOG)
            .map_err(|e| FrontcheckError::config(format!("built-in catalog: {e}")))?;
        Self::from_file(file)
    }

    /// Parse a single YAML catalog document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)
            .map_err(|e| FrontcheckError::config(format!("malformed catalog: {e}")))?;
        Self::from_file(file)
    }

    fn from_file(file: CatalogFile) -> Result<Self> {
        let mut domains = BTreeMap::new();
        for domain in Domain::ALL {
            let raw = file.domains.get(&domain).cloned().unwrap_or_default();
            domains.insert(domain, resolve_domain(domain, raw)?);
        }

        for (name, unit) in &file.units {
            if unit.trim().eq_ignore_ascii_case(DIMENSIONLESS_LITERAL) {
                return Err(FrontcheckError::config(format!(
                    "unit for '{name}' is the literal '{DIMENSIONLESS_LITERAL}'; use \"\" for dimensionless properties"
                )));
            }
        }

        let mut relationships = Vec::with_capacity(file.relationships.len());
        for decl in file.relationships {
            if decl.section.trim().is_empty() {
                return Err(FrontcheckError::config(format!(
                    "relationship declaration on {} has an empty section name",
                    decl.domain
                )));
            }
            relationships.push(RelationshipDecl {
                domain: decl.domain,
                section: decl.section,
                target: decl.target,
                inverse: decl.inverse.filter(|s| !s.trim().is_empty()),
            });
        }
        relationships.sort_by(|a, b| (a.domain, &a.section).cmp(&(b.domain, &b.section)));

        Ok(Self {
            domains,
            units: file.units,
            unit_aliases: file.unit_aliases,
            relationships,
        })
    }
}

fn resolve_domain(domain: Domain, raw: DomainFile) -> Result<DomainSchema> {
    let defaults = DomainSchema::default();
    let mut categories = BTreeMap::new();

    for (category, subs) in raw.categories {
        if category.trim().is_empty() {
            return Err(FrontcheckError::config(format!(
                "{domain}: empty category name"
            )));
        }
        if let Some(bad) = subs.iter().find(|s| s.trim().is_empty()) {
            return Err(FrontcheckError::config(format!(
                "{domain}: category '{category}' lists an empty subcategory {bad:?}"
            )));
        }
        categories.insert(category, subs.into_iter().collect());
    }

    Ok(DomainSchema {
        required_fields: raw.required_fields.unwrap_or(defaults.required_fields),
        id_suffix: raw.id_suffix.filter(|s| !s.is_empty()),
        property_roots: raw.property_roots.unwrap_or(defaults.property_roots),
        relationship_root: raw
            .relationship_root
            .unwrap_or(defaults.relationship_root),
        required_parameters: raw.required_parameters.unwrap_or_default(),
        categories,
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Catalog {
    /// Rules for `domain`. Every domain has an entry, possibly the defaults.
    pub fn domain(&self, domain: Domain) -> &DomainSchema {
        // from_file inserts every Domain::ALL entry
        &self.domains[&domain]
    }

    /// Whether `domain` declares a category enum at all.
    pub fn has_categories(&self, domain: Domain) -> bool {
        !self.domain(domain).categories.is_empty()
    }

    /// Every category declared for `domain`, sorted.
    pub fn categories(&self, domain: Domain) -> impl Iterator<Item = &str> {
        self.domain(domain).categories.keys().map(String::as_str)
    }

    pub fn is_valid_category(&self, domain: Domain, category: &str) -> bool {
        self.domain(domain).categories.contains_key(category)
    }

    /// Allowed subcategories of `category`; empty for an unknown category.
    pub fn valid_subcategories(&self, domain: Domain, category: &str) -> BTreeSet<&str> {
        self.domain(domain)
            .categories
            .get(category)
            .map(|subs| subs.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Expected unit for a property.
    ///
    /// `None` means the unit must be the empty string, or that the property
    /// is not in the vocabulary; [`Catalog::knows_property`] tells the two apart.
    pub fn expected_unit(&self, property: &str) -> Option<&str> {
        self.units
            .get(property)
            .map(String::as_str)
            .filter(|u| !u.is_empty())
    }

    pub fn knows_property(&self, property: &str) -> bool {
        self.units.contains_key(property)
    }

    /// Canonical spelling for a loose unit such as `g/cm3`.
    pub fn canonical_unit_for_alias(&self, unit: &str) -> Option<&str> {
        self.unit_aliases.get(unit).map(String::as_str)
    }

    /// Declaration for a section key on `domain`'s records.
    pub fn relationship(&self, domain: Domain, section: &str) -> Option<&RelationshipDecl> {
        self.relationships
            .iter()
            .find(|r| r.domain == domain && r.section == section)
    }

    /// All declarations, sorted by domain then section.
    pub fn relationships(&self) -> &[RelationshipDecl] {
        &self.relationships
    }
}
