//! Relationship graph checks across domains.
//!
//! Every item id in a declared relationship section must name a record in the
//! section's target domain. When the declaration has an inverse section, the
//! target record is expected to link back; a missing back-link is a warning on
//! the side that has the link, so each one-directional pair is reported once.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use frontcheck_catalog::{Catalog, RelationshipDecl};
use frontcheck_loader::Corpus;
use frontcheck_rules::{SectionRef, relationship_sections};
use frontcheck_shared::{Domain, Rule, Violation};

/// Record ids per domain, built once per run.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    ids: HashMap<Domain, HashSet<String>>,
}

impl IdIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let ids = corpus
            .iter()
            .map(|records| {
                let set = records.ids().map(str::to_string).collect();
                (records.domain(), set)
            })
            .collect();
        Self { ids }
    }

    pub fn contains(&self, domain: Domain, id: &str) -> bool {
        self.ids.get(&domain).is_some_and(|set| set.contains(id))
    }

    /// Number of ids known for `domain`.
    pub fn len(&self, domain: Domain) -> usize {
        self.ids.get(&domain).map_or(0, HashSet::len)
    }
}

/// Every relationship link in the corpus, as
/// `(source domain, source id, section name, target id)`.
///
/// Built once per run so back-link checks are a single set lookup.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex<'a> {
    links: HashSet<(Domain, &'a str, &'a str, &'a str)>,
}

impl<'a> LinkIndex<'a> {
    pub fn build(corpus: &'a Corpus, catalog: &Catalog) -> Self {
        let mut links = HashSet::new();
        for records in corpus.iter() {
            let domain = records.domain();
            for (id, record) in records.iter() {
                for section in relationship_sections(domain, record, catalog) {
                    for (_, target_id) in section.item_ids() {
                        links.insert((domain, id, section.name, target_id));
                    }
                }
            }
        }
        Self { links }
    }

    /// Whether `source_id` in `domain` lists `target_id` in its `section`.
    pub fn links(&self, domain: Domain, source_id: &str, section: &str, target_id: &str) -> bool {
        self.links
            .contains(&(domain, source_id, section, target_id))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Resolve every relationship item in the corpus.
#[instrument(skip_all, fields(records = corpus.record_count()))]
pub fn check_cross_references(
    corpus: &Corpus,
    index: &IdIndex,
    catalog: &Catalog,
) -> Vec<Violation> {
    let links = LinkIndex::build(corpus, catalog);
    debug!(links = links.len(), "link index built");

    let mut out = Vec::new();
    for records in corpus.iter() {
        let domain = records.domain();
        for (id, record) in records.iter() {
            for section in relationship_sections(domain, record, catalog) {
                match catalog.relationship(domain, section.name) {
                    Some(decl) => check_section(index, &links, id, &section, decl, &mut out),
                    None => out.push(Violation::warning(
                        domain,
                        id,
                        section.path.clone(),
                        Rule::RelationshipUndeclared,
                        format!(
                            "section '{}' is not declared for {domain}; its items are not resolved",
                            section.name
                        ),
                    )),
                }
            }
        }
    }

    debug!(violations = out.len(), "cross-reference check complete");
    out
}

fn check_section(
    index: &IdIndex,
    links: &LinkIndex<'_>,
    source_id: &str,
    section: &SectionRef<'_>,
    decl: &RelationshipDecl,
    out: &mut Vec<Violation>,
) {
    let items_path = section.path.child("items");

    for (i, target_id) in section.item_ids() {
        let path = items_path.index(i).child("id");

        if !index.contains(decl.target, target_id) {
            out.push(
                Violation::error(
                    decl.domain,
                    source_id,
                    path,
                    Rule::CrossReference,
                    format!(
                        "'{target_id}' in '{}' does not exist in {}",
                        section.name, decl.target
                    ),
                )
                .with_reference(decl.target, target_id),
            );
            continue;
        }

        let Some(inverse) = decl.inverse.as_deref() else {
            continue;
        };
        if !links.links(decl.target, target_id, inverse, source_id) {
            out.push(
                Violation::warning(
                    decl.domain,
                    source_id,
                    path,
                    Rule::AsymmetricRelationship,
                    format!(
                        "{} '{target_id}' does not list '{source_id}' in '{inverse}'",
                        decl.target
                    ),
                )
                .with_reference(decl.target, target_id),
            );
        }
    }
}
