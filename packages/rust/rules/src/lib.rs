//! Per-record validation rules.
//!
//! Every rule is a pure function from a record (plus the catalog) to a list
//! of violations. Rules never fail: anything unexpected in the data becomes
//! a violation, so one malformed record cannot stop the run.

pub mod fields;
pub mod properties;
pub mod shape;

use tracing::{debug, instrument};

use frontcheck_catalog::Catalog;
use frontcheck_loader::DomainRecords;
use frontcheck_shared::{Domain, Node, Violation};

pub use fields::{
    check_category_enum, check_id_field, check_naming_convention, check_record_shape,
    check_required_fields,
};
pub use properties::{
    PropertyEntry, check_property_values, check_settings_data, check_unit_consistency,
    property_entries,
};
pub use shape::{SectionRef, check_relationship_shape, relationship_sections};

/// Optional rule groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleOptions {
    /// Run [`check_settings_data`] on settings records.
    pub check_settings_data: bool,
}

/// Run every field rule on one record.
pub fn check_record(
    domain: Domain,
    id: &str,
    record: &Node,
    catalog: &Catalog,
    options: RuleOptions,
) -> Vec<Violation> {
    let mut out = check_naming_convention(domain, id, catalog);

    if let Some(violation) = check_record_shape(domain, id, record) {
        out.push(violation);
        return out;
    }

    let schema = catalog.domain(domain);
    out.extend(check_required_fields(
        domain,
        id,
        record,
        &schema.required_fields,
    ));
    out.extend(check_category_enum(domain, id, record, catalog));
    out.extend(check_id_field(domain, id, record));
    out.extend(check_unit_consistency(domain, id, record, catalog));
    out.extend(check_property_values(domain, id, record, catalog));
    out.extend(check_relationship_shape(domain, id, record, catalog));

    if options.check_settings_data && domain == Domain::Settings {
        out.extend(check_settings_data(id, record, catalog));
    }

    out
}

/// Run every field rule on every record of a domain.
#[instrument(skip_all, fields(domain = %records.domain(), records = records.len()))]
pub fn check_domain(
    records: &DomainRecords,
    catalog: &Catalog,
    options: RuleOptions,
) -> Vec<Violation> {
    let domain = records.domain();
    let violations: Vec<Violation> = records
        .iter()
        .flat_map(|(id, record)| check_record(domain, id, record, catalog, options))
        .collect();

    debug!(violations = violations.len(), "field rules complete");
    violations
}
