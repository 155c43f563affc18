//! End-to-end `validate` pipeline: catalog -> load + field rules per domain ->
//! cross-references -> report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{info, instrument};

use frontcheck_catalog::{Catalog, load_catalog};
use frontcheck_loader::{Corpus, DomainRecords, load_domain};
use frontcheck_rules::{RuleOptions, check_domain};
use frontcheck_shared::{Domain, FrontcheckError, Result, ValidateConfig, Violation};

use crate::graph::{IdIndex, check_cross_references};
use crate::report::{Report, aggregate};

/// Which checks a run reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Report only this domain's record and cross-reference findings.
    pub only_domain: Option<Domain>,
    pub rules: RuleOptions,
}

impl ValidateOptions {
    fn reports(&self, domain: Domain) -> bool {
        self.only_domain.is_none_or(|only| only == domain)
    }
}

impl From<&ValidateConfig> for ValidateOptions {
    fn from(config: &ValidateConfig) -> Self {
        Self {
            only_domain: config.only_domain,
            rules: RuleOptions {
                check_settings_data: config.check_settings_data,
            },
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a domain file has been loaded and checked.
    fn domain_loaded(&self, domain: Domain, records: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &Report);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn domain_loaded(&self, _domain: Domain, _records: usize) {}
    fn done(&self, _report: &Report) {}
}

/// The configured catalog files, or the built-in catalog when none are set.
pub fn load_catalog_for(config: &ValidateConfig) -> Result<Catalog> {
    if config.catalog_paths.is_empty() {
        Catalog::builtin()
    } else {
        load_catalog(&config.catalog_paths)
    }
}

/// Validate an already loaded corpus on the current thread.
pub fn validate_corpus(corpus: &Corpus, catalog: &Catalog, options: ValidateOptions) -> Report {
    let mut lists: Vec<Vec<Violation>> = corpus
        .iter()
        .filter(|records| options.reports(records.domain()))
        .map(|records| check_domain(records, catalog, options.rules))
        .collect();

    lists.push(graph_violations(corpus, catalog, options));
    aggregate(lists).with_sources(corpus)
}

/// Run the full `validate` pipeline.
///
/// 1. Load the catalog
/// 2. Load and check every domain file, one blocking task per domain
/// 3. Resolve cross-domain references against all four id sets
/// 4. Aggregate
#[instrument(skip_all, fields(only_domain = ?config.only_domain))]
pub async fn run_validation(
    config: &ValidateConfig,
    progress: &dyn ProgressReporter,
) -> Result<Report> {
    let start = Instant::now();
    let options = ValidateOptions::from(config);

    progress.phase("Loading catalog");
    let catalog = Arc::new(load_catalog_for(config)?);

    // --- Map: load + field rules per domain ---
    progress.phase("Checking domain files");
    let mut tasks = JoinSet::new();
    for domain in Domain::ALL {
        let path = domain_file(config, domain)?;
        let catalog = Arc::clone(&catalog);
        tasks.spawn_blocking(move || -> Result<(DomainRecords, Vec<Violation>)> {
            let records = load_domain(domain, &path)?;
            let violations = if options.reports(domain) {
                check_domain(&records, &catalog, options.rules)
            } else {
                Vec::new()
            };
            Ok((records, violations))
        });
    }

    let mut corpus = Corpus::new();
    let mut lists = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (records, violations) = joined.map_err(|e| FrontcheckError::Task(e.to_string()))??;
        progress.domain_loaded(records.domain(), records.len());
        corpus.insert(records);
        lists.push(violations);
    }

    // --- Join: graph check needs every id set ---
    progress.phase("Resolving cross-references");
    lists.push(graph_violations(&corpus, &catalog, options));

    let report = aggregate(lists).with_sources(&corpus);
    progress.done(&report);

    info!(
        records = corpus.record_count(),
        errors = report.error_count(),
        warnings = report.warning_count(),
        elapsed_ms = start.elapsed().as_millis(),
        "validation complete"
    );

    Ok(report)
}

fn graph_violations(corpus: &Corpus, catalog: &Catalog, options: ValidateOptions) -> Vec<Violation> {
    let index = IdIndex::build(corpus);
    check_cross_references(corpus, &index, catalog)
        .into_iter()
        .filter(|v| options.reports(v.domain))
        .collect()
}

fn domain_file(config: &ValidateConfig, domain: Domain) -> Result<PathBuf> {
    config
        .domain_files
        .get(&domain)
        .cloned()
        .ok_or_else(|| FrontcheckError::config(format!("no data file configured for {domain}")))
}
