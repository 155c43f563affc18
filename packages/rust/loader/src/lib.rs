//! Record loader: parses one domain file into `id -> record`.
//!
//! Loading is all-or-nothing per file. A file that cannot be read, does not
//! parse, or does not have the expected `<items_key>: {id: record}` layout is
//! a load error; nothing from it is returned. Records that parse but are not
//! mappings are kept so the rules can report them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use frontcheck_shared::{Domain, FrontcheckError, Node, Result, SourceLocation};

/// All records of one domain, in id order.
#[derive(Debug, Clone)]
pub struct DomainRecords {
    domain: Domain,
    path: PathBuf,
    sha256: String,
    records: BTreeMap<String, Node>,
}

impl DomainRecords {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// File the records were read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hex SHA-256 of the file bytes.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// `(id, record)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.records.iter().map(|(id, node)| (id.as_str(), node))
    }
}

/// The loaded domains of one run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    domains: BTreeMap<Domain, DomainRecords>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, records: DomainRecords) {
        self.domains.insert(records.domain(), records);
    }

    pub fn get(&self, domain: Domain) -> Option<&DomainRecords> {
        self.domains.get(&domain)
    }

    /// Loaded domains in report order.
    pub fn iter(&self) -> impl Iterator<Item = &DomainRecords> {
        self.domains.values()
    }

    pub fn record_count(&self) -> usize {
        self.domains.values().map(DomainRecords::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and parse the file for `domain`.
#[instrument(skip_all, fields(domain = %domain, path = %path.display()))]
pub fn load_domain(domain: Domain, path: &Path) -> Result<DomainRecords> {
    if !path.is_file() {
        return Err(FrontcheckError::load(path, "file not found"));
    }

    let bytes = std::fs::read(path).map_err(|e| FrontcheckError::io(path, e))?;
    let records = parse_domain(domain, path, &bytes)?;

    debug!(records = records.len(), "domain file loaded");
    Ok(records)
}

/// Parse domain file content. `path` is only used for diagnostics.
pub fn parse_domain(domain: Domain, path: &Path, bytes: &[u8]) -> Result<DomainRecords> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        FrontcheckError::load_at(
            path,
            format!("file is not valid UTF-8: {e}"),
            Some(SourceLocation {
                line: line_of(bytes, e.valid_up_to()),
                column: column_of(bytes, e.valid_up_to()),
                offset: e.valid_up_to(),
            }),
        )
    })?;

    let root: Node = serde_yaml::from_str(text).map_err(|e| {
        let location = e.location().map(|loc| SourceLocation {
            line: loc.line(),
            column: loc.column(),
            offset: loc.index(),
        });
        FrontcheckError::load_at(path, e.to_string(), location)
    })?;

    let items_key = domain.items_key();
    let top = root.as_mapping().ok_or_else(|| {
        FrontcheckError::load(
            path,
            format!("top level must be a mapping, found {}", root.kind()),
        )
    })?;

    let items = top.get(items_key).ok_or_else(|| {
        FrontcheckError::load(path, format!("missing items key '{items_key}'"))
    })?;

    let records = items.as_mapping().ok_or_else(|| {
        FrontcheckError::load(
            path,
            format!(
                "'{items_key}' must map record ids to records, found {}",
                items.kind()
            ),
        )
    })?;

    Ok(DomainRecords {
        domain,
        path: path.to_path_buf(),
        sha256: sha256_hex(bytes),
        records: records.clone(),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn line_of(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset].iter().filter(|b| **b == b'\n').count() + 1
}

fn column_of(bytes: &[u8], offset: usize) -> usize {
    let line_start = bytes[..offset]
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i + 1);
    offset - line_start + 1
}
