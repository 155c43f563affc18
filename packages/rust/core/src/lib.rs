//! Validation orchestration for frontcheck.
//!
//! This crate ties together the catalog, loader, and rule crates into one
//! end-to-end run: load every domain file, run the field rules per domain,
//! resolve cross-domain references, and aggregate a [`report::Report`].

pub mod graph;
pub mod pipeline;
pub mod report;

pub use graph::{IdIndex, LinkIndex, check_cross_references};
pub use pipeline::{
    ProgressReporter, SilentProgress, ValidateOptions, load_catalog_for, run_validation,
    validate_corpus,
};
pub use report::{Report, SourceSummary, aggregate};
