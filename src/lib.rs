//! QA/QC summaries for RCW 87.84 rehabilitation assessment exports.
//!
//! Load a CSV with [`dataset::load_csv`], derive everything with
//! [`summary::Assessment::build`], then print or export it through
//! [`report`].

pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod html;
pub mod report;
pub mod style;
pub mod summary;

pub use config::{ALL_LABEL, Category, CategoryMap, ReportConfig};
pub use dataset::{Dataset, LoadReport, Record, load_csv, read_csv};
pub use error::{QcError, Result};
pub use style::{StyleTag, style_classification};
pub use summary::{
    AnnotatedDataset, Assessment, BadBreakdown, BadStats, CategorySummary, SchemaReport,
    annotate_failure_counts, bad_breakdown, filter_by_category, normalize_identifier,
    select_multi_failure, summarize_by_category, validate_schema,
};
