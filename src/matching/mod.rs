//! Code matching and enrichment pipeline.
//!
//! Records first go through an exact compound-key lookup against the index table.
//! Whatever remains is matched against the product catalog by dimension triple and a
//! secondary attribute, and the results are merged back without touching populated codes.

pub mod dimensions;
pub mod exact;
pub mod fallback;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod stats;

pub use dimensions::{Dimensions, extract_dimensions};
pub use exact::{IndexMap, resolve_by_key};
pub use fallback::{Catalog, SecondaryPredicate, resolve_by_attributes};
pub use merge::{MergedTable, merge};
pub use normalize::{NO_MARK, normalize_mark};
pub use pipeline::{Reconciliation, run};
pub use record::{CatalogEntry, IndexEntry, Resolution, TargetRecord};
pub use schema::{
    CatalogColumns, DuplicateKeys, FallbackPolicy, IndexColumns, KeyTrim, MatchOptions,
    SchemaMapping, TargetColumns,
};
pub use stats::{MatchReport, MatchStats};
