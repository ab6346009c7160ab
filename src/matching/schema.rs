//! Column-role mapping and run options for the matching pipeline.

use serde::{Deserialize, Serialize};

/// Which header holds each role in the target sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetColumns {
    pub item_label: String,
    pub mark_label: String,
    pub resolved_code: String,
    pub unit_weight: String,
}

impl Default for TargetColumns {
    fn default() -> Self {
        Self {
            item_label: "货号".to_string(),
            mark_label: "标记".to_string(),
            resolved_code: "料号".to_string(),
            unit_weight: "单重".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexColumns {
    pub compound_key: String,
    pub code: String,
}

impl Default for IndexColumns {
    fn default() -> Self {
        Self {
            compound_key: "索引字段".to_string(),
            code: "料号".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub spec_text: String,
    pub code: String,
    pub mark_label: String,
    pub net_weight: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            spec_text: "规格型号".to_string(),
            code: "产品编号".to_string(),
            mark_label: "标记".to_string(),
            net_weight: "净重".to_string(),
        }
    }
}

/// Header names for every input table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaMapping {
    pub target_columns: TargetColumns,
    pub index_columns: IndexColumns,
    pub catalog_columns: CatalogColumns,
}

/// Whether item and mark labels are trimmed before they are concatenated into a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyTrim {
    #[default]
    Verbatim,
    Trim,
}

/// How repeated compound keys in the index table are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeys {
    /// The row loaded last wins.
    #[default]
    LastWins,
    /// Any repeated key aborts the run.
    Reject,
}

/// Which secondary attribute the fallback stage compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Mark when the catalog has a mark column, otherwise net weight.
    #[default]
    Auto,
    Mark,
    Weight,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(FallbackPolicy::Auto),
            "mark" => Ok(FallbackPolicy::Mark),
            "weight" => Ok(FallbackPolicy::Weight),
            other => Err(format!("unknown fallback policy '{}' (expected auto, mark or weight)", other)),
        }
    }
}

/// Everything the pipeline needs besides the three tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub schema: SchemaMapping,
    pub key_trim: KeyTrim,
    pub duplicate_keys: DuplicateKeys,
    pub fallback: FallbackPolicy,
}

impl MatchOptions {
    pub fn builder() -> MatchOptionsBuilder {
        MatchOptionsBuilder::new()
    }
}

/// Builder for [`MatchOptions`]
#[derive(Debug, Default)]
pub struct MatchOptionsBuilder {
    options: MatchOptions,
}

impl MatchOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: SchemaMapping) -> Self {
        self.options.schema = schema;
        self
    }

    pub fn key_trim(mut self, key_trim: KeyTrim) -> Self {
        self.options.key_trim = key_trim;
        self
    }

    pub fn duplicate_keys(mut self, duplicate_keys: DuplicateKeys) -> Self {
        self.options.duplicate_keys = duplicate_keys;
        self
    }

    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.options.fallback = fallback;
        self
    }

    pub fn build(self) -> MatchOptions {
        self.options
    }
}
