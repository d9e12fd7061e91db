use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::utils::error::EtlError;

/// A record as delivered by a source. Field order follows the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    pub data: Map<String, Value>,
}

impl RawRecord {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Looks up a field, treating an explicit `null` the same as a missing key.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field).filter(|v| !v.is_null())
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

/// A fixed-shape output record that can be written as a table row.
///
/// `COLUMNS` lists the serialized field names in declaration order, so an
/// empty load can still write the header row.
pub trait TableRow {
    const COLUMNS: &'static [&'static str];
}

/// Output of the field-mapping transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: Option<Value>,
    pub product_name: Option<Value>,
    pub category: Option<Value>,
    pub price: Option<Value>,
}

impl TableRow for ProductRecord {
    const COLUMNS: &'static [&'static str] = &["product_id", "product_name", "category", "price"];
}

/// Output of the revenue aggregation transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub sale_id: Option<Value>,
    pub product_id: Option<Value>,
    pub total_revenue: f64,
    pub sales_volume_category: VolumeCategory,
}

impl TableRow for SalesSummary {
    const COLUMNS: &'static [&'static str] = &[
        "sale_id",
        "product_id",
        "total_revenue",
        "sales_volume_category",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeCategory {
    Low,
    Medium,
    High,
}

impl fmt::Display for VolumeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolumeCategory::Low => "Low",
            VolumeCategory::Medium => "Medium",
            VolumeCategory::High => "High",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
        };
        f.write_str(name)
    }
}

/// Records that survived the transform stage plus the ones the error policy dropped.
#[derive(Debug)]
pub struct TransformOutcome<T> {
    pub records: Vec<T>,
    pub rejected: Vec<EtlError>,
}

impl<T> TransformOutcome<T> {
    pub fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pipeline: String,
    pub extracted: usize,
    pub transformed: usize,
    pub skipped: usize,
    pub output: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
