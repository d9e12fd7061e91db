use crate::core::{ProductRecord, RawRecord, SalesSummary, Transformer, VolumeCategory};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default sales-volume bands, highest first. A quantity falls into the first
/// band whose lower bound it reaches; the last band catches everything else.
pub const DEFAULT_VOLUME_BANDS: &[VolumeBand] = &[
    VolumeBand {
        min_quantity: Some(50.0),
        category: VolumeCategory::High,
    },
    VolumeBand {
        min_quantity: Some(10.0),
        category: VolumeCategory::Medium,
    },
    VolumeBand {
        min_quantity: None,
        category: VolumeCategory::Low,
    },
];

/// Source field names read by the field-mapping transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFieldSources {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
}

impl Default for ProductFieldSources {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            name: "name".to_string(),
            category: "category".to_string(),
            price: "price".to_string(),
        }
    }
}

/// Field-mapping mode: a pure projection of four fields with renamed keys.
#[derive(Debug, Clone, Default)]
pub struct ProductProjection {
    sources: ProductFieldSources,
}

impl ProductProjection {
    pub fn new(sources: ProductFieldSources) -> Self {
        Self { sources }
    }
}

impl Transformer for ProductProjection {
    type Output = ProductRecord;

    fn transform_record(&self, _index: usize, record: &RawRecord) -> Result<ProductRecord> {
        Ok(ProductRecord {
            product_id: record.get(&self.sources.id).cloned(),
            product_name: record.get(&self.sources.name).cloned(),
            category: record.get(&self.sources.category).cloned(),
            price: record.get(&self.sources.price).cloned(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBand {
    /// Inclusive lower bound. `None` marks the catch-all band.
    pub min_quantity: Option<f64>,
    pub category: VolumeCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeBands(Vec<VolumeBand>);

impl VolumeBands {
    pub fn new(bands: Vec<VolumeBand>) -> Result<Self> {
        let bands = Self(bands);
        bands.validate()?;
        Ok(bands)
    }

    pub fn classify(&self, quantity: f64) -> VolumeCategory {
        self.0
            .iter()
            .find(|band| band.min_quantity.map_or(true, |min| quantity >= min))
            .map(|band| band.category)
            .unwrap_or(VolumeCategory::Low)
    }

    pub fn bands(&self) -> &[VolumeBand] {
        &self.0
    }
}

impl Default for VolumeBands {
    fn default() -> Self {
        Self(DEFAULT_VOLUME_BANDS.to_vec())
    }
}

impl Validate for VolumeBands {
    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| EtlError::InvalidConfigValueError {
            field: "transform.volume_bands".to_string(),
            value: format!("{:?}", self.0),
            reason: reason.to_string(),
        };

        let Some((last, bounded)) = self.0.split_last() else {
            return Err(invalid("at least one band is required"));
        };
        if last.min_quantity.is_some() {
            return Err(invalid("the last band must have no lower bound"));
        }

        let mut previous: Option<f64> = None;
        for band in bounded {
            let Some(min) = band.min_quantity else {
                return Err(invalid("only the last band may omit its lower bound"));
            };
            if !min.is_finite() {
                return Err(invalid("lower bounds must be finite"));
            }
            if previous.is_some_and(|prev| min >= prev) {
                return Err(invalid("lower bounds must be strictly descending"));
            }
            previous = Some(min);
        }
        Ok(())
    }
}

/// Source field names read by the aggregation transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesFieldSources {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: String,
    pub unit_price: String,
}

impl Default for SalesFieldSources {
    fn default() -> Self {
        Self {
            sale_id: "sale_id".to_string(),
            product_id: "product_id".to_string(),
            quantity: "quantity".to_string(),
            unit_price: "unit_price".to_string(),
        }
    }
}

/// Aggregation mode: revenue and volume category for joined sales rows.
#[derive(Debug, Clone, Default)]
pub struct RevenueAggregation {
    sources: SalesFieldSources,
    bands: VolumeBands,
}

impl RevenueAggregation {
    pub fn new(sources: SalesFieldSources, bands: VolumeBands) -> Self {
        Self { sources, bands }
    }

    fn numeric_field(&self, index: usize, record: &RawRecord, field: &str) -> Result<f64> {
        let value = record.get(field).ok_or_else(|| EtlError::MissingFieldError {
            index,
            field: field.to_string(),
        })?;

        match value {
            Value::Number(n) => n.as_f64().ok_or_else(|| EtlError::InvalidFieldError {
                index,
                field: field.to_string(),
                value: n.to_string(),
            }),
            other => Err(EtlError::InvalidFieldError {
                index,
                field: field.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl Transformer for RevenueAggregation {
    type Output = SalesSummary;

    fn transform_record(&self, index: usize, record: &RawRecord) -> Result<SalesSummary> {
        let quantity = self.numeric_field(index, record, &self.sources.quantity)?;
        let unit_price = self.numeric_field(index, record, &self.sources.unit_price)?;

        let total_revenue = quantity * unit_price;
        if !total_revenue.is_finite() {
            return Err(EtlError::InvalidFieldError {
                index,
                field: self.sources.unit_price.clone(),
                value: format!("{unit_price} (revenue overflows for quantity {quantity})"),
            });
        }

        Ok(SalesSummary {
            sale_id: record.get(&self.sources.sale_id).cloned(),
            product_id: record.get(&self.sources.product_id).cloned(),
            total_revenue,
            sales_volume_category: self.bands.classify(quantity),
        })
    }
}
