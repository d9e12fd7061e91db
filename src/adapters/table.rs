//! CSV-backed tables standing in for the relational store: a two-table join
//! source and a destination table sink.

use crate::core::{RawRecord, Sink, Source, Storage, TableRow};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::io::ErrorKind;

/// Parses one CSV table into records. Empty cells become `null`, integers and
/// floats become JSON numbers, everything else stays a string.
pub fn parse_table(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let data: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), parse_cell(cell)))
            .collect();
        records.push(RawRecord::new(data));
    }
    Ok(records)
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(cell.to_string())
}

/// Key used to match rows across tables. Strings are used as-is and integral
/// floats collapse to their integer form, so `10` and `10.0` match.
fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some((f as i64).to_string())
            }
            _ => Some(n.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Inner join of a sales table with a products table on a shared key.
///
/// Output order follows the sales table. A sales row yields one record per
/// matching product row, in products-table order. Sales columns win when both
/// tables carry the same column name; sales rows without a matching product are
/// dropped. Numeric keys match by value, so `10` in one table joins `10.0` in
/// the other.
pub struct TableSource<S: Storage> {
    storage: S,
    sales_table: String,
    products_table: String,
    join_key: String,
}

impl<S: Storage> TableSource<S> {
    pub fn new(
        storage: S,
        sales_table: impl Into<String>,
        products_table: impl Into<String>,
        join_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            sales_table: sales_table.into(),
            products_table: products_table.into(),
            join_key: join_key.into(),
        }
    }

    async fn read_table(&self, table: &str) -> Result<Vec<RawRecord>> {
        tracing::debug!("Reading table {}", self.storage.location(table));
        let bytes = self.storage.read_file(table).await?;
        parse_table(&bytes)
    }
}

#[async_trait]
impl<S: Storage> Source for TableSource<S> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        let sales = self.read_table(&self.sales_table).await?;
        let products = self.read_table(&self.products_table).await?;

        let mut by_key: HashMap<String, Vec<Map<String, Value>>> = HashMap::new();
        for product in products {
            if let Some(key) = product.data.get(&self.join_key).and_then(join_key) {
                by_key.entry(key).or_default().push(product.data);
            }
        }

        let total = sales.len();
        let mut unmatched = 0;
        let mut joined = Vec::with_capacity(total);
        for sale in sales {
            let Some(matches) = sale
                .data
                .get(&self.join_key)
                .and_then(join_key)
                .and_then(|key| by_key.get(&key))
            else {
                unmatched += 1;
                continue;
            };

            for product in matches {
                let mut data = sale.data.clone();
                for (column, value) in product {
                    if !data.contains_key(column) {
                        data.insert(column.clone(), value.clone());
                    }
                }
                joined.push(RawRecord::new(data));
            }
        }

        if unmatched > 0 {
            tracing::debug!(
                "Dropped {} of {} sales rows without a matching {}",
                unmatched,
                total,
                self.join_key
            );
        }
        Ok(joined)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Overwrite the table with the new rows.
    #[default]
    Replace,
    /// Keep existing rows and add the new ones after them.
    Append,
}

/// Destination table written as CSV with a header row.
pub struct TableSink<S: Storage> {
    storage: S,
    table: String,
    mode: WriteMode,
}

impl<S: Storage> TableSink<S> {
    pub fn new(storage: S, table: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            storage,
            table: table.into(),
            mode,
        }
    }

    async fn existing_rows(&self) -> Result<Vec<u8>> {
        match self.storage.read_file(&self.table).await {
            Ok(bytes) => Ok(bytes),
            Err(EtlError::IoError(e)) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// csv writes the header on the first serialized row, so an empty batch
/// writes it from `T::COLUMNS` instead.
fn encode_rows<T: Serialize + TableRow>(records: &[T], with_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(Vec::new());
    if with_header && records.is_empty() {
        writer.write_record(T::COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

#[async_trait]
impl<S, T> Sink<T> for TableSink<S>
where
    S: Storage,
    T: Serialize + TableRow + Send + Sync,
{
    async fn load(&self, records: &[T]) -> Result<String> {
        let mut data = match self.mode {
            WriteMode::Replace => Vec::new(),
            WriteMode::Append => self.existing_rows().await?,
        };

        if !data.is_empty() && !data.ends_with(b"\n") {
            data.push(b'\n');
        }
        let rows = encode_rows(records, data.is_empty())?;
        data.extend_from_slice(&rows);

        tracing::debug!(
            "Writing {} rows to table {} ({:?})",
            records.len(),
            self.table,
            self.mode
        );
        self.storage.write_file(&self.table, &data).await?;

        Ok(self.storage.location(&self.table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::core::{SalesSummary, VolumeCategory};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_table_cell_types() {
        let records = parse_table(b"id,qty,price,note\n1,3,9.5,hello\n2,,abc,\n").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data["id"], json!(1));
        assert_eq!(records[0].data["qty"], json!(3));
        assert_eq!(records[0].data["price"], json!(9.5));
        assert_eq!(records[0].data["note"], json!("hello"));
        assert_eq!(records[1].data["qty"], Value::Null);
        assert_eq!(records[1].data["price"], json!("abc"));
        assert!(records[1].get("note").is_none());
    }

    #[tokio::test]
    async fn test_join_keeps_sales_order_and_drops_unmatched() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("sales.csv"),
            "sale_id,product_id,quantity\n1,20,3\n2,99,1\n3,10,12\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("products.csv"),
            "product_id,product_name,unit_price\n10,Bolt,0.25\n20,Hammer,10.0\n",
        )
        .unwrap();

        let source = TableSource::new(
            LocalStorage::new(temp_dir.path()),
            "sales.csv",
            "products.csv",
            "product_id",
        );
        let records = source.extract().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data["sale_id"], json!(1));
        assert_eq!(records[0].data["product_name"], json!("Hammer"));
        assert_eq!(records[0].data["unit_price"], json!(10.0));
        assert_eq!(records[1].data["sale_id"], json!(3));
        assert_eq!(records[1].data["unit_price"], json!(0.25));
        let keys: Vec<&String> = records[0].data.keys().collect();
        assert_eq!(
            keys,
            ["sale_id", "product_id", "quantity", "product_name", "unit_price"]
        );
    }

    fn join_tables(temp_dir: &TempDir, sales: &str, products: &str) -> TableSource<LocalStorage> {
        std::fs::write(temp_dir.path().join("sales.csv"), sales).unwrap();
        std::fs::write(temp_dir.path().join("products.csv"), products).unwrap();
        TableSource::new(
            LocalStorage::new(temp_dir.path()),
            "sales.csv",
            "products.csv",
            "product_id",
        )
    }

    #[tokio::test]
    async fn test_join_emits_one_record_per_matching_product() {
        let temp_dir = TempDir::new().unwrap();
        let source = join_tables(
            &temp_dir,
            "sale_id,product_id,quantity\n1,10,2\n2,20,1\n",
            "product_id,unit_price\n10,1.0\n20,5.0\n10,2.0\n",
        );

        let records = source.extract().await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].data["sale_id"], json!(1));
        assert_eq!(records[0].data["unit_price"], json!(1.0));
        assert_eq!(records[1].data["sale_id"], json!(1));
        assert_eq!(records[1].data["unit_price"], json!(2.0));
        assert_eq!(records[2].data["sale_id"], json!(2));
    }

    #[tokio::test]
    async fn test_join_matches_integral_float_keys() {
        let temp_dir = TempDir::new().unwrap();
        let source = join_tables(
            &temp_dir,
            "sale_id,product_id,quantity\n1,10,2\n2,11,1\n",
            "product_id,unit_price\n10.0,4.0\n11.5,1.0\n",
        );

        let records = source.extract().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data["sale_id"], json!(1));
        assert_eq!(records[0].data["product_id"], json!(10));
        assert_eq!(records[0].data["unit_price"], json!(4.0));
    }

    #[test]
    fn test_join_key_forms() {
        assert_eq!(join_key(&json!(10)), Some("10".to_string()));
        assert_eq!(join_key(&json!(10.0)), Some("10".to_string()));
        assert_eq!(join_key(&json!(10.5)), Some("10.5".to_string()));
        assert_eq!(join_key(&json!("10")), Some("10".to_string()));
        assert_eq!(join_key(&Value::Null), None);
    }

    #[tokio::test]
    async fn test_missing_table_fails_extract() {
        let temp_dir = TempDir::new().unwrap();
        let source = TableSource::new(
            LocalStorage::new(temp_dir.path()),
            "sales.csv",
            "products.csv",
            "product_id",
        );

        assert!(matches!(
            source.extract().await.unwrap_err(),
            EtlError::IoError(_)
        ));
    }

    fn summary(sale_id: i64, revenue: f64, category: VolumeCategory) -> SalesSummary {
        SalesSummary {
            sale_id: Some(json!(sale_id)),
            product_id: None,
            total_revenue: revenue,
            sales_volume_category: category,
        }
    }

    #[tokio::test]
    async fn test_table_sink_replace_then_append() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let path = temp_dir.path().join("sales_summary.csv");

        TableSink::new(storage.clone(), "sales_summary.csv", WriteMode::Replace)
            .load(&[summary(1, 30.0, VolumeCategory::Low)])
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "sale_id,product_id,total_revenue,sales_volume_category\n1,,30.0,Low\n"
        );

        TableSink::new(storage.clone(), "sales_summary.csv", WriteMode::Append)
            .load(&[summary(2, 600.0, VolumeCategory::High)])
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "sale_id,product_id,total_revenue,sales_volume_category\n1,,30.0,Low\n2,,600.0,High\n"
        );

        TableSink::new(storage, "sales_summary.csv", WriteMode::Replace)
            .load(&[summary(3, 12.5, VolumeCategory::Medium)])
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "sale_id,product_id,total_revenue,sales_volume_category\n3,,12.5,Medium\n"
        );
    }

    #[tokio::test]
    async fn test_empty_replace_writes_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let path = temp_dir.path().join("sales_summary.csv");

        TableSink::new(storage.clone(), "sales_summary.csv", WriteMode::Replace)
            .load(&[summary(1, 30.0, VolumeCategory::Low)])
            .await
            .unwrap();
        TableSink::new(storage, "sales_summary.csv", WriteMode::Replace)
            .load(&[] as &[SalesSummary])
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "sale_id,product_id,total_revenue,sales_volume_category\n"
        );
    }

    #[test]
    fn test_declared_columns_match_serialized_header() {
        let rows = encode_rows(&[summary(1, 1.0, VolumeCategory::Low)], true).unwrap();
        let text = String::from_utf8(rows).unwrap();
        let header = text.lines().next().unwrap();

        assert_eq!(header, SalesSummary::COLUMNS.join(","));
    }

    #[tokio::test]
    async fn test_append_to_missing_table_writes_header() {
        let temp_dir = TempDir::new().unwrap();
        let sink = TableSink::new(
            LocalStorage::new(temp_dir.path()),
            "fresh.csv",
            WriteMode::Append,
        );

        sink.load(&[summary(1, 1.0, VolumeCategory::Low)]).await.unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join("fresh.csv")).unwrap();
        assert!(content.starts_with("sale_id,"));
    }
}
