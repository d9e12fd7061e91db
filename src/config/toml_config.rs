use crate::adapters::table::WriteMode;
use crate::core::pipeline::OnInvalidRecord;
use crate::core::transform::{ProductFieldSources, SalesFieldSources, VolumeBands};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_name, validate_non_empty_string, validate_path, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OUTPUT_FILE: &str = "products.json";
pub const DEFAULT_SALES_TABLE: &str = "sales.csv";
pub const DEFAULT_PRODUCTS_TABLE: &str = "products.csv";
pub const DEFAULT_JOIN_KEY: &str = "product_id";
pub const DEFAULT_OUTPUT_TABLE: &str = "sales_summary.csv";

/// One pipeline definition: where records come from, how they are
/// transformed and where they go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    pub pipeline: PipelineInfo,
    pub source: SourceConfig,
    pub transform: TransformConfig,
    pub load: LoadConfig,
    #[serde(default)]
    pub error_handling: ErrorHandlingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Api {
        endpoint: String,
        timeout_seconds: Option<u64>,
    },
    Tables {
        data_dir: String,
        #[serde(default = "default_sales_table")]
        sales_table: String,
        #[serde(default = "default_products_table")]
        products_table: String,
        #[serde(default = "default_join_key")]
        join_key: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransformConfig {
    FieldMapping {
        #[serde(default)]
        fields: ProductFieldSources,
    },
    Aggregation {
        #[serde(default)]
        fields: SalesFieldSources,
        #[serde(default)]
        volume_bands: VolumeBands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoadConfig {
    Json {
        output_path: String,
        #[serde(default = "default_output_file")]
        filename: String,
    },
    Table {
        output_path: String,
        #[serde(default = "default_output_table")]
        table: String,
        #[serde(default)]
        write_mode: WriteMode,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    #[serde(default)]
    pub on_invalid_record: OnInvalidRecord,
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

fn default_sales_table() -> String {
    DEFAULT_SALES_TABLE.to_string()
}

fn default_products_table() -> String {
    DEFAULT_PRODUCTS_TABLE.to_string()
}

fn default_join_key() -> String {
    DEFAULT_JOIN_KEY.to_string()
}

fn default_output_table() -> String {
    DEFAULT_OUTPUT_TABLE.to_string()
}

impl PipelineFile {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn name(&self) -> &str {
        &self.pipeline.name
    }
}

impl Validate for PipelineFile {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        match &self.source {
            SourceConfig::Api {
                endpoint,
                timeout_seconds,
            } => {
                validate_url("source.endpoint", endpoint)?;
                if *timeout_seconds == Some(0) {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "source.timeout_seconds".to_string(),
                        value: "0".to_string(),
                        reason: "Timeout must be at least 1 second".to_string(),
                    });
                }
            }
            SourceConfig::Tables {
                data_dir,
                sales_table,
                products_table,
                join_key,
            } => {
                validate_path("source.data_dir", data_dir)?;
                validate_file_name("source.sales_table", sales_table)?;
                validate_file_name("source.products_table", products_table)?;
                validate_non_empty_string("source.join_key", join_key)?;
            }
        }

        if let TransformConfig::Aggregation { volume_bands, .. } = &self.transform {
            volume_bands.validate()?;
        }

        match &self.load {
            LoadConfig::Json {
                output_path,
                filename,
            } => {
                validate_path("load.output_path", output_path)?;
                validate_file_name("load.filename", filename)?;
            }
            LoadConfig::Table {
                output_path, table, ..
            } => {
                validate_path("load.output_path", output_path)?;
                validate_file_name("load.table", table)?;
            }
        }

        Ok(())
    }
}
