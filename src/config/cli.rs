use crate::adapters::table::WriteMode;
use crate::config::toml_config::{
    ErrorHandlingConfig, LoadConfig, PipelineFile, PipelineInfo, SourceConfig, TransformConfig,
    DEFAULT_JOIN_KEY, DEFAULT_OUTPUT_FILE, DEFAULT_OUTPUT_TABLE, DEFAULT_PRODUCTS_TABLE,
    DEFAULT_SALES_TABLE,
};
use crate::core::pipeline::OnInvalidRecord;
use crate::utils::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "record-etl")]
#[command(about = "Extract records, reshape them and load the result")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch the product catalog and write it as a JSON file
    Products {
        #[arg(long, default_value = "https://fakestoreapi.com/products")]
        api_endpoint: String,

        #[arg(long, help = "Abort the request after this many seconds")]
        timeout_seconds: Option<u64>,

        #[arg(long, default_value = "./output")]
        output_path: String,

        #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
        output_file: String,
    },
    /// Join sales with products, compute revenue and load the summary table
    Sales {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long, default_value = DEFAULT_SALES_TABLE)]
        sales_table: String,

        #[arg(long, default_value = DEFAULT_PRODUCTS_TABLE)]
        products_table: String,

        #[arg(long, default_value = DEFAULT_JOIN_KEY)]
        join_key: String,

        #[arg(long, default_value = "./output")]
        output_path: String,

        #[arg(long, default_value = DEFAULT_OUTPUT_TABLE)]
        output_table: String,

        #[arg(long, value_enum, default_value_t = WriteMode::Replace)]
        write_mode: WriteMode,

        #[arg(long, value_enum, default_value_t = OnInvalidRecord::Abort)]
        on_invalid_record: OnInvalidRecord,
    },
    /// Run a pipeline described by a TOML file
    Run {
        #[arg(long)]
        config: PathBuf,
    },
}

impl CliConfig {
    /// Resolves the selected subcommand into a pipeline definition.
    pub fn pipeline_file(&self) -> Result<PipelineFile> {
        match &self.command {
            Command::Products {
                api_endpoint,
                timeout_seconds,
                output_path,
                output_file,
            } => Ok(PipelineFile {
                pipeline: PipelineInfo {
                    name: "products".to_string(),
                    description: None,
                },
                source: SourceConfig::Api {
                    endpoint: api_endpoint.clone(),
                    timeout_seconds: *timeout_seconds,
                },
                transform: TransformConfig::FieldMapping {
                    fields: Default::default(),
                },
                load: LoadConfig::Json {
                    output_path: output_path.clone(),
                    filename: output_file.clone(),
                },
                error_handling: ErrorHandlingConfig::default(),
            }),
            Command::Sales {
                data_dir,
                sales_table,
                products_table,
                join_key,
                output_path,
                output_table,
                write_mode,
                on_invalid_record,
            } => Ok(PipelineFile {
                pipeline: PipelineInfo {
                    name: "sales".to_string(),
                    description: None,
                },
                source: SourceConfig::Tables {
                    data_dir: data_dir.clone(),
                    sales_table: sales_table.clone(),
                    products_table: products_table.clone(),
                    join_key: join_key.clone(),
                },
                transform: TransformConfig::Aggregation {
                    fields: Default::default(),
                    volume_bands: Default::default(),
                },
                load: LoadConfig::Table {
                    output_path: output_path.clone(),
                    table: output_table.clone(),
                    write_mode: *write_mode,
                },
                error_handling: ErrorHandlingConfig {
                    on_invalid_record: *on_invalid_record,
                },
            }),
            Command::Run { config } => PipelineFile::from_file(config),
        }
    }
}
