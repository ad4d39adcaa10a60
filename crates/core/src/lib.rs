pub mod config;
pub mod converter;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use converter::{
    plan_conversions, ConversionExecutor, ConvertJob, ConvertSettings, Converter,
    ConverterConfig, ConverterError, ExecuteOptions, ExecutionSummary, FfmpegConverter,
    JobOutcome, StreamDescriptor,
};
