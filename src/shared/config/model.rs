use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    pub data_dir: String,
    /// Rows per scan/append batch. Every vector handed across the engine
    /// boundary holds at most this many rows.
    pub vector_size: usize,
    /// Size in bytes of one storage block; transient segments are sized by it.
    pub block_size: usize,
    /// Row capacity of segments created for append-only streaming columns.
    pub streaming_segment_rows: usize,
    /// Codec applied when checkpoint rewrites a segment ("none" or "lz4").
    pub checkpoint_compression: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("KOLOMDB_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
