use crate::engine::core::segment::CompressionMethod;
use crate::engine::core::storage_config::StorageConfig;
use crate::shared::config::model::Settings;

const SAMPLE: &str = r#"
[engine]
data_dir = "./data"
vector_size = 512
block_size = 65536
streaming_segment_rows = 256
checkpoint_compression = "lz4"

[logging]
log_dir = "./logs"
stdout_level = "info"
file_level = "debug"
"#;

fn parse(toml: &str) -> Settings {
    config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[test]
fn test_settings_parse_from_toml() {
    let settings = parse(SAMPLE);
    assert_eq!(settings.engine.vector_size, 512);
    assert_eq!(settings.engine.block_size, 65536);
    assert_eq!(settings.engine.checkpoint_compression, "lz4");
    assert_eq!(settings.logging.stdout_level, "info");
}

#[test]
fn test_storage_config_from_settings() {
    let settings = parse(SAMPLE);
    let config = StorageConfig::from_settings(&settings).unwrap();
    assert_eq!(config.vector_size, 512);
    assert_eq!(config.block_size, 65536);
    assert_eq!(config.streaming_segment_rows, 256);
    assert_eq!(config.checkpoint_compression, CompressionMethod::Lz4);
}

#[test]
fn test_unknown_compression_is_rejected() {
    let settings = parse(&SAMPLE.replace("\"lz4\"", "\"snappy\""));
    let err = StorageConfig::from_settings(&settings).unwrap_err();
    assert!(matches!(
        err,
        crate::engine::errors::StorageError::UnknownCompression(_)
    ));
}
