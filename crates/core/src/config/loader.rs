use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides, e.g. `EYN_EXECUTE__WORKERS=4`.
pub const ENV_PREFIX: &str = "EYN_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from `path` when given, otherwise defaults plus
/// environment overrides
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[execute]
workers = 3
dry_run = true

[video]
crf = 20
tune = "film"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.execute.workers, Some(3));
        assert!(config.execute.dry_run);
        assert!(config.execute.smart_copy);
        assert_eq!(config.video.crf, 20);
        assert_eq!(config.video.tune.as_deref(), Some("film"));
        assert_eq!(config.video.preset, "medium");
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.execute.workers, None);
        assert_eq!(config.converter.ffmpeg_log_level, "warning");
        assert_eq!(config.video.video_codec, "libx264");
    }

    #[test]
    fn test_load_config_from_file_unsets_bitrate() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[video]\naudio_bitrate = \"\"").unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.video.audio_bitrate, None);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[execute]
workers = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/eyn.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_or_default_without_path() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.video.crf, 23);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[converter]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 600

[video]
audio_bitrate = "256k"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.converter.ffmpeg_path,
            std::path::PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.converter.timeout_secs, Some(600));
        assert_eq!(config.video.audio_bitrate.as_deref(), Some("256k"));
    }
}
