use super::{types::Config, ConfigError};
use crate::converter::FFMPEG_LOG_LEVELS;

/// Highest CRF accepted by the encoders we drive.
const MAX_CRF: u8 = 63;

/// Validate configuration
/// Currently validates:
/// - Worker count is not 0 when set
/// - CRF is within encoder range
/// - Timeout is not 0 when set
/// - FFmpeg log level is one ffmpeg understands
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Execute validation
    if config.execute.workers == Some(0) {
        return Err(ConfigError::ValidationError(
            "execute.workers cannot be 0".to_string(),
        ));
    }

    // Video validation
    if config.video.crf > MAX_CRF {
        return Err(ConfigError::ValidationError(format!(
            "video.crf must be at most {}, got {}",
            MAX_CRF, config.video.crf
        )));
    }

    // Converter validation
    if config.converter.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }
    if !FFMPEG_LOG_LEVELS.contains(&config.converter.ffmpeg_log_level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "converter.ffmpeg_log_level must be one of {}, got {:?}",
            FFMPEG_LOG_LEVELS.join(", "),
            config.converter.ffmpeg_log_level
        )));
    }

    Ok(())
}
