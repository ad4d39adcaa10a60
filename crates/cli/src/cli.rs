use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use eyn_core::{Config, ConvertSettings, ExecuteOptions};

#[derive(Parser)]
#[command(name = "eyn")]
#[command(author, version, about = "Batch media conversion with FFmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a file or every file in a directory
    Convert(ConvertArgs),

    /// Probe a media file and display its codecs
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// File or directory to convert
    #[arg(required = true)]
    pub src: PathBuf,

    /// Target extension (mp4, mkv, webm, mp3, flac, ...)
    #[arg(short, long)]
    pub to: String,

    /// Write outputs here instead of beside each source
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Constant Rate Factor (lower is better quality)
    #[arg(long)]
    pub crf: Option<u8>,

    /// Encoder preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Encoder tune (film, animation, ...)
    #[arg(long)]
    pub tune: Option<String>,

    /// Audio bitrate for lossy codecs (e.g. 192k, or "" for the encoder default)
    #[arg(long)]
    pub audio_bitrate: Option<String>,

    /// FFmpeg video encoder
    #[arg(long)]
    pub vcodec: Option<String>,

    /// FFmpeg audio encoder
    #[arg(long)]
    pub acodec: Option<String>,

    /// Number of parallel conversions
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Always transcode, even when a lossless remux would do
    #[arg(long)]
    pub no_smart_copy: bool,

    /// Show the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Convert even when the output is already up to date
    #[arg(long)]
    pub force: bool,
}

impl ConvertArgs {
    /// Conversion settings: config file values with command-line overrides.
    pub fn settings(&self, config: &Config) -> ConvertSettings {
        let mut video = config.video.clone();
        if let Some(crf) = self.crf {
            video.crf = crf;
        }
        if let Some(ref preset) = self.preset {
            video.preset = preset.clone();
        }
        if let Some(ref tune) = self.tune {
            video.tune = Some(tune.clone());
        }
        if let Some(ref bitrate) = self.audio_bitrate {
            video.audio_bitrate = Some(bitrate.clone()).filter(|b| !b.trim().is_empty());
        }
        if let Some(ref codec) = self.vcodec {
            video.video_codec = codec.clone();
        }
        if let Some(ref codec) = self.acodec {
            video.audio_codec = codec.clone();
        }

        ConvertSettings {
            to: self.to.clone(),
            recursive: self.recursive,
            output_dir: self.output.clone(),
            video,
        }
    }

    /// Execution options: config file values with command-line overrides.
    pub fn execute_options(&self, config: &Config) -> ExecuteOptions {
        let mut options = config.execute.clone();
        if let Some(workers) = self.workers {
            options.workers = Some(workers as usize);
        }
        if self.no_smart_copy {
            options.smart_copy = false;
        }
        if self.dry_run {
            options.dry_run = true;
        }
        if self.force {
            options.skip_if_up_to_date = false;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_args(argv: &[&str]) -> ConvertArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Convert(args) => args,
            _ => panic!("Expected convert command"),
        }
    }

    #[test]
    fn test_parse_convert_minimal() {
        let args = convert_args(&["eyn", "convert", "clip.mov", "--to", "mp4"]);
        assert_eq!(args.src, PathBuf::from("clip.mov"));
        assert_eq!(args.to, "mp4");
        assert!(!args.recursive);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_parse_requires_target() {
        assert!(Cli::try_parse_from(["eyn", "convert", "clip.mov"]).is_err());
    }

    #[test]
    fn test_parse_rejects_zero_workers() {
        assert!(Cli::try_parse_from(["eyn", "convert", "a", "--to", "mp3", "-w", "0"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["eyn", "check-tools", "--verbose", "-c", "eyn.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("eyn.toml")));
        assert!(matches!(cli.command, Commands::CheckTools));
    }

    #[test]
    fn test_parse_probe_json() {
        let cli = Cli::try_parse_from(["eyn", "probe", "song.flac", "--json"]).unwrap();
        match cli.command {
            Commands::Probe { file, json } => {
                assert_eq!(file, PathBuf::from("song.flac"));
                assert!(json);
            }
            _ => panic!("Expected probe command"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.video.crf = 30;
        config.video.preset = "slow".to_string();
        config.execute.workers = Some(8);

        let args = convert_args(&[
            "eyn", "convert", "media", "--to", "webm", "-r", "-o", "out", "--crf", "18",
            "--tune", "animation", "-w", "3", "--no-smart-copy", "--dry-run", "--force",
        ]);
        let settings = args.settings(&config);
        let options = args.execute_options(&config);

        assert_eq!(settings.to, "webm");
        assert!(settings.recursive);
        assert_eq!(settings.output_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.video.crf, 18);
        assert_eq!(settings.video.preset, "slow");
        assert_eq!(settings.video.tune.as_deref(), Some("animation"));

        assert_eq!(options.workers, Some(3));
        assert!(!options.smart_copy);
        assert!(options.dry_run);
        assert!(!options.skip_if_up_to_date);
    }

    #[test]
    fn test_empty_audio_bitrate_flag_unsets_it() {
        let args = convert_args(&[
            "eyn", "convert", "a.wav", "--to", "mp3", "--audio-bitrate", "",
        ]);
        let settings = args.settings(&Config::default());
        assert_eq!(settings.video.audio_bitrate, None);
    }

    #[test]
    fn test_config_used_without_flags() {
        let mut config = Config::default();
        config.execute.workers = Some(2);
        config.video.audio_bitrate = Some("320k".to_string());

        let args = convert_args(&["eyn", "convert", "a.wav", "--to", "mp3"]);
        let settings = args.settings(&config);
        let options = args.execute_options(&config);

        assert_eq!(settings.video.audio_bitrate.as_deref(), Some("320k"));
        assert_eq!(options.workers, Some(2));
        assert!(options.smart_copy);
        assert!(options.skip_if_up_to_date);
    }
}
