//! Command-line interface for voxsplice
//!
//! Provides argument parsing using clap derive macros.

use crate::fragment::VoiceAge;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Assemble speech fragments into one timed WAV track
#[derive(Parser, Debug)]
#[command(
    name = "voxsplice",
    version,
    about = "Assemble speech fragments into one timed WAV track"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render every fragment of a manifest and assemble them into one track
    Assemble {
        /// TOML manifest listing the fragments in order
        manifest: PathBuf,

        /// Output WAV path ("-" for stdout)
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Wrap raw 16-bit mono PCM from the speech service as WAV
    PcmToWav {
        /// Raw PCM input file
        input: PathBuf,

        /// Output WAV path ("-" for stdout)
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        #[command(flatten)]
        speed: SpeedArgs,
    },

    /// Cut a time range out of a WAV file
    Trim {
        /// WAV input file
        input: PathBuf,

        /// Start time (e.g. 1.5, 1500ms, 2s)
        #[arg(long, value_name = "TIME", default_value = "0", value_parser = parse_seconds)]
        start: f64,

        /// End time (default: end of file)
        #[arg(long, value_name = "TIME", value_parser = parse_seconds)]
        end: Option<f64>,

        /// Output WAV path ("-" for stdout)
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Change playback speed (tempo and pitch together)
    Speed {
        /// WAV input file
        input: PathBuf,

        /// Output WAV path ("-" for stdout)
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        #[command(flatten)]
        speed: SpeedArgs,
    },

    /// Show sample rate, channels and duration of a WAV file
    Info {
        /// WAV input file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Speed selection shared by `pcm-to-wav` and `speed`
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct SpeedArgs {
    /// Speed factor (>1 faster and higher, <1 slower and lower)
    #[arg(long, value_name = "FACTOR")]
    pub speed: Option<f64>,

    /// Voice persona (natural, younger, older)
    #[arg(long, value_name = "VOICE")]
    pub voice: Option<VoiceAge>,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse a time argument into seconds.
///
/// Bare numbers are seconds (fractions allowed); anything else goes through
/// `humantime` (`1500ms`, `2s`, `1m30s`).
pub fn parse_seconds(s: &str) -> Result<f64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return if secs.is_finite() {
            Ok(secs)
        } else {
            Err(format!("invalid time: {}", s))
        };
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f64())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_seconds_accepts_bare_numbers() {
        assert_eq!(parse_seconds("1.5"), Ok(1.5));
        assert_eq!(parse_seconds(" 3 "), Ok(3.0));
        assert_eq!(parse_seconds("-2"), Ok(-2.0));
    }

    #[test]
    fn parse_seconds_accepts_units() {
        assert_eq!(parse_seconds("1500ms"), Ok(1.5));
        assert_eq!(parse_seconds("2s"), Ok(2.0));
        assert_eq!(parse_seconds("1m30s"), Ok(90.0));
    }

    #[test]
    fn parse_seconds_rejects_garbage() {
        assert!(parse_seconds("soon").is_err());
        assert!(parse_seconds("inf").is_err());
    }

    #[test]
    fn parses_assemble_command() {
        let cli = Cli::try_parse_from(["voxsplice", "-v", "assemble", "t.toml", "-o", "out.wav"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Assemble { manifest, output } => {
                assert_eq!(manifest, PathBuf::from("t.toml"));
                assert_eq!(output, PathBuf::from("out.wav"));
            }
            other => panic!("Expected Assemble, got {:?}", other),
        }
    }

    #[test]
    fn parses_trim_times() {
        let cli = Cli::try_parse_from([
            "voxsplice", "trim", "in.wav", "--start", "500ms", "--end", "2.25", "-o", "out.wav",
        ])
        .unwrap();
        match cli.command {
            Commands::Trim { start, end, .. } => {
                assert_eq!(start, 0.5);
                assert_eq!(end, Some(2.25));
            }
            other => panic!("Expected Trim, got {:?}", other),
        }
    }

    #[test]
    fn parses_voice_persona() {
        let cli =
            Cli::try_parse_from(["voxsplice", "speed", "in.wav", "--voice", "older", "-o", "o.wav"])
                .unwrap();
        match cli.command {
            Commands::Speed { speed, .. } => {
                assert_eq!(speed.voice, Some(VoiceAge::Older));
                assert_eq!(speed.speed, None);
            }
            other => panic!("Expected Speed, got {:?}", other),
        }
    }

    #[test]
    fn speed_and_voice_conflict() {
        let result = Cli::try_parse_from([
            "voxsplice", "speed", "in.wav", "--voice", "older", "--speed", "1.1", "-o", "o.wav",
        ]);
        assert!(result.is_err());
    }
}
