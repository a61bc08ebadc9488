use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use voxsplice::audio::upload::decode_upload;
use voxsplice::cli::{Cli, Commands, ConfigAction, SpeedArgs};
use voxsplice::config::{Config, VoiceConfig};
use voxsplice::manifest::Manifest;
use voxsplice::{Engine, Fragment, SampleBuffer, VoiceAge, resample, trim, write_wav};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Assemble { manifest, output } => {
            let config = load_config(cli.config.as_deref())?;
            handle_assemble(&config, &manifest, &output, cli.quiet)?;
        }
        Commands::PcmToWav {
            input,
            output,
            speed,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let engine = Engine::new(&config.engine)?;
            let pcm = read_input(&input)?;
            let fragment =
                Fragment::generated_with_speed(pcm, resolve_speed(&speed, &config.voice), 0.0)?;
            let rendered = engine
                .render_fragment(&fragment)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            write_buffer(&output, &rendered, cli.quiet)?;
        }
        Commands::Trim {
            input,
            start,
            end,
            output,
        } => {
            let buffer = load_wav(&input)?;
            let end = end.unwrap_or(f64::INFINITY);
            debug!(start, end, "trimming {}", input.display());
            let trimmed = trim(&buffer, start, end);
            write_buffer(&output, &trimmed, cli.quiet)?;
        }
        Commands::Speed {
            input,
            output,
            speed,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let buffer = load_wav(&input)?;
            let factor = resolve_speed(&speed, &config.voice);
            debug!(factor, "changing speed of {}", input.display());
            let changed = resample(buffer, factor)?;
            write_buffer(&output, &changed, cli.quiet)?;
        }
        Commands::Info { input, json } => {
            let info = AudioInfo::from_buffer(&load_wav(&input)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Sample rate: {} Hz", info.sample_rate);
                println!("Channels:    {}", info.channels);
                println!("Frames:      {}", info.frames);
                println!("Duration:    {:.3}s", info.duration_secs);
                println!("Peak:        {:.4}", info.peak);
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "voxsplice",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Summary printed by `voxsplice info`.
#[derive(Debug, Serialize)]
struct AudioInfo {
    sample_rate: u32,
    channels: usize,
    frames: usize,
    duration_secs: f64,
    peak: f32,
}

impl AudioInfo {
    fn from_buffer(buffer: &SampleBuffer) -> Self {
        Self {
            sample_rate: buffer.sample_rate(),
            channels: buffer.channel_count(),
            frames: buffer.frame_count(),
            duration_secs: buffer.duration(),
            peak: buffer.peak(),
        }
    }
}

/// Route `tracing` output to stderr so WAV data can go to stdout.
///
/// `RUST_LOG` takes precedence over the `-q`/`-v` flags.
fn init_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("voxsplice={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_assemble(config: &Config, manifest_path: &Path, output: &Path, quiet: bool) -> Result<()> {
    let engine = Engine::new(&config.engine)?;
    let manifest = Manifest::load(manifest_path)?;
    let fragments = manifest
        .into_fragments(&config.voice)
        .with_context(|| format!("Failed to load fragments from {}", manifest_path.display()))?;
    info!(
        fragments = fragments.len(),
        rate = engine.working_sample_rate(),
        "assembling timeline"
    );

    let export = engine.export(&fragments)?;
    if export.is_empty {
        warn!("manifest produced no audio, writing a one-frame placeholder");
    }

    write_output(output, &export.wav)?;
    if !quiet {
        eprintln!(
            "{} {} fragments into {} ({:.2}s)",
            "Assembled".green().bold(),
            fragments.len(),
            display_path(output),
            export.duration()
        );
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_file_path(config_path)?.display());
        }
        ConfigAction::Init { force } => {
            let path = config_file_path(config_path)?;
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, Config::default().to_toml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
    }
    Ok(())
}

fn config_file_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::default_path()?),
    }
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = config_file_path(config_path)?;
    let config = Config::load_or_default(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?
        .with_env_overrides();
    config.validate()?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

fn resolve_speed(args: &SpeedArgs, voice: &VoiceConfig) -> f64 {
    match (args.speed, args.voice) {
        (Some(speed), _) => speed,
        (None, Some(age)) => voice.speed_for(age),
        (None, None) => voice.speed_for(VoiceAge::Natural),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_wav(path: &Path) -> Result<SampleBuffer> {
    let bytes = read_input(path)?;
    decode_upload(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

fn write_buffer(output: &Path, buffer: &SampleBuffer, quiet: bool) -> Result<()> {
    let wav = write_wav(buffer)?;
    write_output(output, &wav)?;
    report(quiet, output, buffer.duration());
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes).context("Failed to write to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    } else {
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    debug!(bytes = bytes.len(), "wrote {}", display_path(path));
    Ok(())
}

fn report(quiet: bool, output: &Path, seconds: f64) {
    if !quiet {
        eprintln!(
            "{} {} ({:.2}s)",
            "Wrote".green().bold(),
            display_path(output),
            seconds
        );
    }
}

fn display_path(path: &Path) -> String {
    if path == Path::new("-") {
        "stdout".to_string()
    } else {
        path.display().to_string()
    }
}
