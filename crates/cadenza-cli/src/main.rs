//! cadenza: scales, chords and voice-led progressions from the command line

mod config;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use cadenza_core::{
    best_voicing, generate_chord, generate_diatonic_chords_sized, generate_progression,
    interval_name, invert_chord, name_to_pitch, ChordQuality, Key, Pitch, ScaleKind, TheoryError,
    Voicing,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{config_path, load_config, save_config, CliConfig};
use output::Output;

#[derive(Parser, Debug)]
#[command(name = "cadenza", version, about = "Scales, chords and voice-led progressions")]
struct Cli {
    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: <config dir>/cadenza/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log voice-leading decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Name and frequency of a MIDI note
    Note { pitch: String },
    /// Name of an interval in semitones (0..=12)
    Interval {
        #[arg(allow_negative_numbers = true)]
        semitones: i32,
    },
    /// Notes of a scale, root first
    Scale {
        root: String,
        #[arg(short, long)]
        scale: Option<String>,
        #[arg(short, long)]
        octaves: Option<usize>,
    },
    /// A single chord
    Chord {
        root: String,
        quality: String,
        #[arg(short, long, default_value_t = 0)]
        inversion: usize,
        #[arg(long)]
        voicing: Option<String>,
    },
    /// Every chord built on the degrees of a scale
    Diatonic {
        root: String,
        #[arg(short, long)]
        scale: Option<String>,
        /// Notes per chord (3..=7)
        #[arg(long)]
        size: Option<usize>,
    },
    /// Voice-led progression from roman numeral or degree labels
    Progression {
        root: String,
        #[arg(short, long)]
        scale: Option<String>,
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// Smoothest placement of one chord after another
    VoiceLead {
        from_root: String,
        from_quality: String,
        to_root: String,
        to_quality: String,
    },
    /// Write the default config file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

/// Roots are either a MIDI number or a note name such as `C5` or `Eb4`
fn parse_root(text: &str) -> cadenza_core::Result<u8> {
    let text = text.trim();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        let value: i32 = text
            .parse()
            .map_err(|_| TheoryError::InvalidName(text.to_string()))?;
        return Pitch::try_from(value).map(Pitch::value);
    }
    name_to_pitch(text).map(Pitch::value)
}

fn scale_or_default(scale: Option<&str>, config: &CliConfig) -> cadenza_core::Result<ScaleKind> {
    match scale {
        Some(name) => name.parse(),
        None => Ok(config.defaults.scale),
    }
}

fn run(cli: Cli, config: CliConfig, config_file: PathBuf) -> anyhow::Result<()> {
    let out = Output::new(cli.json || config.output.json);

    match cli.command {
        Command::Note { pitch } => {
            let value = parse_root(&pitch).with_context(|| format!("reading note {pitch:?}"))?;
            out.note(Pitch::new(value)?)
        }
        Command::Interval { semitones } => {
            let name = interval_name(semitones)?;
            out.interval(semitones, name)
        }
        Command::Scale {
            root,
            scale,
            octaves,
        } => {
            let root = parse_root(&root).with_context(|| format!("reading root {root:?}"))?;
            let scale = scale_or_default(scale.as_deref(), &config)?;
            let octaves = octaves.unwrap_or(config.defaults.octaves);
            let notes = Key::new(root, scale)?
                .notes(octaves)
                .with_context(|| format!("building {scale} over {octaves} octave(s)"))?;
            out.scale(scale, &notes)
        }
        Command::Chord {
            root,
            quality,
            inversion,
            voicing,
        } => {
            let root = parse_root(&root).with_context(|| format!("reading root {root:?}"))?;
            let quality: ChordQuality = quality.parse()?;
            let mut chord = generate_chord(root, quality)?;
            if inversion > 0 {
                chord = invert_chord(&chord, inversion)?;
            }
            if let Some(voicing) = voicing {
                let voicing: Voicing = voicing.parse()?;
                chord = chord
                    .voiced(voicing)
                    .with_context(|| format!("applying {voicing:?} voicing"))?;
            }
            out.chord(&chord)
        }
        Command::Diatonic { root, scale, size } => {
            let root = parse_root(&root).with_context(|| format!("reading root {root:?}"))?;
            let scale = scale_or_default(scale.as_deref(), &config)?;
            let size = size.unwrap_or(config.defaults.chord_size);
            let chords = generate_diatonic_chords_sized(root, scale, size)?;
            out.diatonic(&chords)
        }
        Command::Progression {
            root,
            scale,
            labels,
        } => {
            let root = parse_root(&root).with_context(|| format!("reading root {root:?}"))?;
            let scale = scale_or_default(scale.as_deref(), &config)?;
            let progression = generate_progression(root, scale, labels.as_slice())
                .with_context(|| format!("building progression {}", labels.join(" ")))?;
            out.progression(&progression)
        }
        Command::VoiceLead {
            from_root,
            from_quality,
            to_root,
            to_quality,
        } => {
            let from_root =
                parse_root(&from_root).with_context(|| format!("reading root {from_root:?}"))?;
            let to_root =
                parse_root(&to_root).with_context(|| format!("reading root {to_root:?}"))?;
            let from = generate_chord(from_root, from_quality.parse()?)?;
            let to_quality: ChordQuality = to_quality.parse()?;
            let result = best_voicing(&from, to_root, to_quality)?;
            out.voice_leading(&from, &result)
        }
        Command::InitConfig { force } => {
            if config_file.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    config_file.display()
                );
            }
            save_config(&config_file, &CliConfig::default())?;
            tracing::info!("Wrote {}", config_file.display());
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "cadenza=debug" } else { "cadenza=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let config = load_config(&config_file);

    run(cli, config, config_file)
}
