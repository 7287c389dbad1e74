// System Alert Sound - command line front end
// Plays an alert sample at the configured system alert volume

use anyhow::Result;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use system_alert_sound::{
    config::{ConfigStore, MemoryConfigStore, PlayerSettings, TomlConfigStore},
    read_volume_setting, AlertSoundPlayer, PlayOutcome, RodioOutput, VolumeScale,
};

const USAGE: &str = "\
Usage: system-alert-sound <COMMAND>

Commands:
  play <SAMPLE>   Play an alert sample at the system alert volume
  volume          Print the effective alert volume (mute, half or full)

Options:
  -h, --help      Print this help";

/// Load the user's config, falling back to an empty store (full volume)
fn load_config() -> (Box<dyn ConfigStore>, PlayerSettings) {
    match TomlConfigStore::open_default() {
        Ok(store) => {
            let settings = store.settings().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid [player] settings, using defaults");
                PlayerSettings::default()
            });
            (Box::new(store), settings)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load configuration, using defaults");
            (Box::new(MemoryConfigStore::new()), PlayerSettings::default())
        }
    }
}

fn play(sample: &str) -> Result<()> {
    let (config, settings) = load_config();
    let output = RodioOutput::from_settings(&settings);
    let player = AlertSoundPlayer::new(config, &output).with_settings(&settings);

    match player.try_play(sample) {
        Ok(PlayOutcome::Muted) => {
            tracing::info!("Alert volume is muted, nothing played");
        }
        Ok(PlayOutcome::Played { gain }) => {
            tracing::info!(sample = %sample, gain, "Playing alert sound");
            output.wait_until_idle();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Alert sound not played");
        }
    }

    Ok(())
}

fn volume() -> Result<()> {
    let (config, _) = load_config();
    println!("{}", VolumeScale::from_setting(read_volume_setting(&*config)));
    Ok(())
}

fn main() -> Result<ExitCode> {
    // Initialize logging; RUST_LOG=debug shows why an alert stayed silent
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["play", sample] => play(sample)?,
        ["volume"] => volume()?,
        ["-h"] | ["--help"] => println!("{USAGE}"),
        _ => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}
