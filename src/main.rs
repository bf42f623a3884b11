//! BOOM command line: render, export and play loop patterns as MIDI.
//!
//! Usage:
//!   boom render session.yaml --cycles 2
//!   boom export session.yaml groove.mid --flip
//!   boom play session.yaml --seconds 16
//!   boom midi-devices

mod session;

use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use boom_master::{
    list_midi_devices, Controller, LogSink, MidiSink, MidirSink, RenderedEvent,
};
use clap::{crate_version, Args, Parser, Subcommand};
use session::SessionConfig;
use tracing::info;

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Loop-synchronized pattern-to-MIDI engine for drum and bass patterns."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

/// Pattern tools applied after the session is loaded.
#[derive(Args)]
struct Tools {
    /// Apply Flippit with the session seed.
    #[arg(long)]
    flip: bool,
    /// Apply Bumppit (drum engine only).
    #[arg(long)]
    bump: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Renders the session offline and prints every scheduled MIDI event.
    Render {
        /// The path to the session file.
        session: PathBuf,
        /// Number of loop cycles to render.
        #[arg(short, long, default_value_t = 1)]
        cycles: u32,
        #[command(flatten)]
        tools: Tools,
    },
    /// Writes the session pattern as a Standard MIDI File.
    Export {
        /// The path to the session file.
        session: PathBuf,
        /// The .mid file to write.
        output: PathBuf,
        #[command(flatten)]
        tools: Tools,
    },
    /// Plays the session live, clocked by the default audio device.
    Play {
        /// The path to the session file.
        session: PathBuf,
        /// How long to play for.
        #[arg(short, long, default_value_t = 16)]
        seconds: u64,
    },
    /// Lists the available MIDI output devices.
    MidiDevices {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { session, cycles, tools } => {
            let session = SessionConfig::load(&session)?;
            let mut ctrl = session.controller()?;
            apply_tools(&mut ctrl, &tools)?;

            let events = ctrl.render(session.sample_rate, session.block_size, cycles)?;
            println!(
                "{} | {} bars {} @ {} BPM | {} notes",
                ctrl.engine(),
                ctrl.bars().count(),
                ctrl.time_signature(),
                ctrl.tempo(),
                ctrl.pattern().len()
            );
            for event in &events {
                print_event(event, session.sample_rate);
            }
            println!("{} events", events.len());
        }
        Commands::Export { session, output, tools } => {
            let session = SessionConfig::load(&session)?;
            let mut ctrl = session.controller()?;
            apply_tools(&mut ctrl, &tools)?;

            ctrl.export_midi_to(&output)?;
            println!("Wrote {}", output.display());
        }
        Commands::Play { session, seconds } => {
            let session = SessionConfig::load(&session)?;
            let mut ctrl = session.controller()?;

            let sink: Box<dyn MidiSink> = match session.midi_device.as_deref() {
                Some(device) => Box::new(MidirSink::connect(Some(device))?),
                None => {
                    info!("No MIDI device configured, logging events instead.");
                    Box::new(LogSink)
                }
            };

            ctrl.play(sink)?;
            println!("Playing for {} seconds...", seconds);
            thread::sleep(Duration::from_secs(seconds));
            ctrl.stop();
            println!("Done.");
        }
        Commands::MidiDevices {} => {
            let devices = list_midi_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(())
}

fn apply_tools(ctrl: &mut Controller, tools: &Tools) -> Result<(), Box<dyn Error>> {
    if tools.bump {
        ctrl.bump_drum_rows()?;
    }
    if tools.flip {
        let swaps = ctrl.flip();
        info!(seed = ctrl.seed(), swaps, "Applied Flippit.");
    }
    Ok(())
}

fn print_event(event: &RenderedEvent, sample_rate: u32) {
    let seconds = event.sample as f64 / sample_rate as f64;
    let kind = if event.message.is_note_on() { "on " } else { "off" };
    println!(
        "{:>10} {:>9.4}s  {} ch {:>2} note {:>3} vel {:>3}",
        event.sample,
        seconds,
        kind,
        event.message.channel() + 1,
        event.message.pitch(),
        event.message.velocity()
    );
}
