use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use toumapet_system::{RomImage, ToumaPetSystem};

mod config;
mod emulator;
mod input;
mod overlay;
mod rom_path;
mod rtc;
mod screenshot;
mod video;

/// TouMaPet 550/560 handheld emulator.
#[derive(Parser)]
#[command(name = "toumapet", version, about)]
struct Args {
    /// Cartridge ROM dump (.bin, or a .zip containing it)
    #[arg(long)]
    rom: Option<PathBuf>,

    /// Save-state file, loaded at boot and written back on exit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Copy the host clock into device RAM at boot
    #[arg(long)]
    update_time: bool,

    /// Integer window scale
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=5))]
    zoom: Option<u32>,
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("toumapet: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cfg = config::Config::load();

    let rom_file = args
        .rom
        .or(cfg.rom)
        .unwrap_or_else(|| PathBuf::from("toumapet.bin"));
    let zoom = args.zoom.or(cfg.zoom).unwrap_or(3).clamp(1, 5);

    let rom = RomImage::from_bytes(rom_path::load_rom_bytes(&rom_file)?)?;
    log::info!(
        "loaded {} ({:?}, key 0x{:02X})",
        rom_file.display(),
        rom.model(),
        rom.key()
    );
    let mut console = ToumaPetSystem::new(rom);

    if let Some(save) = &args.save {
        match std::fs::read(save) {
            Ok(data) => console.load_state(&data)?,
            Err(e) => log::warn!("no save loaded from {}: {e}", save.display()),
        }
    }

    if args.update_time {
        rtc::sync_clock(&mut console);
    }

    emulator::run(&mut console, zoom, cfg.show_fps)?;

    if let Some(save) = &args.save
        && let Err(e) = std::fs::write(save, console.save_state())
    {
        log::warn!("failed to write save {}: {e}", save.display());
    }
    Ok(())
}
