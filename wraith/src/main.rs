//! Wraith is a headless runner for the phantom cores. It loads a program, ticks it until it halts
//! (or a tick limit is hit), and reports what the machine did.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use phantom::{config::BootMode, Architecture, Emulator, LastInstruction, Session};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;

use config::RunnerConfig;

const DEFAULT_TICKS: u64 = 1_000_000;
/// Instructions between timer steps. CHIP-8 programs expect around 600 instructions per second
/// against 60 Hz timers.
const TICKS_PER_TIMER_STEP: u64 = 10;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Arch {
    Chip8,
    Gameboy,
}

impl From<Arch> for Architecture {
    fn from(arch: Arch) -> Self {
        match arch {
            Arch::Chip8 => Architecture::Chip8,
            Arch::Gameboy => Architecture::GameBoy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The program to run.
    path: PathBuf,
    /// The machine to run the program on. Guessed from the file extension when omitted.
    #[arg(long, value_enum)]
    arch: Option<Arch>,
    /// A TOML config for the runner and the machines.
    #[arg(long)]
    config: Option<PathBuf>,
    /// The most instructions to execute.
    #[arg(long)]
    ticks: Option<u64>,
    /// Seed for the CHIP-8 random number generator.
    #[arg(long)]
    seed: Option<u64>,
    /// Start Game Boy programs at the cartridge entry point instead of 0x0000.
    #[arg(long)]
    cartridge: bool,
    /// A key to latch before the first tick, in hex.
    #[arg(long, value_parser = parse_hex)]
    key: Option<u8>,
    /// Render the display once the run is over.
    #[arg(long)]
    screen: bool,
}

fn parse_hex(s: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => match RunnerConfig::read(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => RunnerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.machine.chip8.rng_seed = Some(seed);
    }
    if args.cartridge {
        config.machine.gameboy.boot = BootMode::Cartridge;
    }
    let arch = args.arch.map_or_else(|| guess_arch(&args.path), Architecture::from);

    let mut session = Session::initialize(arch, &config.machine);
    if session.load_program(&args.path) == 0 {
        error!("Could not load {:?}", args.path);
        return ExitCode::FAILURE;
    }
    if let Some(key) = args.key {
        session.set_keyboard_value(key);
    }

    let limit = args.ticks.or(config.ticks).unwrap_or(DEFAULT_TICKS);
    let (ticks, cycles) = run(&mut session, limit);
    let Some(machine) = session.context() else {
        return ExitCode::FAILURE;
    };
    info!("Ran {ticks} instructions ({cycles} cycles) on {}", machine.info());
    if args.screen || config.screen {
        render(machine);
    }
    let code = match machine.last_instruction() {
        LastInstruction::Invalid(opcode) => {
            error!("Stopped on invalid opcode 0x{opcode:0>4X}");
            ExitCode::FAILURE
        }
        _ if !machine.is_halted() => {
            warn!("Gave up after {limit} instructions");
            ExitCode::SUCCESS
        }
        _ => ExitCode::SUCCESS,
    };
    session.quit_program();
    code
}

/// Ticks until the machine stops or the limit is hit, stepping the machine's timers along the way.
/// Returns the number of instructions executed and the cycles they took.
fn run(session: &mut Session, limit: u64) -> (u64, u64) {
    let mut cycles = 0;
    for tick in 0..limit {
        match session.tick_emulation() {
            0 => return (tick, cycles),
            n => cycles += n as u64,
        }
        if (tick + 1) % TICKS_PER_TIMER_STEP == 0 {
            session.tick_timers();
        }
    }
    (limit, cycles)
}

fn guess_arch(path: &std::path::Path) -> Architecture {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("gb" | "gbc") => Architecture::GameBoy,
        _ => Architecture::Chip8,
    }
}

/// Prints the display with one character per pixel.
fn render(machine: &dyn Emulator) {
    let info = machine.info();
    let display = machine.display();
    if display.len() != info.display_width * info.display_height {
        warn!("The {} display is not a framebuffer, skipping render", info.name);
        return;
    }
    for row in display.chunks(info.display_width) {
        let line: String = row
            .iter()
            .map(|px| if *px == 0 { ' ' } else { '#' })
            .collect();
        println!("{}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use phantom::{chip8::Chip8, config::Chip8Config};

    use super::*;

    #[test]
    fn arch_from_extension() {
        assert_eq!(guess_arch("roms/tetris.gb".as_ref()), Architecture::GameBoy);
        assert_eq!(guess_arch("roms/pong.ch8".as_ref()), Architecture::Chip8);
        assert_eq!(guess_arch("roms/pong".as_ref()), Architecture::Chip8);
    }

    #[test]
    fn hex_keys() {
        assert_eq!(parse_hex("0xA"), Ok(0xA));
        assert_eq!(parse_hex("f"), Ok(0xF));
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn run_steps_timers() {
        // LD V0, 1; LD DT, V0; loop: LD V1, DT; SE V1, 0; JP loop; then an invalid opcode
        let rom = [0x60, 0x01, 0xF0, 0x15, 0xF1, 0x07, 0x31, 0x00, 0x12, 0x04, 0xFF, 0xFF];
        let chip = Chip8::with_rom(&Chip8Config::default(), &rom).unwrap();
        let mut session = Session::new();
        session.set_emulation_context(Box::new(chip));
        let (ticks, cycles) = run(&mut session, 1_000);
        assert!(ticks < 20, "{ticks}");
        assert_eq!(ticks, cycles);
        assert!(session.context().unwrap().last_instruction().is_invalid());
    }

    #[test]
    fn args_parse() {
        let args = Args::parse_from(["wraith", "game.gb", "--arch", "chip8", "--key", "3"]);
        assert!(matches!(args.arch, Some(Arch::Chip8)));
        assert_eq!(args.key, Some(3));
        assert!(!args.cartridge);
    }
}
