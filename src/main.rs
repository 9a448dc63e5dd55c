//! CHIP-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `chip8-emu run <rom>`  - Play a program in the terminal
//! - `chip8-emu exec <rom>` - Run a program headless and dump the final state

use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use chip8::{Config, Cpu};

#[derive(Parser)]
#[command(name = "chip8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An interpreter for the CHIP-8 virtual machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a program in the terminal (Esc quits)
    Run {
        /// Path to the program image
        rom: PathBuf,
        /// JSON settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Instructions per second
        #[arg(long)]
        ips: Option<u32>,
        /// Seed for the random number instruction
        #[arg(long)]
        seed: Option<u64>,
        /// Do not ring the terminal bell
        #[arg(long)]
        mute: bool,
    },
    /// Run a program without a display and print the final machine state
    Exec {
        /// Path to the program image
        rom: PathBuf,
        /// JSON settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Seed for the random number instruction
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { rom, config, ips, seed, mute } => {
            let mut config = load_config(config);
            if let Some(ips) = ips {
                config.instructions_per_second = ips;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if mute {
                config.sound = false;
            }
            run_program(&rom, config);
        }
        Commands::Exec { rom, config, max_cycles, seed } => {
            let mut config = load_config(config);
            if seed.is_some() {
                config.seed = seed;
            }
            exec_program(&rom, config, max_cycles);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Config {
    let config = match path {
        Some(path) => Config::load(&path),
        None => Ok(Config::default()),
    };
    match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn read_rom(path: &Path) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.is_empty() => {
            eprintln!("❌ {} is empty", path.display());
            std::process::exit(1);
        }
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "tui")]
fn run_program(path: &Path, config: Config) {
    let program = read_rom(path);
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // The terminal is restored before we get here
    if let Err(e) = chip8::run_terminal(&program, config) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn run_program(_path: &Path, _config: Config) {
    eprintln!("❌ built without the `tui` feature; use `exec` instead");
    std::process::exit(1);
}

fn exec_program(path: &Path, config: Config, max_cycles: u64) {
    let program = read_rom(path);
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let mut cpu = match config.seed {
        Some(seed) => Cpu::with_seed(seed),
        None => Cpu::new(),
    };
    if let Err(e) = cpu.install(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }
    println!("📂 Loaded {} bytes from {}", program.len(), path.display());

    // Keep the timers at their real rate relative to the instruction rate
    let ips = u64::from(config.instructions_per_second);
    let timer_hz = u64::from(config.timer_hz);
    let mut ticked = 0;
    let mut failure = None;
    for n in 1..=max_cycles {
        if let Err(e) = cpu.step() {
            failure = Some(e);
            break;
        }
        let due = n.saturating_mul(timer_hz) / ips;
        while ticked < due {
            cpu.tick_timers();
            ticked += 1;
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("State:  {:?}", cpu.state);
    println!("PC: {:03X}  I: {:03X}  SP: {}", cpu.regs.pc, cpu.regs.i, cpu.regs.depth());
    println!("DT: {}  ST: {}", cpu.timers.delay, cpu.timers.sound);
    for (n, v) in cpu.registers().iter().enumerate() {
        print!("V{:X}={:02X} ", n, v);
        if n % 8 == 7 {
            println!();
        }
    }
    println!();
    print!("{}", cpu.framebuffer());

    if let Some(e) = failure {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
