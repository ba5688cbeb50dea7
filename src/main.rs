//! CHIP-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `chip8-emu run <rom>` - Run a ROM headless and print the final state
//! - `chip8-emu play <rom>` - Play a ROM in the terminal
//! - `chip8-emu info <rom>` - Check a ROM without running it

use chip8::cpu::memory::PROGRAM_CAPACITY;
use chip8::{Cpu, CpuState, RandomSource, Rom, StdRandom, load_rom};
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "chip8-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An interpreter for the CHIP-8 virtual machine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a ROM headless until it halts, waits for a key, or hits the cycle limit
    Run {
        /// Path to the ROM image
        rom: String,
        /// Maximum number of cycles to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Instructions executed per 60 Hz timer tick
        #[arg(long, default_value = "10")]
        cycles_per_tick: u64,
        /// Seed for the random number instruction
        #[arg(short, long)]
        seed: Option<u64>,
        /// Print the final machine state as JSON
        #[arg(short, long)]
        dump: bool,
        /// Log every executed opcode
        #[arg(short, long)]
        trace: bool,
    },
    /// Play a ROM in the terminal
    Play {
        /// Path to the ROM image
        rom: String,
        /// Instructions per second
        #[arg(long, default_value = "600")]
        hz: u32,
        /// Seed for the random number instruction
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Validate a ROM and report its size
    Info {
        /// Path to the ROM image
        rom: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { rom, max_cycles, cycles_per_tick, seed, dump, trace }) => {
            init_logging(trace);
            run_rom(&rom, max_cycles, cycles_per_tick, seed, dump);
        }
        Some(Commands::Play { rom, hz, seed }) => {
            // Keep log output off the alternate screen unless asked for
            if std::env::var_os("RUST_LOG").is_some() {
                init_logging(false);
            }
            play_rom(&rom, hz, seed);
        }
        Some(Commands::Info { rom }) => {
            init_logging(false);
            rom_info(&rom);
        }
        None => {
            println!("CHIP-8 Emulator v0.1.0");
            println!("An interpreter for the CHIP-8 virtual machine");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(trace: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if trace {
        builder.filter_module("chip8", LevelFilter::Trace);
    }
    builder.init();
}

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(StdRandom::seeded(seed)),
        None => Box::new(StdRandom::from_entropy()),
    }
}

fn open_rom(path: &str) -> Rom {
    match load_rom(path) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("❌ Failed to load ROM: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_rom(path: &str, max_cycles: u64, cycles_per_tick: u64, seed: Option<u64>, dump: bool) {
    let rom = open_rom(path);
    println!("🔧 Running: {} ({} bytes)", rom.name, rom.len());

    let mut cpu = Cpu::new();
    cpu.set_random(random_source(seed));
    if let Err(e) = cpu.load_rom(&rom.bytes) {
        eprintln!("❌ Failed to load ROM: {}", e);
        std::process::exit(1);
    }

    let cycles_per_tick = cycles_per_tick.max(1);
    let mut failed = false;
    while cpu.is_running() && cpu.cycles < max_cycles {
        let budget = cycles_per_tick.min(max_cycles - cpu.cycles);
        if let Err(e) = cpu.run_limited(budget) {
            eprintln!("❌ CPU error: {}", e);
            failed = true;
            break;
        }
        cpu.tick_timers();
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("State: {:?}", cpu.state());
    println!("PC: {:03X}   I: {:03X}   SP: {}", cpu.regs.pc, cpu.regs.i(), cpu.stack.depth());
    println!("DT: {:02X}    ST: {:02X}", cpu.regs.delay, cpu.regs.sound);
    for (row, chunk) in cpu.regs.all().chunks(8).enumerate() {
        let line: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(n, v)| format!("V{:X}={:02X}", row * 8 + n, v))
            .collect();
        println!("{}", line.join(" "));
    }
    println!();
    for line in cpu.display.to_strings() {
        println!("{}", line);
    }

    if let CpuState::AwaitingKey(x) = cpu.state() {
        println!();
        println!("⏸  Waiting for a key into V{:X}; no keypad in headless mode.", x);
    } else if cpu.is_running() && cpu.cycles >= max_cycles {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if dump {
        match serde_json::to_string_pretty(&cpu.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("❌ Failed to serialize state: {}", e),
        }
    }

    if failed {
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn play_rom(path: &str, hz: u32, seed: Option<u64>) {
    let rom = open_rom(path);
    if let Err(e) = chip8::run_player(rom, hz.max(1), random_source(seed)) {
        eprintln!("❌ Terminal error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn play_rom(_path: &str, _hz: u32, _seed: Option<u64>) {
    eprintln!("❌ Built without the `tui` feature");
    std::process::exit(1);
}

fn rom_info(path: &str) {
    let rom = open_rom(path);
    let used = rom.len() as f64 / PROGRAM_CAPACITY as f64 * 100.0;

    println!("📂 {}", rom.name);
    println!("Size: {} bytes ({} instructions)", rom.len(), rom.instruction_count());
    println!("Capacity: {} bytes ({:.1}% used)", PROGRAM_CAPACITY, used);
    if rom.len() % 2 != 0 {
        println!("⚠️  Odd length: the last byte is not a whole instruction");
    }
    println!("✓ ROM fits in the program area");
}
