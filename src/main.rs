//! bytecpu-emu - CLI Entry Point
//!
//! Commands:
//! - `bytecpu-emu run <program>` - Run an assembly file until it halts
//! - `bytecpu-emu check <program>` - Load a file and report errors
//! - `bytecpu-emu disasm <program>` - Print the canonical listing of a file
//!
//! With no command, runs a short built-in demo program with tracing on.

use bytecpu::{Emulator, MachineConfig, MachineState};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEMO_PROGRAM: &str = "\
; Simple program
MOVEI R0, 16
MOVEI R1, 6
ADD R0, R1
MOVEM R0, 0
HALT
";

#[derive(Parser)]
#[command(name = "bytecpu-emu")]
#[command(version)]
#[command(about = "A step-driven emulator for an 8-bit register machine")]
struct Cli {
    /// Machine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of registers
    #[arg(long, global = true)]
    registers: Option<usize>,

    /// Log every step (sets the log filter to `trace`)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the assembly file to execute
        program: PathBuf,
        /// Maximum number of steps to run
        #[arg(short, long, default_value = "10000")]
        max_steps: u64,
        /// Print every step as it executes
        #[arg(short, long)]
        trace: bool,
        /// Emit step records and the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a program and report whether it is valid
    Check {
        /// Path to the assembly file
        program: PathBuf,
    },
    /// Print the canonical listing of a program
    Disasm {
        /// Path to the assembly file
        program: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut emu = build_emulator(cli.config.as_deref(), cli.registers);

    match cli.command {
        Some(Commands::Run {
            program,
            max_steps,
            trace,
            json,
        }) => {
            let source = read_source(&program);
            load_or_exit(&mut emu, &source);
            run_program(&mut emu, max_steps, trace, json);
        }
        Some(Commands::Check { program }) => {
            let source = read_source(&program);
            let len = load_or_exit(&mut emu, &source);
            println!("ok: {} instructions", len);
        }
        Some(Commands::Disasm { program }) => {
            let source = read_source(&program);
            load_or_exit(&mut emu, &source);
            print!("{}", bytecpu::disassemble(emu.program().instructions()));
        }
        None => {
            println!("bytecpu {}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            println!();
            println!("━━━ Demo ━━━");
            print!("{}", DEMO_PROGRAM);
            println!();
            load_or_exit(&mut emu, DEMO_PROGRAM);
            run_program(&mut emu, 100, true, false);
        }
    }
}

fn build_emulator(config: Option<&Path>, registers: Option<usize>) -> Emulator {
    let mut machine = match config {
        Some(path) => match MachineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => MachineConfig::default(),
    };
    if let Some(count) = registers {
        machine.register_count = count;
    }

    match Emulator::with_config(machine) {
        Ok(emu) => emu,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_or_exit(emu: &mut Emulator, source: &str) -> usize {
    match emu.load(source) {
        Ok(len) => len,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(emu: &mut Emulator, max_steps: u64, trace: bool, json: bool) {
    let mut steps = 0u64;
    while !emu.is_halted() && steps < max_steps {
        match emu.step() {
            Ok(Some(record)) => {
                steps += 1;
                if json {
                    print_json(&record);
                } else if trace {
                    let access = record
                        .memory_access
                        .map(|a| format!("  [{:?} {} = {}]", a.direction, a.address, a.value))
                        .unwrap_or_default();
                    println!(
                        "{:03}: {:<20} regs={:?} flags={:?} sp={}{}",
                        record.address,
                        record.instruction,
                        record.changed_registers,
                        record.changed_flags,
                        record.stack_pointer,
                        access
                    );
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let state = emu.state();
    if json {
        print_json(&state);
    } else {
        print_summary(&state, steps);
    }

    if !emu.is_halted() {
        eprintln!(
            "warning: reached step limit ({}). Use --max-steps to increase.",
            max_steps
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_summary(state: &MachineState, steps: u64) {
    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", steps);
    println!("State: {:?}", state.status);
    println!("PC: {:03}  SP: 0x{:02X}", state.program_counter, state.stack_pointer);
    for (index, value) in state.registers.iter().enumerate() {
        println!("R{:<2} = {:3} (0x{:02X})", index, value, value);
    }
    let f = &state.flags;
    println!(
        "Flags: Z={} C={} S={} V={}",
        u8::from(f.zero),
        u8::from(f.carry),
        u8::from(f.sign),
        u8::from(f.overflow)
    );

    let used: Vec<_> = state
        .data_memory
        .iter()
        .enumerate()
        .filter(|&(_, &value)| value != 0)
        .collect();
    if !used.is_empty() {
        println!("Data memory:");
        for (addr, value) in used {
            println!("  [{:03}] = {}", addr, value);
        }
    }
}
