//! CDC 160-A Emulator - CLI Entry Point
//!
//! Commands:
//! - `cdc160a-emu run <program>` - Run an assembler source file or a saved image
//! - `cdc160a-emu asm <source>` - Assemble to a saved image
//! - `cdc160a-emu disasm <image>` - List a saved image as assembler source

use cdc160a::{
    assemble, disassemble, load_image, save_image, MachineConfig, RunLoop, Storage,
};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::Path;

#[derive(Parser)]
#[command(name = "cdc160a-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the Control Data 160-A twelve bit computer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it stops
    Run {
        /// Assembler source, or a saved image ending in .json
        program: String,
        /// Machine configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// Stop after this many steps even if the machine is still running
        #[arg(short, long)]
        max_steps: Option<u64>,
        /// Log every instruction executed
        #[arg(short, long)]
        trace: bool,
        /// Request an interrupt (octal 10, 20, 30 or 40) before starting
        #[arg(short, long)]
        interrupt: Vec<String>,
        /// Save the final machine state to this image
        #[arg(short, long)]
        save: Option<String>,
    },
    /// Assemble source into a saved image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image, defaults to the source name with .json
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a saved image
    Disasm {
        /// Path to the image
        image: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    env_logger::Builder::new()
        .filter_level(if trace { LevelFilter::Trace } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Run {
            program,
            config,
            max_steps,
            interrupt,
            save,
            ..
        } => run_program(&program, config.as_deref(), max_steps, &interrupt, save.as_deref()),
        Commands::Asm { source, output } => assemble_file(&source, output),
        Commands::Disasm { image } => disassemble_file(&image),
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {error}");
    std::process::exit(1);
}

fn load_config(path: Option<&str>) -> MachineConfig {
    match path {
        Some(path) => MachineConfig::load(path).unwrap_or_else(|e| fail("Bad configuration", e)),
        None => MachineConfig::default(),
    }
}

/// Build storage from a saved image or an assembler source file.
fn load_program(path: &str, config: &MachineConfig) -> Storage {
    if Path::new(path).extension().is_some_and(|ext| ext == "json") {
        let image = load_image(path).unwrap_or_else(|e| fail("Failed to load image", e));
        println!("Loaded image {path}");
        return Storage::from_image(&image, config).unwrap_or_else(|e| fail("Failed to restore image", e));
    }

    let source = std::fs::read_to_string(path).unwrap_or_else(|e| fail("Failed to read file", e));
    let mut storage = Storage::with_config(config);
    let words = assemble(&source, &mut storage).unwrap_or_else(|e| fail("Assembly error", e));
    println!("Assembled {words} words from {path}");
    storage
}

fn run_program(
    path: &str,
    config_path: Option<&str>,
    max_steps: Option<u64>,
    interrupts: &[String],
    save: Option<&str>,
) {
    let config = load_config(config_path);
    let storage = load_program(path, &config);
    let mut cpu = RunLoop::with_policy(storage, config.illegal_instruction);

    for level in interrupts {
        let level = u16::from_str_radix(level, 8).unwrap_or_else(|e| fail("Bad interrupt level", e));
        cpu.storage()
            .request_interrupt(level)
            .unwrap_or_else(|e| fail("Bad interrupt level", e));
    }

    cpu.storage().start();
    let result = match max_steps {
        Some(max) => cpu.run_limited(max),
        None => cpu.run(),
    };
    let steps = result.unwrap_or_else(|e| fail("CPU error", e));

    let storage = cpu.storage();
    println!();
    println!("Steps:   {steps}");
    println!("State:   {}", if storage.run_stop_status() { "running" } else { "stopped" });
    println!("A:       {}", storage.accumulator());
    println!("P:       {}", storage.get_program_counter());
    println!("S:       {}", storage.next_address());
    println!("BER:     {}", storage.buffer_entrance());
    println!("BXR:     {}", storage.buffer_exit());
    println!("Banks:   {}", storage.bank_controls());
    println!("Error:   {}", storage.err_status());
    println!("Lock:    {:?}", storage.interrupt_lock());

    if let Some(step) = cpu.last_step() {
        if let Some(instr) = step.instruction {
            println!("Last:    {} {}  {}", step.address, step.word, instr);
        }
    }
    if storage.run_stop_status() {
        println!();
        println!("Reached the step limit. Use --max-steps to increase it.");
    }

    if let Some(out) = save {
        save_image(out, &storage.snapshot()).unwrap_or_else(|e| fail("Failed to save image", e));
        println!("Saved to {out}");
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| {
        Path::new(source_path)
            .with_extension("json")
            .to_string_lossy()
            .into_owned()
    });
    println!("Assembling: {source_path} -> {out_path}");

    let source = std::fs::read_to_string(source_path).unwrap_or_else(|e| fail("Failed to read file", e));
    let mut storage = Storage::new();
    let words = assemble(&source, &mut storage).unwrap_or_else(|e| fail("Assembly error", e));
    println!("Assembled {words} words");

    save_image(&out_path, &storage.snapshot()).unwrap_or_else(|e| fail("Failed to save image", e));
    println!("Saved to {out_path}");
}

fn disassemble_file(path: &str) {
    let image = load_image(path).unwrap_or_else(|e| fail("Failed to load image", e));
    print!("{}", disassemble(&image.memory));
}
