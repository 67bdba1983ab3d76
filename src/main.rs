use std::path::PathBuf;

use clap::Parser;
use intcode::decode::disassemble;
use intcode::program::load_program;
use intcode::{Machine, MachineConfig};

#[derive(Parser)]
#[command(name = "intcode", about = "Run an Intcode program in batch mode")]
struct Cli {
    /// File holding the comma-separated program.
    program: PathBuf,

    /// Integer inputs, queued in order before execution starts.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    input: Vec<i64>,

    /// Text lines queued as character input after the integer inputs.
    /// Implies --text.
    #[arg(long)]
    ascii: Vec<String>,

    /// Render output as text (values above 127 are printed as numbers).
    #[arg(long)]
    text: bool,

    /// Abort after this many executed instructions.
    #[arg(long)]
    step_limit: Option<u64>,

    /// Print a static disassembly instead of running.
    #[arg(long)]
    disassemble: bool,

    /// Print the final memory contents to stderr after halting.
    #[arg(long)]
    dump_memory: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let program = match load_program(&cli.program) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}: {e}", cli.program.display());
            std::process::exit(1);
        }
    };

    if cli.disassemble {
        print!("{}", disassemble(&program));
        return;
    }

    let config = MachineConfig {
        step_limit: cli.step_limit,
    };
    let mut machine = Machine::with_config(program, config);
    machine.extend_input(cli.input.iter().copied());
    for line in &cli.ascii {
        machine.push_line(line);
    }

    let result = if cli.text || !cli.ascii.is_empty() {
        print_text(&mut machine)
    } else {
        print_values(&mut machine)
    };

    if cli.dump_memory {
        eprint!("{}", machine.memory());
    }
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    log::info!("executed {} instructions", machine.steps());
}

/// Print each output value as soon as the machine produces it.
fn print_values(machine: &mut Machine) -> intcode::error::Result<()> {
    for value in machine.outputs() {
        println!("{}", value?);
    }
    Ok(())
}

/// Print each chunk of character output as soon as it is complete.
fn print_text(machine: &mut Machine) -> intcode::error::Result<()> {
    while let Some(chunk) = machine.read_line()? {
        print!("{chunk}");
    }
    Ok(())
}
