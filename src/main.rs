use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pico_asm::asm::assemble;
use pico_asm::asm::encoding::{DebugTable, VhdlBin, VhdlHex, WordFormat};
use pico_asm::err::report;
use pico_asm::isa::Catalog;
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Assembly source file
    #[arg(short, long, default_value = "in.txt")]
    input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "out.txt")]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Debug)]
    format: Format,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Format {
    /// Annotated bit table
    #[default]
    Debug,
    /// VHDL aggregate of binary literals
    #[value(name = "vhdlbin")]
    VhdlBin,
    /// VHDL aggregate of hex literals
    #[value(name = "vhdlhex")]
    VhdlHex,
}
impl Format {
    fn formatter(self) -> &'static dyn WordFormat {
        match self {
            Format::Debug   => &DebugTable,
            Format::VhdlBin => &VhdlBin,
            Format::VhdlHex => &VhdlHex,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = main_real(args) {
        tracing::error!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main_real(args: Args) -> Result<(), Box<dyn Error>> {
    let src = fs::read_to_string(&args.input)
        .map_err(|e| format!("cant read {}: {e}", args.input.display()))?;
    tracing::info!("read {} bytes from {}", src.len(), args.input.display());

    let catalog = Catalog::standard();
    tracing::debug!("loaded {} instructions", catalog.len());

    let program = match assemble(&src, &catalog) {
        Ok(program) => program,
        Err(e) => {
            eprint!("{}", report(&e, &src));
            return Err(format!("{} failed, no output written", e.stage()).into());
        }
    };
    tracing::info!("assembled {} words, {} labels", program.len(), program.symbol_table().len());

    let out = args.format.formatter().render(program.words())?;
    fs::write(&args.output, out)
        .map_err(|e| format!("cant write {}: {e}", args.output.display()))?;
    tracing::info!("wrote {:?} output to {}", args.format, args.output.display());

    Ok(())
}
