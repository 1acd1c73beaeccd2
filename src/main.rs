use std::{
    error::Error,
    fmt::Write as _,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand, ValueEnum};
use tool6502::{
    assembler::{symbol_table::SymbolTable, Assembler, AssemblerConfig},
    disassembler::{formatter::hex_dump, Disassembler, DisassemblyOptions},
    session::{self, RunConfig, StopReason, TraceRecord},
    verifier::{compare, Comparison},
    MemoryMap, ObjectCode, SimulatorConfig, CPU,
};
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, global = true, default_value_t = Level::WARN)]
    log_level: Level,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a source file into Intel HEX (and optionally raw binary)
    Asm {
        /// Assembly source file
        input: PathBuf,

        /// Intel HEX output (default: input with a .hex extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a raw binary covering the used address range
        #[arg(short, long)]
        binary: Option<PathBuf>,

        /// Write a listing file
        #[arg(long)]
        listing: Option<PathBuf>,

        /// Write a symbol file
        #[arg(long)]
        symbols: Option<PathBuf>,

        /// Assembler debug level (0 = quiet)
        #[arg(long, default_value_t = 0)]
        debug: u8,

        /// Maximum nesting of source-producing macros
        #[arg(long, default_value_t = 8)]
        max_macro_depth: usize,
    },

    /// Disassemble a raw binary
    Dis {
        /// Binary input file
        input: PathBuf,

        /// Load address of the first disassembled byte
        #[arg(short, long, default_value = "0", value_parser = parse_address)]
        start: u16,

        /// Skip this many bytes of the file
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Number of bytes to disassemble (default: rest of file)
        #[arg(short = 'n', long)]
        length: Option<usize>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Asm)]
        format: Format,

        /// Symbol file used to name operands
        #[arg(long)]
        symbols: Option<PathBuf>,

        /// Emit source that reassembles to identical bytes
        #[arg(short, long)]
        reassemblable: bool,

        /// Prefix each line with its address and bytes
        #[arg(long)]
        show_bytes: bool,
    },

    /// Run a program in the simulator
    Sim {
        /// Assembly source (.asm/.s) or raw binary
        input: PathBuf,

        /// Load address for raw binaries
        #[arg(long, default_value = "$0200", value_parser = parse_address)]
        load: u16,

        /// Start address (default: first assembled byte or the load address)
        #[arg(long, value_parser = parse_address)]
        start: Option<u16>,

        #[arg(long, default_value_t = 10_000)]
        max_steps: u64,

        /// Print one line per executed instruction
        #[arg(long)]
        trace: bool,

        /// Execute BRK instead of stopping before it
        #[arg(long)]
        no_stop_on_brk: bool,

        /// Keep running when PC stops moving
        #[arg(long)]
        no_stall_detect: bool,
    },

    /// Compare two binaries byte for byte
    Verify {
        original: PathBuf,
        candidate: PathBuf,

        /// Address of the first byte, used in reports
        #[arg(long, default_value = "0", value_parser = parse_address)]
        base: u16,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Asm,
    Hex,
    Both,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    match main_real(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn main_real(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    match args.command {
        Command::Asm {
            input,
            output,
            binary,
            listing,
            symbols,
            debug,
            max_macro_depth,
        } => {
            let config = AssemblerConfig {
                debug_level: debug,
                max_macro_depth,
            };
            let object = assemble_file(&input, config, listing.as_deref(), symbols.as_deref())?;

            let output = output.unwrap_or_else(|| input.with_extension("hex"));
            fs::write(&output, object.to_intel_hex())
                .map_err(|e| format!("cant write {}: {e}", output.display()))?;

            if let Some(path) = binary {
                fs::write(&path, object.to_binary(0))
                    .map_err(|e| format!("cant write {}: {e}", path.display()))?;
            }

            if let Some(range) = object.assigned_range() {
                println!(
                    "Assembled {} bytes (${:04X}-${:04X}) to {}",
                    object.assigned_count(),
                    range.start(),
                    range.end(),
                    output.display()
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Dis {
            input,
            start,
            offset,
            length,
            output,
            format,
            symbols,
            reassemblable,
            show_bytes,
        } => {
            let data = read_file(&input)?;
            let bytes = data
                .get(offset..)
                .ok_or_else(|| format!("offset {offset} is past the end of the file"))?;
            let length = length
                .unwrap_or(bytes.len())
                .min(bytes.len())
                .min(0x10000 - start as usize);
            let bytes = &bytes[..length];

            let table = match symbols {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .map_err(|e| format!("cant open {}: {e}", path.display()))?;
                    Some(SymbolTable::parse_symbol_file(&text)?)
                }
                None => None,
            };

            if !bytes.is_empty() {
                eprintln!(
                    "Disassembling {} bytes (address range: ${:04X}-${:04X})",
                    length,
                    start,
                    start as usize + length - 1
                );
            }

            let image = ObjectCode::from_bytes(start, bytes);
            let options = DisassemblyOptions {
                start_address: start,
                reassemblable,
                show_bytes,
            };
            let mut dis = Disassembler::new(&image, options);
            if let Some(table) = &table {
                dis = dis.with_symbols(table);
            }

            let listing = if reassemblable {
                dis.render_source(start, length)
            } else {
                dis.disassemble_region(start, length)
                    .fold(String::new(), |mut out, line| {
                        let _ = writeln!(out, "{}", line.render(show_bytes));
                        out
                    })
            };

            let text = match format {
                Format::Asm => listing,
                Format::Hex => hex_dump(bytes, start),
                Format::Both => format!("{listing}\n=== HEX DUMP ===\n{}", hex_dump(bytes, start)),
            };

            match output {
                Some(path) => fs::write(&path, text)
                    .map_err(|e| format!("cant write {}: {e}", path.display()))?,
                None => io::stdout().write_all(text.as_bytes())?,
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Sim {
            input,
            load,
            start,
            max_steps,
            trace,
            no_stop_on_brk,
            no_stall_detect,
        } => {
            let mut memory = MemoryMap::new();
            let entry = if is_source(&input) {
                let object = assemble_file(&input, AssemblerConfig::default(), None, None)?;
                memory.load_object_code(&object);
                start.or_else(|| object.assigned_range().map(|r| *r.start()))
            } else {
                memory.load(load, &read_file(&input)?);
                start.or(Some(load))
            };
            memory.set_reset_vector(entry.unwrap_or(load));

            let mut cpu = CPU::with_config(memory, SimulatorConfig { trace });
            let config = RunConfig {
                max_steps,
                stop_on_brk: !no_stop_on_brk,
                detect_stalls: !no_stall_detect,
            };

            if trace {
                println!("{}", TraceRecord::HEADER);
            }
            let outcome = session::run(&mut cpu, &config, |record| {
                if trace {
                    println!("{}\t{}", record, record.mnemonic().unwrap_or("???"));
                }
            });

            println!("Executed {} instructions ({} cycles)", outcome.steps, cpu.cycles());
            println!(
                "PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} SP=${:02X}",
                cpu.pc(),
                cpu.a(),
                cpu.x(),
                cpu.y(),
                cpu.sp()
            );
            println!("Flags: NV-BDIZC");
            println!("       {:08b}", cpu.status());

            match outcome.stop_reason {
                StopReason::Error(e) => Err(e.into()),
                StopReason::StepLimit => {
                    println!("Stopped: step limit reached");
                    Ok(ExitCode::SUCCESS)
                }
                StopReason::Break { pc } => {
                    println!("Stopped: BRK at ${pc:04X}");
                    Ok(ExitCode::SUCCESS)
                }
                StopReason::Stall { pc } => {
                    println!("Stopped: possible infinite loop at ${pc:04X}");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }

        Command::Verify {
            original,
            candidate,
            base,
        } => {
            let original = read_file(&original)?;
            let candidate = read_file(&candidate)?;

            match compare(&original, &candidate, base) {
                Comparison::Identical => {
                    println!("Identical ({} bytes)", original.len());
                    Ok(ExitCode::SUCCESS)
                }
                Comparison::Mismatch(report) => {
                    print!("Mismatch\n{report}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn assemble_file(
    input: &Path,
    config: AssemblerConfig,
    listing: Option<&Path>,
    symbols: Option<&Path>,
) -> Result<ObjectCode, Box<dyn Error>> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("cant open {}: {e}", input.display()))?;

    let output = Assembler::new(config).assemble(&source).map_err(|errors| {
        for e in &errors {
            tracing::error!("{}:{e}", input.display());
        }
        format!("assembly failed with {} error(s)", errors.len())
    })?;

    if let Some(path) = listing {
        fs::write(path, output.listing_text())
            .map_err(|e| format!("cant write {}: {e}", path.display()))?;
    }
    if let Some(path) = symbols {
        fs::write(path, output.symbol_file())
            .map_err(|e| format!("cant write {}: {e}", path.display()))?;
    }

    Ok(output.object_code)
}

fn read_file(path: &Path) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(fs::read(path).map_err(|e| format!("cant open {}: {e}", path.display()))?)
}

fn is_source(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("asm" | "s" | "a65")
    )
}

/// `$1234`, `0x1234` or decimal.
fn parse_address(text: &str) -> Result<u16, String> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16)
    } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|e| format!("invalid address '{text}': {e}"))
}
