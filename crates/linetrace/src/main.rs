use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};
use linetrace_core::dwarf::{LineUnit, LineUnits};
use linetrace_core::elf::DebugSection;
use linetrace_core::types::Address;
use linetrace_core::{locate, resolve, ImageDescriptor, Symbolizer};
use linetrace_utils::{debug, init_logging, LogFormat, LogLevel, LoggingConfig};

/// Resolve kernel instruction addresses to source lines using an image's DWARF line tables.
#[derive(Parser, Debug)]
#[command(name = "linetrace")]
#[command(version)]
#[command(about = "Resolve instruction addresses to source file and line from ELF/DWARF images", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format: pretty or json (overrides LINETRACE_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print `file:line` for each address, or `??:0` when it cannot be resolved
    Resolve
    {
        /// Path to the ELF image
        image: PathBuf,
        /// Addresses to resolve (hex format: 0x1000 or decimal)
        #[arg(required = true)]
        addresses: Vec<Address>,
    },
    /// Print the enclosing function and source line for each address
    Symbolize
    {
        /// Path to the ELF image
        image: PathBuf,
        /// Backtrace addresses, innermost first
        #[arg(required = true)]
        addresses: Vec<Address>,
    },
    /// List the located symbol tables and debug sections
    Sections
    {
        /// Path to the ELF image
        image: PathBuf,
    },
    /// Summarize every unit of the `.debug_line` section
    Units
    {
        /// Path to the ELF image
        image: PathBuf,
    },
}

fn main()
{
    let cli = Cli::parse();

    let config = LoggingConfig::from_env()
        .with_level(cli.log_level)
        .with_format(cli.log_format);
    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Commands) -> Result<(), Box<dyn std::error::Error>>
{
    match command {
        Commands::Resolve { image, addresses } => {
            let bytes = load_image(&image)?;
            let descriptor = locate(&bytes)?;
            for address in addresses {
                println!("{}", resolve(&descriptor, address));
            }
        }
        Commands::Symbolize { image, addresses } => {
            let bytes = load_image(&image)?;
            let descriptor = locate(&bytes)?;
            for frame in Symbolizer::new(&descriptor).symbolicate_trace(&addresses) {
                println!("{frame}");
            }
        }
        Commands::Sections { image } => {
            let bytes = load_image(&image)?;
            print_sections(&locate(&bytes)?);
        }
        Commands::Units { image } => {
            let bytes = load_image(&image)?;
            print_units(&locate(&bytes)?);
        }
    }
    Ok(())
}

fn load_image(path: &Path) -> Result<Vec<u8>, linetrace_core::LinetraceError>
{
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), size = bytes.len(), "loaded image");
    Ok(bytes)
}

fn print_sections(descriptor: &ImageDescriptor<'_>)
{
    let header = descriptor.header();
    println!("Image:");
    println!("  Architecture: {}", header.architecture());
    println!("  Entry Point: {:#x}", descriptor.entry_point());
    println!("  Sections: {}", descriptor.sections().len());
    println!("  Program Headers: {}", descriptor.program_headers().count());

    let symtab = descriptor.symtab();
    println!("\nTables:");
    println!("  .symtab: section {} ({} symbols)", symtab.index, descriptor.symbols().count());
    let strtab = descriptor.strtab_range();
    println!("  .strtab: {:#x} ({} bytes)", strtab.offset, strtab.size);
    let shstrtab = descriptor.shstrtab_range();
    println!("  .shstrtab: {:#x} ({} bytes)", shstrtab.offset, shstrtab.size);

    println!("\nDebug Sections:");
    for kind in DebugSection::ALL {
        match descriptor.debug_section(kind) {
            Some(range) => println!("  {kind}: {:#x} ({} bytes)", range.offset, range.size),
            None => println!("  {kind}: not present"),
        }
    }
}

fn print_units(descriptor: &ImageDescriptor<'_>)
{
    let Some(debug_line) = descriptor.debug_line() else {
        println!("No .debug_line section");
        return;
    };

    let mut units = LineUnits::new(debug_line);
    for unit in &mut units {
        match unit {
            LineUnit::Program(header) => {
                println!(
                    "{:#010x}: version {}, {} directories, {} files, {} rows",
                    header.offset,
                    header.version,
                    header.include_directories.len() - 1,
                    header.file_names.len() - 1,
                    header.rows().count()
                );
            }
            LineUnit::Skipped { offset, reason } => println!("{offset:#010x}: skipped ({reason:?})"),
        }
    }
    if let Some(stop) = units.stop_reason() {
        println!("Scan stopped early: {stop:?}");
    }
}
