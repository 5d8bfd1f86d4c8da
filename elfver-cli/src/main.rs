use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use elfver_core::{Binary, DEFAULT_SECTION, Section, Versions, WEBENGINE_CORE_LIB, parse_from_path};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Table;
use tabled::settings::Style;

/// Read the QtWebEngine/Chromium version out of a QtWebEngineCore library
#[derive(Parser)]
#[command(
    name = "elfver",
    about = "Find the QtWebEngine and Chromium versions baked into libQt5WebEngineCore",
    version,
    author
)]
struct Cli {
    /// Library file, or a directory containing libQt5WebEngineCore.so
    #[arg(required = true)]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the QtWebEngine and Chromium versions
    Versions {
        /// Section to search for the user agent string
        #[arg(long, default_value = DEFAULT_SECTION)]
        section: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the ELF header
    Header,
    /// List all sections
    Sections {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct VersionsOut<'a> {
    webengine: &'a str,
    chromium: &'a str,
}

impl<'a> From<&'a Versions> for VersionsOut<'a> {
    fn from(v: &'a Versions) -> Self {
        Self {
            webengine: &v.webengine,
            chromium: &v.chromium,
        }
    }
}

#[derive(Serialize, tabled::Tabled)]
struct SectionRow {
    #[tabled(rename = "Idx")]
    index: u16,
    #[tabled(rename = "Section")]
    name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    kind: &'static str,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Flags")]
    flags: String,
}

impl From<&Section> for SectionRow {
    fn from(s: &Section) -> Self {
        Self {
            index: s.index,
            name: s.name.clone(),
            kind: s.header.type_name(),
            address: format!("{:#x}", s.header.sh_addr),
            offset: format!("{:#x}", s.header.sh_offset),
            size: format!("{:#x}", s.header.sh_size),
            flags: format!("{:#x}", s.header.sh_flags),
        }
    }
}

fn resolve_library(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(WEBENGINE_CORE_LIB)
    } else {
        path.to_path_buf()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = resolve_library(&cli.path);
    log::debug!("Using {}", path.display());

    match cli.command {
        Command::Versions { section, json } => {
            if !path.exists() {
                eprintln!("{} {} does not exist", "error:".red().bold(), path.display());
                std::process::exit(1);
            }

            match parse_from_path(&path, &section) {
                Ok(v) if json => {
                    println!("{}", serde_json::to_string_pretty(&VersionsOut::from(&v))?);
                }
                Ok(v) => {
                    println!("{:<12} {}", "QtWebEngine".bold(), v.webengine.green());
                    println!("{:<12} {}", "Chromium".bold(), v.chromium.green());
                }
                Err(e) => {
                    eprintln!(
                        "{} could not determine versions from {}: {e}",
                        "warning:".yellow().bold(),
                        path.display()
                    );
                    std::process::exit(1);
                }
            }
        }

        Command::Header => {
            let bin = Binary::open(&path)?;
            let h = &bin.header;
            println!("{:<14} {}", "File".bold(), bin.path);
            println!(
                "{:<14} ELF{}",
                "Class".bold(),
                if bin.ident.class.is_64() { 64 } else { 32 }
            );
            println!("{:<14} {}", "OS/ABI".bold(), bin.ident.os_abi);
            println!("{:<14} {}", "Type".bold(), h.type_name());
            println!("{:<14} {}", "Machine".bold(), h.e_machine);
            println!("{:<14} 0x{:x}", "Entry point".bold(), h.entry_point());
            println!(
                "{:<14} {} x {} bytes at 0x{:x}",
                "Sections".bold(),
                h.e_shnum,
                h.e_shentsize,
                h.e_shoff
            );
            println!("{:<14} {}", "String table".bold(), h.e_shstrndx);
        }

        Command::Sections { json } => {
            let bin = Binary::open(&path)?;
            let rows: Vec<SectionRow> = bin.sections.iter().map(SectionRow::from).collect();
            if json {
                let out = serde_json::to_string_pretty(&rows)
                    .context("Failed to serialize section list")?;
                println!("{out}");
            } else if rows.is_empty() {
                println!("No sections found (possibly stripped binary).");
            } else {
                println!("{}", Table::new(&rows).with(Style::rounded()));
            }
        }
    }

    Ok(())
}
