use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flats_core::{compile, Action};

#[derive(Parser, Debug)]
#[command(version, about = "Schema compiler for flats message formats", long_about = None)]
struct Cli {
    /// What to emit
    #[arg(value_enum)]
    action: CliAction,

    /// Schema file; standard input when omitted
    input: Option<PathBuf>,

    /// Output file; standard output when omitted
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "snake_case")]
enum CliAction {
    /// Dump parse tree, object maps, direct accessors, and views
    Debug,
    /// Emit struct layouts and direct-accessor facades
    Direct,
    /// Like direct, with packed (unpadded) layout
    Packed,
    /// Emit view accessors only
    View,
    /// Like view, with packed layout
    PackedView,
    /// Print the object maps alone
    ObjMap,
}

impl From<CliAction> for Action {
    fn from(a: CliAction) -> Action {
        match a {
            CliAction::Debug => Action::Debug,
            CliAction::Direct => Action::Direct,
            CliAction::Packed => Action::Packed,
            CliAction::View => Action::View,
            CliAction::PackedView => Action::PackedView,
            CliAction::ObjMap => Action::ObjMap,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let generated = compile(&source, cli.action.into())?;

    match &cli.output {
        Some(path) => write_output(path, generated.as_bytes())?,
        None => io::stdout().write_all(generated.as_bytes())?,
    }
    Ok(())
}

fn write_output(path: &PathBuf, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
