//! weft: the command-line driver for the fabric architecture compiler.
//!
//! `weft compile` turns a fabric description into its bitstream
//! specification. The remaining commands are tools for preparing inputs:
//! generating ConfigMem tables, inspecting and converting switch-matrix
//! files, and assembling FASM feature lists into frames.

#![warn(missing_docs)]

mod assemble;
mod compile;
mod pipeline;
mod tools;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// weft: compile reconfigurable fabric descriptions into configuration bit maps.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Fabric architecture compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print per-tile details.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to the fabric description, or a directory containing `fabric.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the fabric and write its bitstream specification.
    Compile(CompileArgs),
    /// Print the default ConfigMem table for a tile type.
    ConfigMemInit {
        /// Tile type name.
        tile: String,
    },
    /// Summarize a switch-matrix CSV file.
    MatrixInfo {
        /// The adjacency table.
        csv: PathBuf,
    },
    /// Convert a switch-matrix CSV file to list form.
    Csv2list {
        /// The adjacency table to read.
        input: PathBuf,
        /// The list file to write.
        output: PathBuf,
    },
    /// Merge a list file into an existing switch-matrix CSV file.
    List2csv {
        /// The list file to read.
        list: PathBuf,
        /// The adjacency table to update in place.
        csv: PathBuf,
    },
    /// Write an empty switch-matrix CSV file for a tile type.
    Bootstrap {
        /// Tile type name.
        tile: String,
        /// The adjacency table to write.
        output: PathBuf,
    },
    /// Assemble a FASM feature list into per-tile frames.
    Assemble {
        /// The FASM file to read.
        fasm: PathBuf,
    },
}

/// Arguments for the `weft compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Output directory. Defaults to the fabric description's directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the routing graph as `routing_graph.json`.
    #[arg(long)]
    pub routing_graph: bool,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per diagnostic.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print per-tile details.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to the fabric description.
    pub config: Option<PathBuf>,
}

/// Runs a parsed command line and returns the process exit code.
pub fn run(cli: Cli) -> i32 {
    let color = match cli.color {
        ColorChoice::Auto => is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global),
        Command::ConfigMemInit { ref tile } => tools::config_mem_init(tile, &global),
        Command::MatrixInfo { ref csv } => tools::matrix_info(csv, &global),
        Command::Csv2list { ref input, ref output } => tools::csv2list(input, output, &global),
        Command::List2csv { ref list, ref csv } => tools::list2csv(list, csv, &global),
        Command::Bootstrap { ref tile, ref output } => tools::bootstrap(tile, output, &global),
        Command::Assemble { ref fasm } => assemble::run(fasm, &global),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            pipeline::report_error(e.as_ref(), &global);
            1
        }
    }
}

fn main() {
    process::exit(run(Cli::parse()));
}

/// Rough terminal detection: colored output only when `TERM` is set and not `dumb`.
fn is_terminal() -> bool {
    std::env::var("TERM").is_ok_and(|t| t != "dumb")
}
