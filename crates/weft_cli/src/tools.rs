//! Input preparation commands: ConfigMem tables and switch-matrix files.

use std::path::Path;

use weft_arch::{list, AdjacencyMatrix};
use weft_bitstream::{allocate, ConfigMem};
use weft_diagnostics::DiagnosticSink;

use crate::pipeline::{self, load_session, located, read_file, CliResult};
use crate::{GlobalArgs, ReportFormat};

/// Tile name for a standalone matrix file: the file stem up to `_switch_matrix`.
fn tile_name(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("tile");
    stem.strip_suffix("_switch_matrix").unwrap_or(stem).to_string()
}

fn finish(sink: &DiagnosticSink, global: &GlobalArgs) -> i32 {
    let errors = pipeline::render_diagnostics(&sink.sorted(), global, ReportFormat::Text);
    i32::from(errors > 0)
}

fn load_matrix(path: &Path, sink: &DiagnosticSink) -> CliResult<AdjacencyMatrix> {
    let text = read_file(path)?;
    AdjacencyMatrix::parse_csv(&text, &tile_name(path), sink)
        .map_err(|e| located(path, e))
}

/// `weft config-mem-init <tile>`: prints the default ConfigMem table.
pub fn config_mem_init(tile: &str, global: &GlobalArgs) -> CliResult<i32> {
    let session = load_session(global)?;
    let spec = session.tile_spec(tile)?;
    let sink = DiagnosticSink::new();
    let mut built = session.bare_tile(spec)?;
    if let Some(fan_in) = session.load_fan_in(spec, &sink)? {
        built.fan_in = fan_in;
    }
    let config = session.file.fabric.config;
    let alloc = allocate(&built, &config, &sink);
    let mem = ConfigMem::default_policy(tile, alloc.global_config_bits, &config)?;
    print!("{}", mem.to_csv());
    Ok(finish(&sink, global))
}

/// `weft matrix-info <csv>`: per-destination fan-in and per-source fan-out.
pub fn matrix_info(csv: &Path, global: &GlobalArgs) -> CliResult<i32> {
    let sink = DiagnosticSink::new();
    let matrix = load_matrix(csv, &sink)?;
    print!("{}", matrix.info());
    Ok(finish(&sink, global))
}

/// `weft csv2list <in> <out>`: exports every connection as a list line.
pub fn csv2list(input: &Path, output: &Path, global: &GlobalArgs) -> CliResult<i32> {
    let sink = DiagnosticSink::new();
    let matrix = load_matrix(input, &sink)?;
    pipeline::write_file(output, &matrix.to_list())?;
    Ok(finish(&sink, global))
}

/// `weft list2csv <list> <csv>`: merges list connections into an existing table.
pub fn list2csv(list_path: &Path, csv: &Path, global: &GlobalArgs) -> CliResult<i32> {
    let sink = DiagnosticSink::new();
    let mut matrix = load_matrix(csv, &sink)?;
    let pairs = list::parse_list(&read_file(list_path)?)
        .map_err(|e| located(list_path, e))?;
    matrix.merge_pairs(&pairs, &sink)?;
    pipeline::write_file(csv, &matrix.to_csv())?;
    if !global.quiet {
        eprintln!("   Merged {} connection(s) into {}", pairs.len(), csv.display());
    }
    Ok(finish(&sink, global))
}

/// `weft bootstrap <tile> <out>`: writes an all-zero table with the tile's
/// switch-matrix ports.
pub fn bootstrap(tile: &str, output: &Path, global: &GlobalArgs) -> CliResult<i32> {
    let session = load_session(global)?;
    let spec = session.tile_spec(tile)?;
    let matrix = session.bare_tile(spec)?.bootstrap_matrix();
    pipeline::write_file(output, &matrix.to_csv())?;
    Ok(0)
}
