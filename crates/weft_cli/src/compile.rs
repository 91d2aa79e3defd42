//! `weft compile`: fabric description to bitstream specification.
//!
//! 1. Load and validate `fabric.toml`
//! 2. Read every tile's switch matrix and any ConfigMem tables on disk
//! 3. Compile all tile types in the grid
//! 4. Write `bitstream_spec.json`, `bitstream_spec.csv` and generated
//!    ConfigMem tables
//! 5. Render diagnostics

use std::path::Path;

use weft_arch::RoutingGraph;
use weft_bitstream::{compile_fabric, BitstreamSpec, CompiledFabric};
use weft_diagnostics::DiagnosticSink;

use crate::pipeline::{self, load_session, CliResult, Session};
use crate::{CompileArgs, GlobalArgs, ReportFormat};

/// Runs the `weft compile` command. Returns exit code 1 if any error was reported.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> CliResult<i32> {
    let session = load_session(global)?;
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Compiling {}", session.file.fabric.name);
    }

    let sink = DiagnosticSink::new();
    let fabric = session.build_fabric(&sink)?;
    let config_mems = session.load_config_mems()?;
    let compiled = match compile_fabric(&fabric, &config_mems, &sink) {
        Ok(compiled) => Some(compiled),
        Err(_) => None,
    };

    let output = args.output.clone().unwrap_or_else(|| session.dir.clone());
    if let Some(compiled) = &compiled {
        write_outputs(&session, compiled, &output)?;
        if args.routing_graph {
            let graph = RoutingGraph::build(&fabric, &sink);
            pipeline::write_file(
                &output.join("routing_graph.json"),
                &serde_json::to_string_pretty(&graph)?,
            )?;
        }
        if global.verbose {
            for tile in compiled.tiles.values() {
                let frames = tile
                    .config_mem
                    .as_ref()
                    .map(|m| m.entries.iter().filter(|e| e.bits_used > 0).count())
                    .unwrap_or(0);
                eprintln!(
                    "   {}: {} configuration bits in {frames} frame(s), {} features",
                    tile.tile,
                    tile.allocation.global_config_bits,
                    tile.features.len()
                );
            }
        }
    }

    let errors = pipeline::render_diagnostics(&sink.sorted(), global, args.format);
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            errors,
            sink.warning_count()
        );
    }
    match compiled {
        Some(_) if errors == 0 => Ok(0),
        _ => Ok(1),
    }
}

/// Writes the bitstream specification and any ConfigMem tables that were generated
/// because none existed on disk.
fn write_outputs(session: &Session, compiled: &CompiledFabric, output: &Path) -> CliResult<()> {
    let spec = BitstreamSpec::from_compiled(compiled);
    pipeline::write_file(&output.join("bitstream_spec.json"), &spec.to_json()?)?;
    pipeline::write_file(&output.join("bitstream_spec.csv"), &spec.to_csv())?;

    for tile in compiled.tiles.values() {
        let Some(mem) = tile.config_mem.as_ref().filter(|_| tile.generated_config_mem) else {
            continue;
        };
        if tile.allocation.global_config_bits == 0 {
            continue;
        }
        if let Some(path) = session.default_config_mem_path(&tile.tile) {
            pipeline::write_file(path, &mem.to_csv())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{global, project};
    use std::fs;

    fn args(output: &Path) -> CompileArgs {
        CompileArgs {
            output: Some(output.to_path_buf()),
            routing_graph: true,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn compile_writes_spec_and_config_mem() {
        let tmp = project();
        let out = tmp.path().join("out");
        assert_eq!(run(&args(&out), &global(tmp.path())).unwrap(), 0);

        let json = fs::read_to_string(out.join("bitstream_spec.json")).unwrap();
        let spec = BitstreamSpec::from_json(&json).unwrap();
        assert_eq!(spec.tile_map.len(), 2);
        assert_eq!(spec.arch_specs.frame_bits_per_row, 4);
        assert!(spec.tile_specs["X0Y0"].contains_key("E1BEG0.LA_O"));

        let csv = fs::read_to_string(out.join("bitstream_spec.csv")).unwrap();
        assert_eq!(csv.lines().next(), Some("X0Y0"));
        assert!(out.join("routing_graph.json").is_file());

        let mem = fs::read_to_string(tmp.path().join("LUT_ConfigMem.init.csv")).unwrap();
        assert!(mem.starts_with("frame_name,frame_index"));
        assert!(mem.contains("frame0,0,3,1110,2:0"));
    }

    #[test]
    fn existing_config_mem_is_used_and_kept() {
        let tmp = project();
        let table = "frame0,0,3,0111,0:2\nframe1,1,0,0000,# NULL\n";
        fs::write(tmp.path().join("LUT_ConfigMem.init.csv"), table).unwrap();
        let out = tmp.path().join("out");
        assert_eq!(run(&args(&out), &global(tmp.path())).unwrap(), 0);

        let spec = BitstreamSpec::from_json(&fs::read_to_string(out.join("bitstream_spec.json")).unwrap())
            .unwrap();
        assert_eq!(spec.frame_map["LUT"][&0], "0111");
        assert_eq!(spec.frame_map_encode["LUT"][&0], 2);
        assert_eq!(fs::read_to_string(tmp.path().join("LUT_ConfigMem.init.csv")).unwrap(), table);
    }

    #[test]
    fn inconsistent_config_mem_fails() {
        let tmp = project();
        fs::write(tmp.path().join("LUT_ConfigMem.init.csv"), "frame0,0,3,1110,2:0\n").unwrap();
        let out = tmp.path().join("out");
        assert_eq!(run(&args(&out), &global(tmp.path())).unwrap(), 1);
        assert!(!out.join("bitstream_spec.json").exists());
    }
}
