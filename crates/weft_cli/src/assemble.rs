//! `weft assemble`: FASM feature list to frame data.

use std::fmt::Write;
use std::path::Path;

use weft_bitstream::{assemble, compile_fabric, parse_fasm, CompiledFabric, ConfigImage};
use weft_common::TileCoord;
use weft_diagnostics::DiagnosticSink;

use crate::pipeline::{self, load_session, located, read_file, CliResult};
use crate::{GlobalArgs, ReportFormat};

/// Runs the `weft assemble` command, printing each configured tile's frames.
pub fn run(fasm: &Path, global: &GlobalArgs) -> CliResult<i32> {
    let session = load_session(global)?;
    let sink = DiagnosticSink::new();
    let fabric = session.build_fabric(&sink)?;
    let config_mems = session.load_config_mems()?;
    let compiled = match compile_fabric(&fabric, &config_mems, &sink) {
        Ok(compiled) => compiled,
        Err(_) => {
            pipeline::render_diagnostics(&sink.sorted(), global, ReportFormat::Text);
            return Ok(1);
        }
    };
    let features = parse_fasm(&read_file(fasm)?).map_err(|e| located(fasm, e))?;
    let images = assemble(&features, &compiled).map_err(|e| located(fasm, e))?;
    print!("{}", render_frames(&compiled, images.iter()));
    let errors = pipeline::render_diagnostics(&sink.sorted(), global, ReportFormat::Text);
    Ok(i32::from(errors > 0))
}

/// One block per location: `X{x}Y{y} <type>`, then `frame{k} <bits>` with
/// data line `F-1` first.
fn render_frames<'a>(
    compiled: &CompiledFabric,
    images: impl Iterator<Item = (&'a TileCoord, &'a ConfigImage)>,
) -> String {
    let mut out = String::new();
    for (coord, image) in images {
        let name = compiled.locations.get(coord).map_or("NULL", String::as_str);
        let _ = writeln!(out, "{coord} {name}");
        for frame in 0..image.frame_count {
            let _ = writeln!(out, "  frame{frame} {}", image.frame_string(frame));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{global, project};
    use std::collections::BTreeMap;
    use std::fs;

    #[test]
    fn frames_follow_enabled_features() {
        let tmp = project();
        let session = load_session(&global(tmp.path())).unwrap();
        let sink = DiagnosticSink::new();
        let fabric = session.build_fabric(&sink).unwrap();
        let compiled = compile_fabric(&fabric, &BTreeMap::new(), &sink).unwrap();

        // E1BEG0 select is logical bit 2, on data line 3 of frame 0
        let features = parse_fasm("X1Y0.E1BEG0.LA_O\n").unwrap();
        let images = assemble(&features, &compiled).unwrap();
        let text = render_frames(&compiled, images.iter());
        assert_eq!(text, "X1Y0 LUT\n  frame0 1000\n  frame1 0000\n");
    }

    #[test]
    fn unknown_feature_fails() {
        let tmp = project();
        let fasm = tmp.path().join("design.fasm");
        fs::write(&fasm, "X0Y0.NOT_A_FEATURE\n").unwrap();
        let err = run(&fasm, &global(tmp.path())).unwrap_err();
        let diag = pipeline::error_diagnostic(err.as_ref()).unwrap();
        assert_eq!(diag.code.to_string(), "F201");
    }
}
