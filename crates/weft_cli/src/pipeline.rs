//! Shared pipeline helpers for CLI commands.
//!
//! Locates and loads the fabric description, reads each tile's switch
//! matrix and ConfigMem table, and renders diagnostics.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use weft_arch::{list, AdjacencyMatrix, ArchError, Fabric, FanInMap, Tile};
use weft_bitstream::{BitstreamError, ConfigMem};
use weft_config::{ConfigError, FabricFile, TileSources, TileSpec, DEFAULT_FILE_NAME};
use weft_diagnostics::{
    Diagnostic, DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer,
};

use crate::{GlobalArgs, ReportFormat};

/// Result type shared by command implementations.
pub type CliResult<T> = Result<T, Box<dyn Error>>;

/// An error raised while processing a specific input file.
#[derive(Debug)]
pub struct InFile {
    /// The file being processed.
    pub path: PathBuf,
    /// What went wrong.
    pub source: Box<dyn Error>,
}

impl fmt::Display for InFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

impl Error for InFile {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Attaches the file being processed to an error.
pub fn located(path: &Path, source: impl Error + 'static) -> Box<dyn Error> {
    Box::new(InFile {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Reads a whole input file.
pub fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an output file, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write '{}': {e}", path.display()).into())
}

/// Walks up from `start` looking for the nearest `fabric.toml`.
pub fn find_fabric_file(start: &Path) -> CliResult<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(DEFAULT_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {DEFAULT_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the fabric description from `--config`, or searches upward
/// from the current directory.
pub fn resolve_fabric_path(global: &GlobalArgs) -> CliResult<PathBuf> {
    match &global.config {
        Some(p) if p.is_dir() => Ok(p.join(DEFAULT_FILE_NAME)),
        Some(p) => Ok(p.clone()),
        None => find_fabric_file(&std::env::current_dir()?),
    }
}

/// A loaded fabric description and the files it refers to.
pub struct Session {
    /// The description file.
    pub path: PathBuf,
    /// Directory relative paths resolve against.
    pub dir: PathBuf,
    /// The validated description.
    pub file: FabricFile,
    /// Resolved per-tile file paths.
    pub sources: Vec<TileSources>,
}

/// Loads and validates the fabric description selected by `global`.
pub fn load_session(global: &GlobalArgs) -> CliResult<Session> {
    let path = resolve_fabric_path(global)?;
    let text = read_file(&path)?;
    let file = weft_config::load_config_from_str(&text)
        .map_err(|e| located(&path, e))?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let sources = weft_config::resolve_tile_sources(&file, &dir);
    Ok(Session {
        path,
        dir,
        file,
        sources,
    })
}

impl Session {
    /// Looks up a tile type by name.
    pub fn tile_spec(&self, name: &str) -> CliResult<&TileSpec> {
        self.file.tile(name).ok_or_else(|| {
            format!("unknown tile type '{name}' in {}", self.path.display()).into()
        })
    }

    fn sources_of(&self, name: &str) -> Option<&TileSources> {
        self.sources.iter().find(|s| s.tile == name)
    }

    /// The tile with its ports and bels but no switch matrix.
    pub fn bare_tile(&self, spec: &TileSpec) -> Result<Tile, ArchError> {
        Tile::new(
            spec.name.clone(),
            spec.ports.clone(),
            spec.bels.clone(),
            FanInMap::new(),
        )
    }

    /// Loads a tile's switch matrix. `.list` files are merged into the
    /// tile's bootstrap matrix; anything else is read as a CSV table.
    pub fn load_fan_in(&self, spec: &TileSpec, sink: &DiagnosticSink) -> CliResult<Option<FanInMap>> {
        let Some(path) = self.sources_of(&spec.name).and_then(|s| s.matrix.as_deref()) else {
            return Ok(None);
        };
        let text = read_file(path)?;
        let matrix = if path.extension().is_some_and(|e| e == "list") {
            let mut matrix = self.bare_tile(spec)?.bootstrap_matrix();
            list::parse_list(&text)
                .and_then(|pairs| matrix.merge_pairs(&pairs, sink))
                .map_err(|e| located(path, e))?;
            matrix
        } else {
            AdjacencyMatrix::parse_csv(&text, &spec.name, sink)
                .map_err(|e| located(path, e))?
        };
        Ok(Some(matrix.fan_in()))
    }

    /// Loads every switch matrix and assembles the fabric.
    pub fn build_fabric(&self, sink: &DiagnosticSink) -> CliResult<Fabric> {
        let mut fan_ins = BTreeMap::new();
        for spec in &self.file.tiles {
            if let Some(fan_in) = self.load_fan_in(spec, sink)? {
                fan_ins.insert(spec.name.clone(), fan_in);
            }
        }
        Ok(weft_config::assemble_fabric(&self.file, fan_ins)?)
    }

    /// Reads every ConfigMem table that exists on disk.
    pub fn load_config_mems(&self) -> CliResult<BTreeMap<String, ConfigMem>> {
        let mut mems = BTreeMap::new();
        for sources in &self.sources {
            if let Some(path) = sources.existing_config_mem() {
                let text = read_file(path)?;
                let mem = ConfigMem::parse_csv(&text, &sources.tile)
                    .map_err(|e| located(path, e))?;
                mems.insert(sources.tile.clone(), mem);
            }
        }
        Ok(mems)
    }

    /// Where a generated ConfigMem table for `tile` is written.
    pub fn default_config_mem_path(&self, tile: &str) -> Option<&Path> {
        self.sources_of(tile).map(|s| s.default_config_mem.as_path())
    }
}

/// Prints diagnostics to stderr (text) or stdout (JSON). With `--quiet`
/// only errors are shown. Returns the number of errors.
pub fn render_diagnostics(diags: &[Diagnostic], global: &GlobalArgs, format: ReportFormat) -> usize {
    let shown = diags
        .iter()
        .filter(|d| d.severity.shown_when(global.quiet));
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in shown {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            let renderer = JsonRenderer;
            for diag in shown {
                print!("{}", renderer.render(diag));
            }
        }
    }
    diags.iter().filter(|d| d.severity.is_error()).count()
}

/// The diagnostic for a compiler error, if it is one.
pub fn error_diagnostic(e: &(dyn Error + 'static)) -> Option<Diagnostic> {
    if let Some(wrapped) = e.downcast_ref::<InFile>() {
        let mut diag = error_diagnostic(wrapped.source.as_ref())?;
        diag.locus = diag.locus.in_file(wrapped.path.clone());
        return Some(diag);
    }
    if let Some(e) = e.downcast_ref::<ConfigError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = e.downcast_ref::<ArchError>() {
        return Some(e.to_diagnostic());
    }
    e.downcast_ref::<BitstreamError>().map(BitstreamError::to_diagnostic)
}

/// Prints a failed command's error.
pub fn report_error(e: &(dyn Error + 'static), global: &GlobalArgs) {
    match error_diagnostic(e) {
        Some(diag) => eprint!("{}", TerminalRenderer::new(global.color).render(&diag)),
        None => eprintln!("error: {e}"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use weft_diagnostics::Severity;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) const FABRIC: &str = r#"
[fabric]
name = "demo"
frame_bits_per_row = 4
max_frames_per_col = 2

[grid]
rows = [["LUT", "LUT"]]

[[tile]]
name = "LUT"
matrix = "LUT_switch_matrix.csv"

[[tile.port]]
direction = "EAST"
source = "E1BEG"
x_offset = 1
y_offset = 0
destination = "E1END"
wires = 1

[[tile.bel]]
name = "LUT1"
prefix = "LA_"
inputs = ["I0"]
outputs = ["O"]
config_bits = 2
features = [{ name = "INIT", bits = [0, 1] }]
"#;

    pub(crate) const MATRIX: &str = "LUT,E1BEG0,LA_I0\nE1END0,1,1\nLA_O,1,0\n";

    pub(crate) fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("fabric.toml"), FABRIC).unwrap();
        fs::write(tmp.path().join("LUT_switch_matrix.csv"), MATRIX).unwrap();
        tmp
    }

    pub(crate) fn global(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn finds_description_in_parent() {
        let tmp = project();
        let sub = tmp.path().join("out").join("deep");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_fabric_file(&sub).unwrap(), tmp.path().join("fabric.toml"));
    }

    #[test]
    fn config_directory_selects_default_file() {
        let tmp = project();
        let path = resolve_fabric_path(&global(tmp.path())).unwrap();
        assert_eq!(path, tmp.path().join("fabric.toml"));
    }

    #[test]
    fn session_builds_fabric_from_csv() {
        let tmp = project();
        let session = load_session(&global(tmp.path())).unwrap();
        let sink = DiagnosticSink::new();
        let fabric = session.build_fabric(&sink).unwrap();
        let tile = &fabric.tiles["LUT"];
        assert_eq!(tile.fan_in.get("E1BEG0").unwrap().len(), 2);
        assert_eq!(tile.fan_in.get("LA_I0").unwrap().len(), 1);
        assert!(session.load_config_mems().unwrap().is_empty());
    }

    #[test]
    fn list_matrix_merges_into_bootstrap() {
        let tmp = project();
        let toml = FABRIC.replace("LUT_switch_matrix.csv", "LUT_switch_matrix.list");
        fs::write(tmp.path().join("fabric.toml"), toml).unwrap();
        fs::write(tmp.path().join("LUT_switch_matrix.list"), "[E1END0|LA_O],E1BEG0\n").unwrap();
        let session = load_session(&global(tmp.path())).unwrap();
        let fabric = session.build_fabric(&DiagnosticSink::new()).unwrap();
        let sources: Vec<&str> = fabric.tiles["LUT"]
            .fan_in
            .get("E1BEG0")
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(sources, vec!["E1END0", "LA_O"]);
    }

    #[test]
    fn malformed_matrix_error_names_the_file() {
        let tmp = project();
        fs::write(tmp.path().join("LUT_switch_matrix.csv"), "LUT,E1BEG0\nE1END0,2\n").unwrap();
        let session = load_session(&global(tmp.path())).unwrap();
        let err = session.build_fabric(&DiagnosticSink::new()).unwrap_err();
        let diag = error_diagnostic(err.as_ref()).unwrap();
        assert_eq!(diag.locus.file, Some(tmp.path().join("LUT_switch_matrix.csv")));
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn matrix_naming_an_undeclared_wire_is_rejected() {
        let tmp = project();
        fs::write(tmp.path().join("LUT_switch_matrix.csv"), "LUT,E1BEG0,TYPO0\nE1END0,1,1\n").unwrap();
        let session = load_session(&global(tmp.path())).unwrap();
        let err = session.build_fabric(&DiagnosticSink::new()).unwrap_err();
        let diag = error_diagnostic(err.as_ref()).unwrap();
        assert_eq!(diag.code.to_string(), "A105");
        assert!(diag.message.contains("TYPO0"), "{}", diag.message);
    }

    #[test]
    fn missing_matrix_file_is_a_read_error() {
        let tmp = project();
        fs::remove_file(tmp.path().join("LUT_switch_matrix.csv")).unwrap();
        let session = load_session(&global(tmp.path())).unwrap();
        let err = session.build_fabric(&DiagnosticSink::new()).unwrap_err();
        let diag = error_diagnostic(err.as_ref()).unwrap();
        assert_eq!(diag.code.to_string(), "C102");
    }
}
