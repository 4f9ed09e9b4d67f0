//! Debris catalog import: three-line TLE groups into [`OrbitalState`]s.

pub mod tle;

use std::fs;
use std::path::{Path, PathBuf};

use debris_orbits::OrbitalState;
use log::info;
use thiserror::Error;

pub use tle::{Tle, TleError, semi_major_axis_m};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog has {0} non-blank lines, expected a multiple of 3 (name, line 1, line 2)")]
    LineCount(usize),
    #[error("catalog contains no objects")]
    Empty,
    #[error("object {index} ({name}): {source}")]
    Object {
        index: usize,
        name: String,
        #[source]
        source: TleError,
    },
}

/// One tracked object of a catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub tle: Tle,
    pub state: OrbitalState,
}

/// Read and convert a whole catalog file. Any malformed entry rejects the file.
pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogEntry>, CatalogError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_catalog(&contents)?;
    info!("input read from {} ({} objects)", path.display(), entries.len());
    Ok(entries)
}

/// Parse catalog text made of three-line groups. Blank lines are ignored.
pub fn parse_catalog(contents: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let lines: Vec<&str> = contents
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(CatalogError::Empty);
    }
    if lines.len() % 3 != 0 {
        return Err(CatalogError::LineCount(lines.len()));
    }

    lines
        .chunks_exact(3)
        .enumerate()
        .map(|(index, group)| {
            let object_error = |source| CatalogError::Object {
                index: index + 1,
                name: group[0].trim().to_string(),
                source,
            };
            let tle = Tle::parse_3line(group[0], group[1], group[2]).map_err(object_error)?;
            let state = tle.orbital_state().map_err(object_error)?;
            Ok(CatalogEntry { tle, state })
        })
        .collect()
}

/// Orbital states of a catalog, in file order.
pub fn states(entries: &[CatalogEntry]) -> Vec<OrbitalState> {
    entries.iter().map(|e| e.state).collect()
}
