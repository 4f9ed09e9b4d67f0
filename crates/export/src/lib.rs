//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod table {
    use std::fs::File;
    use std::io::{Read, Write};
    use std::path::Path;

    use serde::{Deserialize, Serialize};

    use super::{ExportError, writer_for_path};

    /// One converged transfer as written to the results file.
    ///
    /// Columns, without a header: `i,j,k,m,sma,incl,cost` where `i`/`j` are one-based
    /// catalog positions, `k` the start epoch, `m` the duration in epochs, `sma` in
    /// metres, `incl` in radians and `cost` in m/s.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Row {
        pub source: usize,
        pub destination: usize,
        pub start_epoch: u32,
        pub duration: u32,
        pub sma: f64,
        pub incl: f64,
        pub cost: f64,
    }

    /// Write rows in the given order.
    pub fn write_table<W: Write>(writer: W, rows: &[Row]) -> Result<(), csv::Error> {
        let mut out = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for row in rows {
            out.serialize(row)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write rows to `path` (or stdout for `-`), creating parent directories.
    pub fn write_table_to_path(path: &Path, rows: &[Row]) -> Result<(), ExportError> {
        let writer = writer_for_path(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        write_table(writer, rows).map_err(|source| ExportError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_table<R: Read>(reader: R) -> Result<Vec<Row>, csv::Error> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader)
            .deserialize()
            .collect()
    }

    pub fn read_table_from_path(path: &Path) -> Result<Vec<Row>, ExportError> {
        let file = File::open(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_table(file).map_err(|source| ExportError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub mod summary {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use debris_config::RunConfig;
    use serde::{Deserialize, Serialize};

    use super::{ExportError, writer_for_path};

    /// JSON sidecar describing one run.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RunSummary {
        pub dataset: String,
        pub objects: usize,
        pub grid_points: usize,
        pub evaluated: usize,
        pub converged: usize,
        pub failed: usize,
        pub interrupted: bool,
        pub elapsed_s: f64,
        pub config: RunConfig,
    }

    /// `<dir>/<dataset>.summary.json`.
    pub fn summary_path(dir: &Path, dataset: &str) -> PathBuf {
        dir.join(format!("{dataset}.summary.json"))
    }

    pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), ExportError> {
        let mut writer = writer_for_path(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(&mut writer, summary).map_err(|source| {
            ExportError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writeln!(writer)
            .and_then(|_| writer.flush())
            .map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
