use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::export::{write_csv_file, TableRow};
use super::loader::{load_enrollment, load_literacy, load_performance};
use super::model::Tables;
use super::synth::{SampleSynthesizer, SynthParams};

// ---------------------------------------------------------------------------
// Paths and warnings
// ---------------------------------------------------------------------------

/// Locations of the three persisted tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub literacy: PathBuf,
    pub enrollment: PathBuf,
    pub performance: PathBuf,
}

/// Extensions tried, in order, for each table stem.
const EXTENSIONS: [&str; 3] = ["csv", "json", "parquet"];

impl DataPaths {
    /// The standard tables inside `dir`.  Each one is the first existing
    /// `<stem>.csv`, `<stem>.json` or `<stem>.parquet`, falling back to the
    /// `.csv` path (where sample data is saved) when none exists.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            literacy: resolve_stem(dir, "literacy"),
            enrollment: resolve_stem(dir, "enrollment"),
            performance: resolve_stem(dir, "school_performance"),
        }
    }
}

fn resolve_stem(dir: &Path, stem: &str) -> PathBuf {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
        .unwrap_or_else(|| dir.join(format!("{stem}.csv")))
}

/// Non-fatal problems met while resolving the tables.  The affected table is
/// still available (synthesized) when one of these is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The file exists but could not be read; sample data is used instead.
    ParseFallback { path: PathBuf, message: String },
    /// Sample data was generated but could not be saved.
    WriteFailed { path: PathBuf, message: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::ParseFallback { path, message } => write!(
                f,
                "Error reading {}: {message}. Using generated sample data.",
                path.display()
            ),
            LoadWarning::WriteFailed { path, message } => write!(
                f,
                "Could not save generated sample data to {}: {message}",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub tables: Arc<Tables>,
    pub warnings: Vec<LoadWarning>,
}

// ---------------------------------------------------------------------------
// DataStore
// ---------------------------------------------------------------------------

/// (modified, length) of a file, `None` when it does not exist.
type FileSignature = Option<(Option<SystemTime>, u64)>;

struct CacheEntry {
    signature: [FileSignature; 3],
    outcome: LoadOutcome,
}

/// Resolves the three tables from disk, falling back to sample data.
///
/// Results are cached by the files' modification signature: calling
/// [`DataStore::load`] again with unchanged files returns the same snapshot.
pub struct DataStore {
    paths: DataPaths,
    params: SynthParams,
    seed: Option<u64>,
    cache: Option<CacheEntry>,
}

impl DataStore {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            params: SynthParams::default(),
            seed: None,
            cache: None,
        }
    }

    /// Seed for sample data; `None` draws from OS entropy.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_params(mut self, params: SynthParams) -> Self {
        self.params = params;
        self
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Drop the cached snapshot so the next [`DataStore::load`] rereads disk.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn load(&mut self) -> LoadOutcome {
        let signature = self.signature();
        if let Some(entry) = &self.cache {
            if entry.signature == signature {
                log::debug!("Data files unchanged, reusing cached tables");
                return entry.outcome.clone();
            }
        }

        let outcome = self.load_uncached();
        // Taken after persisting so freshly written files count as unchanged.
        let signature = self.signature();
        self.cache = Some(CacheEntry {
            signature,
            outcome: outcome.clone(),
        });
        outcome
    }

    fn signature(&self) -> [FileSignature; 3] {
        [
            file_signature(&self.paths.literacy),
            file_signature(&self.paths.enrollment),
            file_signature(&self.paths.performance),
        ]
    }

    fn load_uncached(&self) -> LoadOutcome {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut synth = SampleSynthesizer::with_params(rng, self.params.clone());
        let mut warnings = Vec::new();

        let literacy = resolve(
            &self.paths.literacy,
            load_literacy,
            || synth.literacy(),
            &mut warnings,
        );
        let enrollment = resolve(
            &self.paths.enrollment,
            load_enrollment,
            || synth.enrollment(),
            &mut warnings,
        );
        let performance = resolve(
            &self.paths.performance,
            load_performance,
            || synth.school_performance(),
            &mut warnings,
        );

        LoadOutcome {
            tables: Arc::new(Tables {
                literacy,
                enrollment,
                performance,
            }),
            warnings,
        }
    }
}

fn file_signature(path: &Path) -> FileSignature {
    fs::metadata(path)
        .ok()
        .map(|meta| (meta.modified().ok(), meta.len()))
}

/// Load one table, or synthesize it: persisting when the file is missing,
/// warning when the file is unreadable.
fn resolve<T: TableRow>(
    path: &Path,
    load: fn(&Path) -> Result<Vec<T>>,
    synthesize: impl FnOnce() -> Vec<T>,
    warnings: &mut Vec<LoadWarning>,
) -> Vec<T> {
    if path.exists() {
        return match load(path) {
            Ok(rows) => {
                log::info!("Loaded {} rows from {}", rows.len(), path.display());
                rows
            }
            Err(e) => {
                let warning = LoadWarning::ParseFallback {
                    path: path.to_path_buf(),
                    message: format!("{e:#}"),
                };
                log::warn!("{warning}");
                warnings.push(warning);
                synthesize()
            }
        };
    }

    let rows = synthesize();
    match persist(&rows, path) {
        Ok(()) => log::info!("Wrote {} sample rows to {}", rows.len(), path.display()),
        Err(e) => {
            let warning = LoadWarning::WriteFailed {
                path: path.to_path_buf(),
                message: format!("{e:#}"),
            };
            log::warn!("{warning}");
            warnings.push(warning);
        }
    }
    rows
}

fn persist<T: TableRow>(rows: &[T], path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        bail!("sample data is only saved as .csv");
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    write_csv_file(rows, path)
}
