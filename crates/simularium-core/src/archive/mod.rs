//! Extracted COMBINE/OMEX archive directory: manifest, Smoldyn model, SED-ML
//! simulation description and the Smoldyn output log.

pub mod discovery;
pub mod manifest;
pub mod sedml;

pub use manifest::{MANIFEST_FILE_NAME, Manifest, ManifestEntry, SIMULARIUM_FORMAT};
pub use sedml::{SimulationDescription, UniformTimeCourse};

use crate::common::serialization::write_text_artifact;
use crate::domain::{ConversionError, ConversionResult};
use discovery::DEFAULT_TRAJECTORY_PATTERNS;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Output log relative to the archive root. Skips discovery when set.
    pub trajectory_file: Option<PathBuf>,
    pub trajectory_patterns: Vec<String>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            trajectory_file: None,
            trajectory_patterns: DEFAULT_TRAJECTORY_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    root: PathBuf,
    manifest: Manifest,
    model_entry: ManifestEntry,
    model_path: PathBuf,
    simulation_path: PathBuf,
    trajectory_path: PathBuf,
    simulation: SimulationDescription,
}

impl Archive {
    pub fn open(root: impl AsRef<Path>, options: &ArchiveOptions) -> ConversionResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ConversionError::archive_structure(
                "ARCHIVE.ROOT",
                "archive root does not exist or is not a directory",
            )
            .with_path(&root));
        }

        let manifest_path = root.join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            return Err(ConversionError::archive_structure(
                "ARCHIVE.MANIFEST_MISSING",
                "archive has no manifest.xml",
            )
            .with_path(&root));
        }
        let manifest = Manifest::read(&manifest_path)?;

        let model_entry = unique_entry(&manifest, "Smoldyn model", ManifestEntry::is_smoldyn_model)
            .map_err(|error| error.with_path(&manifest_path))?;
        let model_path = existing_entry_path(&root, &model_entry)?;

        let simulation_entry = unique_entry(&manifest, "SED-ML simulation", ManifestEntry::is_sedml)
            .map_err(|error| error.with_path(&manifest_path))?;
        let simulation_path = existing_entry_path(&root, &simulation_entry)?;
        let simulation = SimulationDescription::read(&simulation_path)?;
        if !simulation.references_model(model_entry.relative_location()) {
            warn!(
                model = model_entry.relative_location(),
                sources = ?simulation.model_sources,
                "SED-ML model source does not reference the manifest's Smoldyn model"
            );
        }

        let trajectory_path = resolve_trajectory(&root, &model_entry, options)?;
        debug!(
            root = %root.display(),
            model = %model_path.display(),
            simulation = %simulation_path.display(),
            trajectory = %trajectory_path.display(),
            "resolved archive"
        );

        Ok(Self {
            root,
            manifest,
            model_entry,
            model_path,
            simulation_path,
            trajectory_path,
            simulation,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_entries(&self) -> &[ManifestEntry] {
        self.manifest.entries()
    }

    pub fn model_entry(&self) -> &ManifestEntry {
        &self.model_entry
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn simulation_path(&self) -> &Path {
        &self.simulation_path
    }

    pub fn trajectory_path(&self) -> &Path {
        &self.trajectory_path
    }

    pub fn simulation(&self) -> &SimulationDescription {
        &self.simulation
    }

    /// Adds `path` to the manifest with `format` and rewrites `manifest.xml`.
    /// Returns `Ok(false)` when `path` is not under the archive root.
    pub fn register_output(&mut self, path: &Path, format: &str) -> ConversionResult<bool> {
        let Some(relative) = relative_to_root(&self.root, path) else {
            warn!(
                output = %path.display(),
                root = %self.root.display(),
                "output lies outside the archive root; manifest left unchanged"
            );
            return Ok(false);
        };
        let location = format!("./{}", relative.to_string_lossy().replace('\\', "/"));
        let replaced = self.manifest.upsert(ManifestEntry::new(location.clone(), format));
        let xml = self.manifest.to_xml()?;
        write_text_artifact(&self.root.join(MANIFEST_FILE_NAME), &xml, true)?;
        debug!(location = %location, replaced, "registered output in manifest");
        Ok(true)
    }
}

fn unique_entry(
    manifest: &Manifest,
    description: &str,
    predicate: fn(&ManifestEntry) -> bool,
) -> ConversionResult<ManifestEntry> {
    let matches = manifest
        .entries()
        .iter()
        .filter(|entry| predicate(entry))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [entry] => Ok((*entry).clone()),
        [] => Err(ConversionError::archive_structure(
            "ARCHIVE.ENTRY_MISSING",
            format!("manifest has no {} entry", description),
        )),
        many => Err(ConversionError::archive_structure(
            "ARCHIVE.ENTRY_AMBIGUOUS",
            format!(
                "manifest has {} {} entries: {}",
                many.len(),
                description,
                many.iter()
                    .map(|entry| entry.location.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

fn existing_entry_path(root: &Path, entry: &ManifestEntry) -> ConversionResult<PathBuf> {
    let path = root.join(entry.relative_location());
    if !path.is_file() {
        return Err(ConversionError::archive_structure(
            "ARCHIVE.ENTRY_FILE_MISSING",
            format!("manifest entry '{}' does not exist on disk", entry.location),
        )
        .with_path(&path));
    }
    Ok(path)
}

fn resolve_trajectory(
    root: &Path,
    model_entry: &ManifestEntry,
    options: &ArchiveOptions,
) -> ConversionResult<PathBuf> {
    if let Some(explicit) = &options.trajectory_file {
        let path = if explicit.is_absolute() {
            explicit.clone()
        } else {
            root.join(explicit)
        };
        if !path.is_file() {
            return Err(ConversionError::archive_structure(
                "ARCHIVE.TRAJECTORY_MISSING",
                "requested trajectory file does not exist",
            )
            .with_path(&path));
        }
        return Ok(path);
    }

    let excluded = [PathBuf::from(model_entry.relative_location())];
    let candidates = discovery::find_candidates(root, &options.trajectory_patterns, &excluded)?;
    let selected = discovery::select_trajectory(root, &candidates)?;
    Ok(root.join(selected))
}

/// Lexical relative path of `path` under `root`, without touching the filesystem.
fn relative_to_root(root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(root).ok()?;
    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if normalized.as_os_str().is_empty() {
        return None;
    }
    Some(normalized)
}
