use crate::domain::{ConversionError, ConversionResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const PREFERRED_TRAJECTORY_NAME: &str = "modelout.txt";
pub const DEFAULT_TRAJECTORY_PATTERNS: [&str; 2] = ["modelout.txt", "**/*out*.txt"];

pub fn build_glob_set(patterns: &[String]) -> ConversionResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.TRAJECTORY_PATTERN",
                format!("invalid trajectory pattern '{}': {}", pattern, source),
            )
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| {
        ConversionError::archive_structure(
            "ARCHIVE.TRAJECTORY_PATTERN",
            format!("invalid trajectory patterns: {}", source),
        )
    })
}

/// Walks `root` and returns files matching `patterns`, relative to `root`, sorted.
pub fn find_candidates(
    root: &Path,
    patterns: &[String],
    exclude: &[PathBuf],
) -> ConversionResult<Vec<PathBuf>> {
    let matcher = build_glob_set(patterns)?;
    let mut candidates = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.WALK",
                format!("failed to scan archive directory: {}", source),
            )
            .with_path(root)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if exclude.iter().any(|excluded| excluded == relative) {
            continue;
        }
        let normalized = relative.to_string_lossy().replace('\\', "/");
        if matcher.is_match(normalized.as_str()) {
            candidates.push(relative.to_path_buf());
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Picks the Smoldyn output log among `candidates`. A single `modelout.txt` wins outright.
pub fn select_trajectory(root: &Path, candidates: &[PathBuf]) -> ConversionResult<PathBuf> {
    let preferred = candidates
        .iter()
        .filter(|candidate| {
            candidate
                .file_name()
                .is_some_and(|name| name == PREFERRED_TRAJECTORY_NAME)
        })
        .collect::<Vec<_>>();
    if preferred.len() == 1 {
        return Ok(preferred[0].clone());
    }

    match candidates {
        [] => Err(ConversionError::archive_structure(
            "ARCHIVE.TRAJECTORY_MISSING",
            "no Smoldyn output log found in archive",
        )
        .with_path(root)),
        [only] => Ok(only.clone()),
        many => Err(ConversionError::archive_structure(
            "ARCHIVE.TRAJECTORY_AMBIGUOUS",
            format!(
                "multiple Smoldyn output logs found: {}",
                many.iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
        .with_path(root)),
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TRAJECTORY_PATTERNS, find_candidates, select_trajectory};
    use crate::domain::ErrorKind;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn default_patterns() -> Vec<String> {
        DEFAULT_TRAJECTORY_PATTERNS
            .iter()
            .map(|pattern| pattern.to_string())
            .collect()
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir should be created");
        }
        fs::write(path, "0 0\n").expect("file should be written");
    }

    #[test]
    fn modelout_wins_over_other_candidates() {
        let temp = TempDir::new().expect("tempdir should be created");
        touch(temp.path(), "modelout.txt");
        touch(temp.path(), "results/layout.txt");
        touch(temp.path(), "model.txt");

        let candidates = find_candidates(
            temp.path(),
            &default_patterns(),
            &[PathBuf::from("model.txt")],
        )
        .expect("scan should succeed");
        assert_eq!(
            candidates,
            vec![PathBuf::from("modelout.txt"), PathBuf::from("results/layout.txt")]
        );
        let selected = select_trajectory(temp.path(), &candidates).expect("should select");
        assert_eq!(selected, PathBuf::from("modelout.txt"));
    }

    #[test]
    fn ambiguous_candidates_fail() {
        let temp = TempDir::new().expect("tempdir should be created");
        touch(temp.path(), "run1_out.txt");
        touch(temp.path(), "run2_out.txt");

        let candidates =
            find_candidates(temp.path(), &default_patterns(), &[]).expect("scan should succeed");
        let error = select_trajectory(temp.path(), &candidates).expect_err("should be ambiguous");
        assert_eq!(error.kind(), ErrorKind::ArchiveStructure);
        assert_eq!(error.placeholder(), "ARCHIVE.TRAJECTORY_AMBIGUOUS");
    }

    #[test]
    fn missing_candidates_fail() {
        let temp = TempDir::new().expect("tempdir should be created");
        touch(temp.path(), "model.txt");

        let candidates = find_candidates(
            temp.path(),
            &default_patterns(),
            &[PathBuf::from("model.txt")],
        )
        .expect("scan should succeed");
        assert!(candidates.is_empty());
        let error = select_trajectory(temp.path(), &candidates).expect_err("should be missing");
        assert_eq!(error.placeholder(), "ARCHIVE.TRAJECTORY_MISSING");
    }
}
