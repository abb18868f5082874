//! Include path lookup.

use crate::error::{ModelError, Result};
use std::path::{Path, PathBuf};

/// Find the file an `include` names: the path as written first, then each
/// search directory in order. The hit is canonicalized so the same file
/// reached through different spellings is recognised.
pub(crate) fn resolve(path: &str, search_dirs: &[PathBuf]) -> Result<Option<PathBuf>> {
    let given = Path::new(path);
    let found = std::iter::once(given.to_path_buf())
        .chain(search_dirs.iter().map(|dir| dir.join(given)))
        .find(|candidate| candidate.is_file());
    match found {
        Some(file) => canonical(&file).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `a.mzn -> b.mzn -> a.mzn` for error messages.
pub(crate) fn chain_text(chain: &[PathBuf], last: &Path) -> String {
    chain
        .iter()
        .map(PathBuf::as_path)
        .chain(std::iter::once(last))
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn search_dirs_are_tried_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("lib.mzn"), "").unwrap();
        fs::write(second.path().join("lib.mzn"), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let hit = resolve("lib.mzn", &dirs).unwrap().unwrap();
        assert_eq!(hit, first.path().join("lib.mzn").canonicalize().unwrap());
    }

    #[test]
    fn missing_files_resolve_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = vec![dir.path().to_path_buf()];
        assert!(resolve("no_such_file.mzn", &dirs).unwrap().is_none());
    }

    #[test]
    fn directories_are_not_include_targets() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let dirs = vec![dir.path().to_path_buf()];
        assert!(resolve("sub", &dirs).unwrap().is_none());
    }

    #[test]
    fn chain_lists_every_hop() {
        let chain = vec![PathBuf::from("a.mzn"), PathBuf::from("b.mzn")];
        assert_eq!(
            chain_text(&chain, Path::new("a.mzn")),
            "a.mzn -> b.mzn -> a.mzn"
        );
    }
}
