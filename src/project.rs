//! Project identity derived from the checkout path

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Derive a project name from a repository root directory
///
/// The directory name is used up to the first `_`, so a checkout named
/// `plaso_master` belongs to project `plaso`.
pub fn project_name_from_path(repo_root: &Path) -> Option<String> {
    let dir_name = repo_root.file_name()?.to_str()?;

    let name = dir_name.split('_').next().unwrap_or(dir_name).trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// Project information for one checkout
///
/// The name is computed on first use and then reused for the lifetime of
/// this value.
#[derive(Debug)]
pub struct ProjectHelper {
    root: PathBuf,
    name: OnceLock<Option<String>>,
}

impl ProjectHelper {
    /// Helper for the checkout rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            name: OnceLock::new(),
        }
    }

    /// Checkout root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project name, if the root path yields one
    pub fn project_name(&self) -> Option<&str> {
        self.name
            .get_or_init(|| {
                let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
                project_name_from_path(&root)
            })
            .as_deref()
    }
}
