//! Per-resolution view of the workspace: the requested document plus the
//! packages its references lead to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{LoadError, ParseCache, SourceLoader};
use crate::base::constants::BUILTIN_PACKAGE;
use crate::syntax::{self, Entity, FatalSyntax, LoweredFile};

/// Why a single file could not be lowered.
#[derive(Debug)]
pub enum FileError {
    Load(LoadError),
    Syntax(FatalSyntax),
    Cancelled,
}

impl From<LoadError> for FileError {
    fn from(error: LoadError) -> Self {
        FileError::Load(error)
    }
}

/// One lowered file of a package.
#[derive(Debug, Clone)]
pub struct PackageFile {
    pub path: PathBuf,
    pub lowered: Arc<LoweredFile>,
}

/// All loadable files of one directory.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub dir: PathBuf,
    pub files: Vec<PackageFile>,
}

impl Package {
    /// Find an entity by name, skipping the file at `exclude`.
    pub fn entity(&self, name: &str, exclude: Option<&Path>) -> Option<(&PackageFile, &Entity)> {
        self.files
            .iter()
            .filter(|f| Some(f.path.as_path()) != exclude)
            .find_map(|f| f.lowered.file.entities.get(name).map(|e| (f, e)))
    }
}

/// Loads and memoizes packages for one resolution.
///
/// The memo lives as long as the resolution; only the optional
/// [`ParseCache`] outlives it.
pub struct Workspace<'a> {
    loader: &'a dyn SourceLoader,
    root: PathBuf,
    stdlib: Option<PathBuf>,
    cache: Option<&'a ParseCache>,
    cancel: &'a CancellationToken,
    packages: FxHashMap<PathBuf, Option<Arc<Package>>>,
}

impl<'a> Workspace<'a> {
    pub fn new(loader: &'a dyn SourceLoader, root: PathBuf, cancel: &'a CancellationToken) -> Self {
        Self {
            loader,
            root,
            stdlib: None,
            cache: None,
            cancel,
            packages: FxHashMap::default(),
        }
    }

    pub fn with_stdlib(mut self, stdlib: Option<PathBuf>) -> Self {
        self.stdlib = stdlib;
        self
    }

    pub fn with_cache(mut self, cache: Option<&'a ParseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Read and lower one file, going through the parse cache.
    pub fn load_file(&self, path: &Path, file_name: &str) -> Result<Arc<LoweredFile>, FileError> {
        let text = self.loader.read_document(path)?;
        if let Some(hit) = self.cache.and_then(|c| c.get(path, file_name, &text)) {
            return Ok(hit);
        }
        let lowered = match syntax::lower_with_cancel(&text, self.cancel) {
            None => return Err(FileError::Cancelled),
            Some(Err(fatal)) => return Err(FileError::Syntax(fatal)),
            Some(Ok(lowered)) => Arc::new(lowered),
        };
        if let Some(cache) = self.cache {
            cache.insert(path, file_name, &text, lowered.clone());
        }
        Ok(lowered)
    }

    /// Package in `dir`, loaded once per resolution.
    ///
    /// Files that fail to load or parse are skipped; a missing directory
    /// yields `None`.
    pub fn package(&mut self, dir: &Path) -> Option<Arc<Package>> {
        if let Some(memo) = self.packages.get(dir) {
            return memo.clone();
        }
        let package = self.load_package(dir).map(Arc::new);
        self.packages.insert(dir.to_path_buf(), package.clone());
        package
    }

    fn load_package(&self, dir: &Path) -> Option<Package> {
        if !self.loader.is_dir(dir) {
            return None;
        }
        let paths = match self.loader.package_documents(dir) {
            Ok(paths) => paths,
            Err(error) => {
                warn!(dir = %dir.display(), %error, "cannot list package");
                return None;
            }
        };

        let files: Vec<_> = paths
            .par_iter()
            .filter_map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match self.load_file(path, &name) {
                    Ok(lowered) => Some(PackageFile {
                        path: path.clone(),
                        lowered,
                    }),
                    Err(FileError::Cancelled) => None,
                    Err(error) => {
                        warn!(path = %path.display(), ?error, "skipping package file");
                        None
                    }
                }
            })
            .collect();

        debug!(dir = %dir.display(), files = files.len(), "loaded package");
        Some(Package {
            dir: dir.to_path_buf(),
            files,
        })
    }

    /// Package behind an import path: the workspace first, then the stdlib.
    pub fn import_package(&mut self, package: &str) -> Option<Arc<Package>> {
        let local = self.root.join(package);
        if self.loader.is_dir(&local) {
            return self.package(&local);
        }
        let stdlib = self.stdlib.as_ref()?.join(package);
        self.package(&stdlib)
    }

    /// The stdlib `builtin` package, if a stdlib root is configured.
    pub fn builtin(&mut self) -> Option<Arc<Package>> {
        let dir = self.stdlib.as_ref()?.join(BUILTIN_PACKAGE);
        self.package(&dir)
    }
}
