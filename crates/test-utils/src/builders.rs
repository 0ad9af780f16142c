use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use phpguard::config::{CONFIG_FILE, DIST_CONFIG_FILE};
use phpguard::coverage::CoverageSession;
use phpguard::coverage::cache::CACHE_DIR_NAME;
use phpguard::engine::{Console, Context};
use tempfile::TempDir;

use crate::fakes::SharedBuffer;

/// A throwaway project directory.
///
/// The directory is canonicalized so paths built from it compare equal to
/// what the matcher and coverage normalization produce.
pub struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().canonicalize()?;
        Ok(Self { _dir: dir, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn dir(&self, rel: &str) -> io::Result<PathBuf> {
        let path = self.path(rel);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write `phpguard.yml`.
    pub fn config(&self, yaml: &str) -> io::Result<PathBuf> {
        self.file(CONFIG_FILE, yaml)
    }

    /// Write `phpguard.yml.dist`.
    pub fn dist_config(&self, yaml: &str) -> io::Result<PathBuf> {
        self.file(DIST_CONFIG_FILE, yaml)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path(CACHE_DIR_NAME)
    }

    /// Fresh session caching under this project.
    pub fn session(&self) -> CoverageSession {
        CoverageSession::new(self.cache_dir())
    }

    /// Context rooted here, with console output captured in the returned
    /// buffer.
    pub fn context(&self) -> (Context, SharedBuffer) {
        self.context_with(self.session())
    }

    pub fn context_with(&self, session: CoverageSession) -> (Context, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let ctx = Context::new(&self.root, session)
            .with_console(Console::new(Box::new(buffer.clone()), false));
        (ctx, buffer)
    }
}
