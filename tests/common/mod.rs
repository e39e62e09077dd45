#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};
use test_support::{FakeRsync, InstalledFake};

/// Scratch root, destination and fake engine for one binary run.
pub struct Workspace {
    pub root: TempDir,
    pub dest: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempdir().expect("tempdir");
        let dest = root.path().join("mirror");
        Self { root, dest }
    }

    pub fn scratch(&self) -> &Path {
        self.root.path()
    }

    pub fn install(&self, configure: impl FnOnce(FakeRsync) -> FakeRsync) -> InstalledFake {
        configure(FakeRsync::new(&self.root.path().join("bin")))
            .install()
            .expect("install fake rsync")
    }

    /// `msync` wired to `fake`, without delay, scratch under the workspace.
    pub fn command(&self, fake: &InstalledFake) -> Command {
        let mut command = Command::cargo_bin("msync").expect("msync binary is built");
        command
            .env("MSYNC_RSYNC", fake.binary())
            .env_remove("MSYNC_LOG")
            .arg("--random-delay")
            .arg("0")
            .arg("--temporary-directory")
            .arg(self.scratch());
        command
    }

    pub fn lock_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch())
            .expect("read scratch")
            .map(|entry| entry.expect("entry").path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "lck"))
            .collect()
    }

    /// Sorted file names directly under the destination.
    pub fn dest_listing(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dest)
            .expect("read dest")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
