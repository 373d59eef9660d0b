#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

/// One isolated runtime home per test. Operations are plain filesystem
/// work, so tests never share state and need no cross-test locking.
pub struct TestContext {
    home: TempDir,
}

impl TestContext {
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_boxhive"));
        cmd.timeout(Duration::from_secs(60));
        cmd.arg("--home").arg(self.home.path());
        cmd
    }

    pub fn home(&self) -> &std::path::Path {
        self.home.path()
    }

    pub fn box_root(&self, name: &str) -> PathBuf {
        self.home.path().join("boxes").join(name)
    }

    /// Drop live files into a box root the way a sandboxed program would.
    pub fn seed_content(&self, name: &str, files: &[(&str, &str)]) {
        for (rel, contents) in files {
            let path = self.box_root(name).join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
    }
}

pub fn boxhive() -> TestContext {
    TestContext {
        home: TempDir::new().expect("Failed to create test home"),
    }
}
