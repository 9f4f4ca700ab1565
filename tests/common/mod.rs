#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a synthetic sales CSV with a date column cycling over `days`
/// distinct ISO days, a region column cycling over `regions`, and a
/// deterministic integer sales column.
pub fn sales_csv(rows: usize, days: usize, regions: &[&str]) -> String {
    let mut out = String::from("date,region,sales\n");
    for i in 0..rows {
        let day = 1 + (i % days.max(1));
        let region = regions[i % regions.len()];
        out.push_str(&format!("2024-03-{day:02},{region},{}\n", (i % 17) + 1));
    }
    out
}
