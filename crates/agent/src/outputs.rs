// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The build output store.
//!
//! Files an agent holds after a build: the build log, plus whatever
//! the delegate builder dropped into the directory,
//! until the master retrieves them and clears the store. Consumed
//! exactly once per build.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bf_core::OutputFile;

const BUILD_LOG: &str = "build.log";

/// A directory of output files for the current build.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reset to an empty directory for an incoming build.
    pub fn prepare(&self) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)
    }

    /// Append one status line to the build log.
    pub fn append_log(&self, line: &str) -> io::Result<()> {
        let mut file =
            fs::OpenOptions::new().create(true).append(true).open(self.root.join(BUILD_LOG))?;
        writeln!(file, "{}", line)
    }

    /// Snapshot every file under the root, paths relative, sorted.
    pub fn collect(&self) -> io::Result<Vec<OutputFile>> {
        let mut files = Vec::new();
        if self.root.exists() {
            walk(&self.root, &self.root, &mut files)?;
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Delete everything. Idempotent.
    pub fn clear(&self) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

fn walk(dir: &Path, base: &Path, out: &mut Vec<OutputFile>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(&path, base, out)?;
        } else {
            let relative = path.strip_prefix(base).unwrap_or(&path);
            out.push(OutputFile {
                path: relative.to_string_lossy().into_owned(),
                contents: fs::read(&path)?,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
