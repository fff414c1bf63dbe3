#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use symdir::commands::{self, Request};
use symdir::engine::{Depth, Operation, ResultFlags};
use symdir::output::MemoryLogger;
use symdir::utils::paths::NormalizeStrategy;
use tempfile::TempDir;

/// A source tree and an empty collection side by side in a temporary directory.
pub struct Trees {
    pub temp_dir: TempDir,
    pub source: PathBuf,
    pub coll: PathBuf,
}

impl Trees {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("src");
        let coll = temp_dir.path().join("coll");
        fs::create_dir(&source)?;
        fs::create_dir(&coll)?;
        Ok(Self {
            temp_dir,
            source,
            coll,
        })
    }

    /// Creates a file (and its parents) in the source tree.
    pub fn source_file(&self, relative: &str) -> Result<()> {
        let path = self.source.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, relative.as_bytes())?;
        Ok(())
    }

    pub fn source_dir(&self, relative: &str) -> Result<()> {
        fs::create_dir_all(self.source.join(relative))?;
        Ok(())
    }

    /// Creates a symlink in the collection pointing at `target`.
    pub fn coll_link(&self, relative: &str, target: impl AsRef<Path>) -> Result<()> {
        let path = self.coll.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        symlink(target, path)?;
        Ok(())
    }

    /// Runs `operation` with unlimited depth and records every log line.
    pub fn run(&self, operation: Operation) -> Result<(ResultFlags, MemoryLogger)> {
        self.run_with_depth(operation, Depth::Unlimited)
    }

    pub fn run_with_depth(
        &self,
        operation: Operation,
        depth: Depth,
    ) -> Result<(ResultFlags, MemoryLogger)> {
        let request = Request {
            operation,
            source: self.source.clone(),
            collection: Some(self.coll.clone()),
            depth,
            normalize: NormalizeStrategy::Lexical,
        };
        let logger = MemoryLogger::new();
        let flags = commands::execute(&request, &logger)?;
        Ok((flags, logger))
    }

    /// Target of a collection symlink, if it is one.
    pub fn link_target(&self, relative: &str) -> Option<PathBuf> {
        fs::read_link(self.coll.join(relative)).ok()
    }

    pub fn coll_exists(&self, relative: &str) -> bool {
        fs::symlink_metadata(self.coll.join(relative)).is_ok()
    }

    /// Sorted relative paths of everything in the collection.
    pub fn coll_listing(&self) -> Vec<String> {
        let mut out = Vec::new();
        list_into(&self.coll, &self.coll, &mut out);
        out.sort();
        out
    }
}

fn list_into(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            out.push(format!("{relative}/"));
            list_into(root, &path, out);
        } else {
            out.push(relative);
        }
    }
}
