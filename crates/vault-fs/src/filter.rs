//! Include/exclude glob filtering for vault paths

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::VaultPath;

/// Runtime filter compiled from include / exclude pattern lists.
///
/// An empty include list means "include all". Exclusion always wins over
/// inclusion. Patterns are matched against the path without its leading
/// separator, so `notes/**` matches `/notes/a.md`.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
    include_empty: bool,
}

impl PathFilter {
    /// Build a filter from pattern lists.
    ///
    /// Individually invalid patterns are skipped with a warning rather
    /// than failing the whole filter.
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: compile(include),
            exclude: compile(exclude),
            include_empty: include.is_empty(),
        }
    }

    /// A filter that keeps everything.
    pub fn allow_all() -> Self {
        Self::new(&[], &[])
    }

    /// Determine whether a given path should be synced.
    pub fn check(&self, path: &VaultPath) -> bool {
        let candidate = path.as_str().trim_start_matches('/');
        let included = self.include_empty || self.include.is_match(candidate);
        included && !self.exclude.is_match(candidate)
    }

    /// True when the path is hit by an exclude pattern.
    ///
    /// Exclusion is stronger than mere non-inclusion: anything below an
    /// excluded directory is unreachable, while a directory that only
    /// failed the include list can still be resynthesized for kept
    /// descendants.
    pub fn is_excluded(&self, path: &VaultPath) -> bool {
        self.exclude.is_match(path.as_str().trim_start_matches('/'))
    }
}

fn compile(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                tracing::warn!("Skipping invalid glob pattern {pattern}: {e}");
            }
        }
    }
    builder
        .build()
        .unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}
