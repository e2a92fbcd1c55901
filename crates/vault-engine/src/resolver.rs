//! Conflict resolution strategies

use vault_fs::VaultPath;

use crate::merge;
use crate::settings::{ConflictStrategy, SyncSettings};
use crate::{Error, Result};

/// Extensions treated as line-mergeable text. Everything else is opaque
/// and can only be resolved by timestamp.
const MERGEABLE_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "text", "json", "canvas", "csv", "yaml", "yml", "toml", "org",
];

/// One side's current content and timestamp.
#[derive(Debug, Clone)]
pub struct Version {
    pub bytes: Vec<u8>,
    /// Epoch milliseconds.
    pub mtime: i64,
}

/// What the executor must write so both sides converge on `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub content: Vec<u8>,
    pub write_local: bool,
    pub write_remote: bool,
}

impl Resolution {
    fn settled(content: Vec<u8>) -> Self {
        Self {
            content,
            write_local: false,
            write_remote: false,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.write_local && !self.write_remote
    }
}

/// Resolve a conflicting pair per the configured strategy.
///
/// `base` is the recorded common ancestor, when one exists. Identical
/// bytes on both sides resolve to a no-op regardless of strategy.
pub fn resolve(
    path: &VaultPath,
    settings: &SyncSettings,
    base: Option<&[u8]>,
    local: &Version,
    remote: &Version,
) -> Result<Resolution> {
    if local.bytes == remote.bytes {
        return Ok(Resolution::settled(local.bytes.clone()));
    }
    match settings.strategy {
        ConflictStrategy::LatestTimestamp => Ok(latest_timestamp(local, remote)),
        ConflictStrategy::IntelligentMerge => {
            intelligent_merge(path, settings, base, local, remote)
        }
    }
}

fn latest_timestamp(local: &Version, remote: &Version) -> Resolution {
    if local.mtime == remote.mtime {
        // Equal clocks with different bytes cannot be ordered; leave
        // both sides untouched rather than pick arbitrarily.
        return Resolution::settled(local.bytes.clone());
    }
    if local.mtime > remote.mtime {
        Resolution {
            content: local.bytes.clone(),
            write_local: false,
            write_remote: true,
        }
    } else {
        Resolution {
            content: remote.bytes.clone(),
            write_local: true,
            write_remote: false,
        }
    }
}

fn intelligent_merge(
    path: &VaultPath,
    settings: &SyncSettings,
    base: Option<&[u8]>,
    local: &Version,
    remote: &Version,
) -> Result<Resolution> {
    let not_mergeable = |reason: &str| Error::NotMergeable {
        path: path.clone(),
        reason: reason.to_string(),
    };
    if !mergeable_extension(path) {
        return Err(not_mergeable("unsupported file type"));
    }
    let local_text = text_of(&local.bytes).ok_or_else(|| not_mergeable("local side is binary"))?;
    let remote_text =
        text_of(&remote.bytes).ok_or_else(|| not_mergeable("remote side is binary"))?;
    // No recorded ancestor (or one that is no longer text): the local
    // text stands in as the base, so the remote edits apply onto it.
    let base_text = base.and_then(text_of).unwrap_or(local_text);

    let merged = merge::three_way_merge(base_text, local_text, remote_text)
        .or_else(|| merge::apply_remote_patch(base_text, local_text, remote_text));
    let merged = match merged {
        Some(merged) => merged,
        None if settings.conflict_markers => {
            merge::merge_with_markers(base_text, local_text, remote_text)
        }
        None => return Err(Error::MergeConflict { path: path.clone() }),
    };

    Ok(Resolution {
        write_local: merged.as_bytes() != &local.bytes[..],
        write_remote: merged.as_bytes() != &remote.bytes[..],
        content: merged.into_bytes(),
    })
}

fn mergeable_extension(path: &VaultPath) -> bool {
    path.file_name()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| {
            MERGEABLE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn text_of(bytes: &[u8]) -> Option<&str> {
    if bytes.contains(&0) {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}
