//! Vault-relative path handling
//!
//! Every path exchanged between the sync components is a [`VaultPath`]:
//! '/'-prefixed, '/'-separated, with dot segments resolved and repeated
//! separators collapsed. Matching is byte-exact and case-sensitive.

use serde::{Deserialize, Serialize};

/// A normalized, root-relative vault path.
///
/// The root is `"/"`. Every other path starts with `/` and never ends
/// with one. `.` and `..` segments are resolved at construction; `..`
/// above the root clamps to the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VaultPath {
    inner: String,
}

// Deserialized input is normalized like any other; raw strings from
// settings files or caches never bypass `new`.
impl<'de> Deserialize<'de> for VaultPath {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}

impl VaultPath {
    /// Create a normalized path from any '/'- or '\\'-separated input.
    ///
    /// A missing leading separator is supplied, repeated separators are
    /// collapsed, a trailing separator is stripped (except for the root),
    /// and `.`/`..` segments are resolved.
    pub fn new(path: impl AsRef<str>) -> Self {
        let raw = path.as_ref().replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        if segments.is_empty() {
            return Self::root();
        }
        Self {
            inner: format!("/{}", segments.join("/")),
        }
    }

    /// The vault root, `"/"`.
    pub fn root() -> Self {
        Self {
            inner: "/".to_string(),
        }
    }

    /// The normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_root(&self) -> bool {
        self.inner == "/"
    }

    /// Path segments, root-first. Empty for the root itself.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.inner.rsplit('/').next()
        }
    }

    /// The parent directory, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Join a (possibly multi-segment) suffix onto this path.
    pub fn join(&self, segment: &str) -> Self {
        if self.is_root() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{}", self.inner, segment))
        }
    }

    /// True if `ancestor` equals this path or is one of its ancestors.
    pub fn starts_with(&self, ancestor: &VaultPath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        self.inner == ancestor.inner
            || self
                .inner
                .strip_prefix(&ancestor.inner)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Strip `base` and re-root the remainder.
    ///
    /// Returns `None` when this path is not under `base`. Stripping a path
    /// from itself yields the root.
    pub fn relative_to(&self, base: &VaultPath) -> Option<Self> {
        if !self.starts_with(base) {
            return None;
        }
        if base.is_root() {
            return Some(self.clone());
        }
        let rest = &self.inner[base.inner.len()..];
        if rest.is_empty() {
            Some(Self::root())
        } else {
            Some(Self {
                inner: rest.to_string(),
            })
        }
    }

    /// All proper ancestors, nearest first, ending at the root.
    pub fn ancestors(&self) -> Vec<VaultPath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(p) = current {
            current = p.parent();
            out.push(p);
        }
        out
    }
}

impl std::fmt::Display for VaultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for VaultPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VaultPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
