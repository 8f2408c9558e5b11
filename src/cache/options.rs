//! Cache mount options and the ordered cache map
//!
//! A cache map pairs host directories with the BuildKit cache mount whose
//! contents should land there. Entries keep the order they were declared in,
//! whether that was a JSON object on the command line or a TOML table.

use crate::error::{DanceError, DanceResult};
use serde::de::{self, value::MapAccessDeserializer, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Sharing mode of a BuildKit cache mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sharing {
    Shared,
    Private,
    Locked,
}

impl fmt::Display for Sharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Private => write!(f, "private"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

/// Explicit cache mount options
///
/// Keys map one-to-one onto `RUN --mount=type=cache,...` options. Values are
/// passed through as written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountOptions {
    /// Mount path inside the build container
    pub target: String,

    /// Cache id (defaults to the target path in BuildKit)
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub sharing: Option<Sharing>,

    /// Build stage or image to seed the cache from
    #[serde(default)]
    pub from: Option<String>,

    /// Subpath within `from`
    #[serde(default)]
    pub source: Option<String>,

    /// Directory mode, e.g. "0755"
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub uid: Option<u32>,

    #[serde(default)]
    pub gid: Option<u32>,

    #[serde(default)]
    pub readonly: bool,
}

impl MountOptions {
    /// Options with only a target path set
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            id: None,
            sharing: None,
            from: None,
            source: None,
            mode: None,
            uid: None,
            gid: None,
            readonly: false,
        }
    }
}

/// Options for a single cache: either a bare target path or explicit options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOptions {
    Target(String),
    Mount(MountOptions),
}

impl CacheOptions {
    /// Path of the cache mount inside the build container
    pub fn target_path(&self) -> &str {
        match self {
            Self::Target(target) => target,
            Self::Mount(opts) => &opts.target,
        }
    }

    /// Render the value of the `--mount=` flag
    pub fn mount_args(&self) -> String {
        let opts = match self {
            Self::Target(target) => return format!("type=cache,target={}", target),
            Self::Mount(opts) => opts,
        };

        let mut parts = vec!["type=cache".to_string(), format!("target={}", opts.target)];
        if let Some(ref id) = opts.id {
            parts.push(format!("id={}", id));
        }
        if let Some(sharing) = opts.sharing {
            parts.push(format!("sharing={}", sharing));
        }
        if let Some(ref from) = opts.from {
            parts.push(format!("from={}", from));
        }
        if let Some(ref source) = opts.source {
            parts.push(format!("source={}", source));
        }
        if let Some(ref mode) = opts.mode {
            parts.push(format!("mode={}", mode));
        }
        if let Some(uid) = opts.uid {
            parts.push(format!("uid={}", uid));
        }
        if let Some(gid) = opts.gid {
            parts.push(format!("gid={}", gid));
        }
        if opts.readonly {
            parts.push("readonly".to_string());
        }
        parts.join(",")
    }
}

// A string is a bare target; a table is `MountOptions`.
impl<'de> Deserialize<'de> for CacheOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CacheOptionsVisitor;

        impl<'de> Visitor<'de> for CacheOptionsVisitor {
            type Value = CacheOptions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a target path or a table of cache mount options")
            }

            fn visit_str<E: de::Error>(self, target: &str) -> Result<CacheOptions, E> {
                Ok(CacheOptions::Target(target.to_string()))
            }

            fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<CacheOptions, A::Error> {
                MountOptions::deserialize(MapAccessDeserializer::new(access)).map(CacheOptions::Mount)
            }
        }

        deserializer.deserialize_any(CacheOptionsVisitor)
    }
}

/// A host directory paired with the cache mount it receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Host directory the cache contents are copied into
    pub source: PathBuf,
    /// Cache mount options
    pub options: CacheOptions,
}

impl CacheEntry {
    pub fn new(source: impl Into<PathBuf>, options: CacheOptions) -> Self {
        Self {
            source: source.into(),
            options,
        }
    }

    pub fn target_path(&self) -> &str {
        self.options.target_path()
    }

    pub fn mount_args(&self) -> String {
        self.options.mount_args()
    }
}

/// Ordered mapping of host cache directories to cache options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMap {
    entries: Vec<CacheEntry>,
}

impl CacheMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `source -> options`
    ///
    /// Blank input and `null` yield an empty map.
    pub fn from_json(input: &str) -> DanceResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::new());
        }

        serde_json::from_str(trimmed).map_err(|e| DanceError::CacheMapInvalid(e.to_string()))
    }

    /// Build a single-entry map from the legacy source/target pair
    pub fn from_legacy(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            entries: vec![CacheEntry::new(source, CacheOptions::Target(target.into()))],
        }
    }

    /// Append an entry, rejecting a source that is already present
    pub fn insert(&mut self, source: impl Into<PathBuf>, options: CacheOptions) -> DanceResult<()> {
        let source = source.into();
        if self.get(&source).is_some() {
            return Err(DanceError::DuplicateCacheSource(source));
        }
        self.entries.push(CacheEntry::new(source, options));
        Ok(())
    }

    pub fn get(&self, source: &Path) -> Option<&CacheOptions> {
        self.entries
            .iter()
            .find(|e| e.source == source)
            .map(|e| &e.options)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CacheEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a CacheMap {
    type Item = &'a CacheEntry;
    type IntoIter = std::slice::Iter<'a, CacheEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> Deserialize<'de> for CacheMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CacheMapVisitor;

        impl<'de> Visitor<'de> for CacheMapVisitor {
            type Value = CacheMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of cache source directories to cache options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CacheMap, A::Error> {
                let mut map = CacheMap::new();
                while let Some(source) = access.next_key::<PathBuf>()? {
                    let options = access.next_value::<CacheOptions>().map_err(|e| {
                        de::Error::custom(format!("{}: {}", source.display(), e))
                    })?;
                    map.insert(source, options).map_err(de::Error::custom)?;
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(CacheMapVisitor)
    }
}
