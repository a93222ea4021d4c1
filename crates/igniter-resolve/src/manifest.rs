//! Candidate manifests: flat capability-key to candidate-id listings merged
//! across one or more text sources.
//!
//! Each source is a properties-style resource where a line reads
//! `capability-key=id1,id2,...`. Lines starting with `#` are comments and a
//! trailing `\` continues the value on the next line. Multiple sources may
//! define the same key; their values are concatenated in source-discovery
//! order and deduplicated without reordering the first occurrence.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::ResolveError;

/// Identifier of an optional module eligible for activation.
pub type CandidateId = String;

/// One key/value text resource contributing candidate listings.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    pub name: String,
    pub contents: String,
}

impl ManifestSource {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), contents))
    }
}

/// Parse a properties-style resource into `(key, value, line)` triples.
///
/// Shared by the candidate manifest and the metadata resource so both speak
/// the same format.
pub(crate) fn parse_properties(
    source_name: &str,
    contents: &str,
) -> Result<Vec<(String, String, usize)>, ResolveError> {
    let mut out = Vec::new();
    let mut pending = String::new();
    let mut start_line = 0usize;
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if pending.is_empty() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            start_line = idx + 1;
        }
        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped.trim_end());
            continue;
        }
        pending.push_str(line);
        let logical = std::mem::take(&mut pending);
        let Some((key, value)) = logical.split_once('=') else {
            return Err(ResolveError::MalformedManifest {
                source_name: source_name.to_string(),
                line: start_line,
                reason: format!("expected 'key=value', got '{logical}'"),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ResolveError::MalformedManifest {
                source_name: source_name.to_string(),
                line: start_line,
                reason: "empty key".to_string(),
            });
        }
        out.push((key.to_string(), value.trim().to_string(), start_line));
    }
    if !pending.is_empty() {
        return Err(ResolveError::MalformedManifest {
            source_name: source_name.to_string(),
            line: start_line,
            reason: "dangling line continuation".to_string(),
        });
    }
    Ok(out)
}

/// The merged, immutable capability-key to candidate listing.
#[derive(Debug, Default)]
pub struct CandidateManifest {
    entries: IndexMap<String, Vec<CandidateId>>,
}

impl CandidateManifest {
    fn merge_source(&mut self, source: &ManifestSource) -> Result<(), ResolveError> {
        for (key, value, _line) in parse_properties(&source.name, &source.contents)? {
            let ids = self.entries.entry(key).or_default();
            for id in value.split(',') {
                let id = id.trim();
                if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> &[CandidateId] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Loads candidate listings on demand and memoizes the parsed manifest for
/// the lifetime of the registry. The registry is read-only after the first
/// load, so independent bootstrap attempts may share it without locking.
#[derive(Debug)]
pub struct CandidateRegistry {
    sources: Vec<ManifestSource>,
    cache: OnceCell<CandidateManifest>,
}

impl CandidateRegistry {
    pub fn new(sources: Vec<ManifestSource>) -> Self {
        Self {
            sources,
            cache: OnceCell::new(),
        }
    }

    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self, ResolveError> {
        let sources = paths
            .into_iter()
            .map(ManifestSource::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sources))
    }

    fn manifest(&self) -> Result<&CandidateManifest, ResolveError> {
        self.cache.get_or_try_init(|| {
            let mut manifest = CandidateManifest::default();
            for source in &self.sources {
                manifest.merge_source(source)?;
            }
            log::trace!(
                "parsed {} manifest source(s) into {} capability key(s)",
                self.sources.len(),
                manifest.entries.len()
            );
            Ok(manifest)
        })
    }

    /// Candidate ids for `key`, merged across sources in discovery order.
    /// An unknown key yields an empty slice.
    pub fn load(&self, key: &str) -> Result<&[CandidateId], ResolveError> {
        Ok(self.manifest()?.get(key))
    }

    /// As [`load`](Self::load), but fails when no source contributed any
    /// candidate for `key`.
    pub fn load_required(&self, key: &str) -> Result<&[CandidateId], ResolveError> {
        let ids = self.manifest()?.get(key);
        if ids.is_empty() {
            return Err(ResolveError::MissingCapability(key.to_string()));
        }
        Ok(ids)
    }
}
