use std::{
    collections::HashMap,
    fs::{DirEntry, File},
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::foundation::{
    core::ResourceId,
    error::{AtlasError, AtlasResult},
};

/// Open resource owned by whoever holds the box.
///
/// Every handle must be closed exactly once; [`crate::HandleGuard`] does that on drop for handles
/// stored in a build session.
pub trait ResourceHandle: Send {
    /// Location this handle was opened from.
    fn location(&self) -> &str;

    /// Read the full resource body.
    fn read_all(&mut self) -> AtlasResult<Vec<u8>>;

    /// Read the sidecar metadata attached to this resource, if any.
    fn metadata_bytes(&mut self) -> AtlasResult<Option<Vec<u8>>>;

    /// Release the underlying resource.
    fn close(&mut self) -> AtlasResult<()>;
}

/// Maps sprite ids to concrete locations and opens them.
pub trait ResourceResolver: Send + Sync {
    /// Resolve `id` to a location string understood by [`ResourceResolver::open`].
    fn resolve(&self, id: &ResourceId) -> String;

    /// Open `location`. Absent resources fail with [`AtlasError::ResourceNotFound`].
    fn open(&self, id: &ResourceId, location: &str) -> AtlasResult<Box<dyn ResourceHandle>>;
}

/// Extension of metadata sidecar files, appended to the full image file name.
pub const METADATA_EXTENSION: &str = "mcmeta";

#[derive(Debug, Default)]
struct HandleCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Resolver over a resource-pack style directory tree:
/// `<root>/<namespace>/<directory>/<path>.png`.
#[derive(Clone, Debug)]
pub struct FsResourceResolver {
    root: PathBuf,
    directory: String,
    counters: Arc<HandleCounters>,
}

impl FsResourceResolver {
    /// Resolver for sprites under `<root>/<namespace>/textures`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_directory(root, "textures")
    }

    /// Resolver for sprites under `<root>/<namespace>/<directory>`.
    pub fn with_directory(root: impl Into<PathBuf>, directory: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            directory: directory.into(),
            counters: Arc::default(),
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of handles opened so far.
    pub fn opened_handles(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Number of handles released so far.
    pub fn closed_handles(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Discover every `*.png` sprite below `<root>/<namespace>/<directory>`, sorted by id.
    pub fn discover(&self, namespace: &str) -> AtlasResult<Vec<ResourceId>> {
        let base = self.root.join(namespace).join(&self.directory);
        let mut out = Vec::new();
        collect_pngs(&base, &base, namespace, &mut out)?;
        out.sort();
        Ok(out)
    }
}

fn collect_pngs(
    base: &Path,
    dir: &Path,
    namespace: &str,
    out: &mut Vec<ResourceId>,
) -> AtlasResult<()> {
    let rd = std::fs::read_dir(dir).map_err(|source| AtlasError::Io {
        location: dir.display().to_string(),
        source,
    })?;
    for entry in rd {
        let Some(entry) = readable_entry(dir, entry) else {
            continue;
        };
        let path = entry.path();
        if path.is_dir() {
            collect_pngs(base, &path, namespace, out)?;
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) != Some("png") {
            continue;
        }
        let Ok(rel) = path.with_extension("").strip_prefix(base).map(Path::to_path_buf) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        match ResourceId::new(namespace, rel) {
            Ok(id) => out.push(id),
            Err(e) => tracing::warn!(path = %path.display(), "skipping sprite file: {e}"),
        }
    }
    Ok(())
}

fn readable_entry(dir: &Path, entry: std::io::Result<DirEntry>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "skipping unreadable directory entry: {e}");
            None
        }
    }
}

impl ResourceResolver for FsResourceResolver {
    fn resolve(&self, id: &ResourceId) -> String {
        self.root
            .join(id.namespace())
            .join(&self.directory)
            .join(format!("{}.png", id.path()))
            .display()
            .to_string()
    }

    fn open(&self, id: &ResourceId, location: &str) -> AtlasResult<Box<dyn ResourceHandle>> {
        let file = File::open(location).map_err(|source| match source.kind() {
            ErrorKind::NotFound => AtlasError::ResourceNotFound {
                id: id.clone(),
                location: location.to_string(),
            },
            _ => AtlasError::Io {
                location: location.to_string(),
                source,
            },
        })?;
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FsHandle {
            location: location.to_string(),
            file: Some(file),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FsHandle {
    location: String,
    file: Option<File>,
    counters: Arc<HandleCounters>,
}

impl FsHandle {
    fn closed_error(&self) -> AtlasError {
        AtlasError::Io {
            location: self.location.clone(),
            source: std::io::Error::other("resource handle already closed"),
        }
    }
}

impl ResourceHandle for FsHandle {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_all(&mut self) -> AtlasResult<Vec<u8>> {
        let Some(file) = self.file.as_mut() else {
            return Err(self.closed_error());
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|source| AtlasError::Io {
            location: self.location.clone(),
            source,
        })?;
        Ok(bytes)
    }

    fn metadata_bytes(&mut self) -> AtlasResult<Option<Vec<u8>>> {
        let meta = format!("{}.{METADATA_EXTENSION}", self.location);
        match std::fs::read(&meta) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AtlasError::Io {
                location: meta,
                source,
            }),
        }
    }

    fn close(&mut self) -> AtlasResult<()> {
        match self.file.take() {
            Some(file) => {
                drop(file);
                self.counters.closed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(self.closed_error()),
        }
    }
}

#[derive(Clone, Debug)]
struct MemoryEntry {
    bytes: Arc<Vec<u8>>,
    metadata: Option<Arc<Vec<u8>>>,
}

/// In-memory resolver, for hosts that already hold sprite bytes.
///
/// Locations are `memory:<id>`. Clones share handle counters.
#[derive(Clone, Debug, Default)]
pub struct MemoryResolver {
    entries: HashMap<String, MemoryEntry>,
    counters: Arc<HandleCounters>,
}

impl MemoryResolver {
    /// Empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the encoded image bytes of `id`.
    pub fn insert(&mut self, id: &ResourceId, bytes: Vec<u8>) {
        self.entries.insert(
            Self::location_of(id),
            MemoryEntry {
                bytes: Arc::new(bytes),
                metadata: None,
            },
        );
    }

    /// Register the encoded image bytes of `id` together with sidecar metadata.
    pub fn insert_with_metadata(&mut self, id: &ResourceId, bytes: Vec<u8>, metadata: Vec<u8>) {
        self.entries.insert(
            Self::location_of(id),
            MemoryEntry {
                bytes: Arc::new(bytes),
                metadata: Some(Arc::new(metadata)),
            },
        );
    }

    /// Number of handles opened so far.
    pub fn opened_handles(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Number of handles released so far.
    pub fn closed_handles(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    fn location_of(id: &ResourceId) -> String {
        format!("memory:{id}")
    }
}

impl ResourceResolver for MemoryResolver {
    fn resolve(&self, id: &ResourceId) -> String {
        Self::location_of(id)
    }

    fn open(&self, id: &ResourceId, location: &str) -> AtlasResult<Box<dyn ResourceHandle>> {
        let entry = self
            .entries
            .get(location)
            .ok_or_else(|| AtlasError::ResourceNotFound {
                id: id.clone(),
                location: location.to_string(),
            })?;
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            location: location.to_string(),
            entry: Some(entry.clone()),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MemoryHandle {
    location: String,
    entry: Option<MemoryEntry>,
    counters: Arc<HandleCounters>,
}

impl MemoryHandle {
    fn entry(&self) -> AtlasResult<&MemoryEntry> {
        self.entry.as_ref().ok_or_else(|| AtlasError::Io {
            location: self.location.clone(),
            source: std::io::Error::other("resource handle already closed"),
        })
    }
}

impl ResourceHandle for MemoryHandle {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_all(&mut self) -> AtlasResult<Vec<u8>> {
        Ok(self.entry()?.bytes.as_ref().clone())
    }

    fn metadata_bytes(&mut self) -> AtlasResult<Option<Vec<u8>>> {
        Ok(self.entry()?.metadata.as_deref().cloned())
    }

    fn close(&mut self) -> AtlasResult<()> {
        self.entry()?;
        self.entry = None;
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resources/resolver.rs"]
mod tests;
