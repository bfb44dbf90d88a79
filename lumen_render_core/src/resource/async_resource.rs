/// Resources with asynchronously loaded GPU backing
///
/// A resource is created (and may be bound) before its GPU object exists. The
/// loader calls `complete_load` once the GPU object is ready, or `replace`
/// when the content changes; both notify the `ResourceListenerManager`, which
/// forwards the event to every listener depending on the resource during its
/// next `update()`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use crate::device::{GpuBuffer, GpuTexture};
use crate::resource::ResourceListenerManager;
use crate::engine_debug;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique resource identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Texture resource
pub type TextureResource = AsyncResource<dyn GpuTexture>;

/// Buffer resource
pub type BufferResource = AsyncResource<dyn GpuBuffer>;

/// Named resource whose GPU object may not exist yet
pub struct AsyncResource<T: ?Sized + Send + Sync> {
    id: ResourceId,
    name: String,
    gpu: RwLock<Option<Arc<T>>>,
    /// Bumped on every load or replacement
    version: AtomicU64,
}

impl<T: ?Sized + Send + Sync> AsyncResource<T> {
    /// Resource whose GPU object already exists
    pub fn new_loaded(name: impl Into<String>, gpu: Arc<T>) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            gpu: RwLock::new(Some(gpu)),
            version: AtomicU64::new(1),
        })
    }

    /// Resource still loading
    pub fn new_loading(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            gpu: RwLock::new(None),
            version: AtomicU64::new(0),
        })
    }

    /// Install the loaded GPU object and notify listeners
    pub fn complete_load(&self, gpu: Arc<T>, listeners: &ResourceListenerManager) {
        self.store(gpu);
        engine_debug!("lumen::AsyncResource", "'{}' loaded", self.name);
        listeners.notify_loaded(self.id);
    }

    /// Swap the GPU object for new content and notify listeners
    pub fn replace(&self, gpu: Arc<T>, listeners: &ResourceListenerManager) {
        self.store(gpu);
        engine_debug!("lumen::AsyncResource", "'{}' replaced", self.name);
        listeners.notify_changed(self.id);
    }

    fn store(&self, gpu: Arc<T>) {
        let mut slot = self.gpu.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(gpu);
        self.version.fetch_add(1, Ordering::Release);
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once a GPU object is available
    pub fn is_loaded(&self) -> bool {
        self.gpu().is_some()
    }

    /// Current GPU object (None while loading)
    pub fn gpu(&self) -> Option<Arc<T>> {
        self.gpu.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Number of loads/replacements so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl<T: ?Sized + Send + Sync> fmt::Debug for AsyncResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResource")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
#[path = "async_resource_tests.rs"]
mod tests;
