//! Resource module
//!
//! Named GPU resources whose backing may arrive after they are first bound,
//! and the listener registry that tells parameter tables when that happens.

mod async_resource;
mod resource_listener;

pub use async_resource::{AsyncResource, ResourceId, TextureResource, BufferResource};
pub use resource_listener::{ResourceListener, ResourceListenerManager, ListenerKey};
