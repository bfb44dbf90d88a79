/// Proxy/core object model
///
/// Every pipeline-visible object exists twice: a proxy owned by the caller
/// (usable from any thread) and a core object owned by the render thread. The
/// proxy never touches its core object directly. Once per frame,
/// `CoreObjectManager::sync_to_core` collects creation requests, dirty proxies'
/// sync blobs and destruction requests into one immutable `CoreSyncPacket`,
/// and `CoreThread::process_pending` applies it on the render thread.

mod async_op;
mod core_object;
mod core_object_manager;
mod core_thread;
mod sync_blob;

pub use async_op::{AsyncOp, is_core_thread};
pub(crate) use async_op::CoreThreadGuard;
pub use core_object::{CoreContext, CoreObject, CoreObjectId, CoreSyncSource};
pub use core_object_manager::{
    CoreObjectLink, CoreObjectManager, CoreObjectFactory, CoreCommand, CoreSyncPacket,
};
pub use core_thread::CoreThread;
pub use sync_blob::{FrameAlloc, SyncBlob, SyncData, SyncReader, SyncResource};
