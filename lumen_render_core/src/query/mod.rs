/// GPU queries and their lifecycle
///
/// Queries live on the render thread. The `QueryManager` creates them, polls
/// the in-flight ones once per frame and defers their destruction until the
/// GPU no longer references them.

mod query;
mod query_manager;

pub use query::{Query, QueryCallback, QueryState};
pub use query_manager::{QueryKey, QueryManager};
