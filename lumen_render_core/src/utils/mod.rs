mod sync;

pub(crate) use sync::lock;
