//! Error taxonomy for the interview engine.

mod live;
mod store;
mod task;

pub use live::LiveError;
pub use store::StoreError;
pub use task::TaskError;
