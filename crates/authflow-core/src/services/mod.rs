pub mod locks;
pub mod outcome;
pub mod registry;

pub use locks::{RunLockGuard, RunLocks};
pub use outcome::{OutcomeSink, StorageOutcomeSink};
pub use registry::RunRegistry;
