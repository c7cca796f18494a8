pub mod group;
pub mod identity;
pub mod run;

pub use group::Group;
pub use identity::{Identity, IdentityStatus};
pub use run::{RunKind, RunRecord, RunStatus};
