pub mod group;
pub mod identity;
pub mod run;
pub mod status;
pub mod task;
pub mod utils;
