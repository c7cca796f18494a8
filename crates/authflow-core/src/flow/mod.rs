//! The flow engine.
//!
//! `classify` + `dispatch` + `capture` + `driver` form the automaton that
//! walks an external identity provider's sign-in and consent pages until an
//! OAuth callback URL is captured. `signin`, `activate`, and `invite` are the
//! related scripted flows used by the onboarding pipeline.

pub mod activate;
pub mod capture;
pub mod classify;
pub mod dispatch;
pub mod driver;
pub mod invite;
pub mod signin;
pub mod totp;

#[cfg(test)]
pub mod mock;

pub use capture::CaptureSlot;
pub use classify::PageState;
pub use dispatch::DispatchOutcome;
pub use driver::{FlowError, drive_callback_flow};
