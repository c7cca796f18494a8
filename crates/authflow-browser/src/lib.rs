//! Browser session runtime for AuthFlow.
//!
//! This crate provides the capability boundary between the flow engine and a
//! live Chromium instance:
//! - [`PageSession`], the trait the flow engine drives pages through
//! - [`CdpSession`], the CDP-backed implementation on chromiumoxide with one
//!   persistent Chrome profile per identity
//! - [`dom`], the selector-to-JavaScript compiler used for DOM queries
//!
//! Selectors accepted by the session are standard CSS, extended with a
//! `tag:text('Needle')` form that matches elements by visible text content.
//! All presence/visibility checks are explicit boolean queries; nothing in
//! this crate throws to signal "element not found".

pub mod cdp;
pub mod dom;
pub mod session;

pub use cdp::{CdpSession, LaunchOptions};
pub use session::PageSession;
