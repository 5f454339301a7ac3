//! Event plumbing between DOM handlers and the session task.
//!
//! - **[`Relay`]** - fan-out event stream, any number of subscribers
//! - **[`Actor`]** - owns a `Mutable<T>` and the task that updates it
//!
//! Relays follow the `{source}_{event}_relay` naming pattern.

pub mod actor;
pub mod relay;

pub use actor::Actor;
pub use relay::{Relay, relay};
