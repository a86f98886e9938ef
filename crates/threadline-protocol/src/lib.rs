//! Event envelopes consumed by the threadline engine.
//!
//! The event stream delivers one JSON object per mutation. Envelopes are typed
//! here, but the polymorphic payloads inside them (message info, parts,
//! session info, permissions) are kept raw until the core crate decodes them
//! at the store boundary.

mod event;

pub use event::*;
