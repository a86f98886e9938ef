//! Conversation model and reconciliation for threadline.
//!
//! - [`message`] / [`session`] / [`permission`]: the typed data model
//! - [`decode`]: raw payload decoding at the store boundary
//! - [`store`]: the ordered message/part store
//! - [`applier`]: inbound events onto store operations
//! - [`revert`]: undo/redo targets and the revert summary

pub mod applier;
pub mod decode;
pub mod error;
pub mod message;
pub mod permission;
pub mod revert;
pub mod session;
pub mod store;

pub use applier::{apply_batch, apply_event, Applied};
pub use error::{DecodeError, DecodeResult};
pub use message::*;
pub use permission::{Permission, PermissionQueue};
pub use revert::{FileChange, RevertRequest, RevertState, RevertSummary};
pub use session::{MessageWithParts, RevertInfo, Session, SessionTime};
pub use store::{ApplyOutcome, MessageStore};
