//! Test fixtures for threadline.
//!
//! - **Builders**: typed conversations to load straight into a store
//! - **Events**: the same conversations as inbound wire events
//!
//! ```rust,ignore
//! use threadline_test_utils::builders::{user, AssistantBuilder};
//!
//! let messages = vec![
//!     user("msg_01", "list the files"),
//!     AssistantBuilder::new("msg_02").text("Sure.").bash("ls", "List files").completed().build(),
//! ];
//! ```

pub mod builders;
pub mod events;

/// Session id used by every fixture.
pub const SESSION: &str = "ses_test";
