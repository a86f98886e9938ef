//! Incremental conversation rendering for threadline.
//!
//! Inbound events are applied to a [`threadline_core::MessageStore`], rendered
//! into styled lines part group by part group, and exposed as a scrollable
//! buffer. [`Engine`] holds the state and is deterministic; [`spawn`] runs it
//! as a tokio actor that executes render passes and service calls off the
//! event loop.

pub mod actor;
pub mod cache;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod format;
pub mod render;
pub mod scheduler;
pub mod selection;
pub mod service;
pub mod text;
pub mod theme;
pub mod toast;
pub mod viewport;

pub use actor::{spawn, EngineHandle};
pub use cache::{BlockCache, CacheKey, PartCache};
pub use clipboard::{ClipboardError, ClipboardSink, SystemClipboard};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Command, Effect, Engine, EngineEvent, FrameSnapshot};
pub use format::{Formatter, PlainFormatter};
pub use render::{
    group_parts, render_pass, PartGroup, RenderFlags, RenderOutput, RenderSnapshot, RenderedBlock,
};
pub use scheduler::RenderScheduler;
pub use selection::{extract_text, SelectionMapper, SelectionRange, TextPoint};
pub use service::{DetachedService, ServiceCall, ServiceError, ServiceOutcome, SessionService};
pub use theme::Theme;
pub use toast::{Toast, ToastKind, ToastQueue};
pub use viewport::Viewport;
