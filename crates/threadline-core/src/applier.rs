//! Maps inbound events onto store operations.

use threadline_protocol::ServerEvent;
use tracing::{debug, warn};

use crate::decode::{decode_message, decode_part, decode_permission, decode_session};
use crate::error::DecodeError;
use crate::permission::Permission;
use crate::session::Session;
use crate::store::{ApplyOutcome, MessageStore};

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The store was touched (or deliberately left alone).
    Store {
        outcome: ApplyOutcome,
        /// Set for part removals: grouping of sibling parts may shift.
        invalidates_cache: bool,
    },
    /// Session info for any session; the caller decides whether it matters.
    Session(Session),
    PermissionUpdated(Permission),
    PermissionReplied {
        session_id: Option<String>,
        permission_id: String,
    },
    /// Payload could not be decoded; logged and skipped.
    Dropped,
}

impl Applied {
    fn store(outcome: ApplyOutcome) -> Self {
        Applied::Store {
            outcome,
            invalidates_cache: false,
        }
    }

    /// Whether the store content changed.
    pub fn store_changed(&self) -> bool {
        matches!(self, Applied::Store { outcome, .. } if outcome.changed())
    }
}

/// Apply one event to the store.
pub fn apply_event(store: &mut MessageStore, event: ServerEvent) -> Applied {
    let event_type = event.event_type();
    let applied = match event {
        ServerEvent::MessageUpdated { info } => match decode_message(info) {
            Ok(info) => Applied::store(store.upsert_message(info)),
            Err(e) => dropped(event_type, e),
        },
        ServerEvent::MessageRemoved {
            session_id,
            message_id,
        } => Applied::store(store.remove_message(&session_id, &message_id)),
        ServerEvent::PartUpdated { part } => match decode_part(part) {
            Ok(part) => Applied::store(store.upsert_part(part)),
            Err(e) => dropped(event_type, e),
        },
        ServerEvent::PartRemoved {
            session_id,
            message_id,
            part_id,
        } => {
            let outcome = store.remove_part(&session_id, &message_id, &part_id);
            Applied::Store {
                outcome,
                invalidates_cache: outcome == ApplyOutcome::Removed,
            }
        }
        ServerEvent::SessionUpdated { info } => match decode_session(info) {
            Ok(session) => Applied::Session(session),
            Err(e) => dropped(event_type, e),
        },
        ServerEvent::PermissionUpdated { permission } => match decode_permission(permission) {
            Ok(permission) => Applied::PermissionUpdated(permission),
            Err(e) => dropped(event_type, e),
        },
        ServerEvent::PermissionReplied {
            session_id,
            permission_id,
        } => Applied::PermissionReplied {
            session_id,
            permission_id,
        },
    };
    if let Applied::Store {
        outcome: ApplyOutcome::ForeignSession,
        ..
    } = applied
    {
        debug!(event_type, "Ignored event for another session");
    }
    applied
}

/// Apply events in order. One bad event never blocks the rest.
pub fn apply_batch(
    store: &mut MessageStore,
    events: impl IntoIterator<Item = ServerEvent>,
) -> Vec<Applied> {
    events
        .into_iter()
        .map(|event| apply_event(store, event))
        .collect()
}

fn dropped(event_type: &str, error: DecodeError) -> Applied {
    warn!(event_type, error = %error, "Dropped undecodable payload");
    Applied::Dropped
}
