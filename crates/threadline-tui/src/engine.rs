//! Engine state and its event handlers.
//!
//! [`Engine`] owns the store, cache, scheduler and viewport. Handlers never
//! block or spawn; they return [`Effect`]s which the actor carries out and
//! later answers with a completion (`on_render_done`, `on_service_done`,
//! `on_tick`).

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use threadline_core::revert::{redo_target, undo_target};
use threadline_core::{
    apply_event, Applied, Message, MessagePart, MessageStore, MessageWithParts, Permission,
    PermissionQueue, RevertRequest, RevertState, Session, TextPart, UserMessage,
};
use threadline_protocol::ServerEvent;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, PartCache};
use crate::config::EngineConfig;
use crate::format::{Formatter, PlainFormatter};
use crate::render::{RenderFlags, RenderOutput, RenderSnapshot};
use crate::scheduler::RenderScheduler;
use crate::selection::{extract_text, SelectionMapper, SelectionRange};
use crate::service::{ServiceCall, ServiceOutcome};
use crate::theme::Theme;
use crate::toast::{Toast, ToastQueue};
use crate::viewport::Viewport;

const DEFAULT_WIDTH: u16 = 80;
const DEFAULT_HEIGHT: u16 = 24;

/// Input delivered to the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Server(ServerEvent),
    Command(Command),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    /// Switch to another session with a fresh message list.
    LoadSession {
        session: Session,
        messages: Vec<MessageWithParts>,
    },
}

/// User-initiated actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
    ToggleToolDetails,
    ToggleThinking,
    SetTheme(String),
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    JumpToMessage(String),
    /// Show a prompt before the server confirms it. The server echoes the same
    /// message id, so confirmation updates it in place.
    SendPrompt { message_id: String, text: String },
    CopySelection,
    ClearSelection,
}

/// Work the caller must perform on the engine's behalf.
pub enum Effect {
    Render(Box<RenderSnapshot>),
    Call(ServiceCall),
    ArmTick(Duration),
    Copy(String),
}

/// Everything the draw layer needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    /// The whole rendered buffer.
    pub buffer: Arc<Vec<Line<'static>>>,
    /// Visible window with the selection highlighted.
    pub visible: Vec<Line<'static>>,
    pub offset: usize,
    pub tail_follow: bool,
    pub message_offsets: HashMap<String, usize>,
    pub selection: Option<SelectionRange>,
    pub toasts: Vec<Toast>,
    pub revert: RevertState,
    /// Most recent text handed to the clipboard.
    pub clipboard: Option<String>,
    pub passes: u64,
    pub cache: CacheStats,
}

pub struct Engine {
    config: EngineConfig,
    session: Session,
    /// Child sessions seen through `SessionUpdated`; their permissions count.
    children: HashSet<String>,
    store: MessageStore,
    permissions: PermissionQueue,
    /// Fetched child-session messages keyed by permission id.
    previews: HashMap<String, MessageWithParts>,
    cache: PartCache,
    scheduler: RenderScheduler,
    viewport: Viewport,
    selection: SelectionMapper,
    toasts: ToastQueue,
    theme: Theme,
    formatter: Arc<dyn Formatter>,
    width: u16,
    frame: usize,
    tick_armed: bool,
    revert_in_flight: bool,
    clipboard: Option<String>,
    frame_dirty: bool,
}

impl Engine {
    pub fn new(session: Session, config: EngineConfig) -> Self {
        let theme = Theme::by_name(&config.theme);
        Self {
            store: MessageStore::new(session.id.clone()),
            session,
            children: HashSet::new(),
            permissions: PermissionQueue::new(),
            previews: HashMap::new(),
            cache: PartCache::new(),
            scheduler: RenderScheduler::new(),
            viewport: Viewport::new(usize::from(DEFAULT_HEIGHT)),
            selection: SelectionMapper::new(Rect::new(0, 0, DEFAULT_WIDTH, DEFAULT_HEIGHT)),
            toasts: ToastQueue::default(),
            theme,
            formatter: Arc::new(PlainFormatter),
            width: DEFAULT_WIDTH,
            frame: 0,
            tick_armed: false,
            revert_in_flight: false,
            clipboard: None,
            frame_dirty: true,
            config,
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn cache(&self) -> &PartCache {
        &self.cache
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn permissions(&self) -> &PermissionQueue {
        &self.permissions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn revert_state(&self) -> RevertState {
        RevertState::from_session(&self.session)
    }

    /// No render pass is running.
    pub fn is_idle(&self) -> bool {
        !self.scheduler.is_rendering()
    }

    pub fn handle(&mut self, event: EngineEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            EngineEvent::Server(event) => self.on_server_event(event, &mut effects),
            EngineEvent::Command(command) => self.on_command(command, &mut effects),
            EngineEvent::Mouse(mouse) => self.on_mouse(mouse, &mut effects),
            EngineEvent::Resize { width, height } => self.on_resize(width, height, &mut effects),
            EngineEvent::LoadSession { session, messages } => {
                self.load_session(session, messages, &mut effects)
            }
        }
        effects
    }

    fn request_render(&mut self, effects: &mut Vec<Effect>) {
        if self.scheduler.request() {
            effects.push(Effect::Render(Box::new(self.render_snapshot())));
        }
    }

    fn render_snapshot(&self) -> RenderSnapshot {
        let pending = self
            .permissions
            .iter()
            .filter_map(|p| p.call_id.clone().map(|call| (call, p.clone())))
            .collect();
        let previews = self
            .permissions
            .iter()
            .filter_map(|p| self.previews.get(&p.id).map(|m| (p.clone(), m.clone())))
            .collect();
        RenderSnapshot {
            generation: self.cache.generation(),
            cache: self.cache.snapshot(),
            messages: self.store.messages().to_vec(),
            revert: self.session.revert.clone(),
            flags: RenderFlags {
                width: self.width,
                show_tool_details: self.config.show_tool_details,
                show_thinking: self.config.show_thinking,
            },
            theme: self.theme.clone(),
            formatter: Arc::clone(&self.formatter),
            pending,
            previews,
            frame: self.frame,
            max_tool_output_lines: self.config.max_tool_output_lines,
        }
    }

    fn on_server_event(&mut self, event: ServerEvent, effects: &mut Vec<Effect>) {
        match apply_event(&mut self.store, event) {
            Applied::Store {
                outcome,
                invalidates_cache,
            } => {
                if invalidates_cache {
                    self.cache.clear("part removed");
                }
                if outcome.changed() {
                    self.request_render(effects);
                }
            }
            Applied::Session(session) => self.on_session_info(session, effects),
            Applied::PermissionUpdated(permission) => self.on_permission(permission, effects),
            Applied::PermissionReplied { permission_id, .. } => {
                if self.permissions.reply(&permission_id).is_some() {
                    self.previews.remove(&permission_id);
                    self.request_render(effects);
                }
            }
            Applied::Dropped => {}
        }
    }

    fn on_session_info(&mut self, session: Session, effects: &mut Vec<Effect>) {
        if session.id == self.session.id {
            if session != self.session {
                // The server's revert pointer wins, including one moved by
                // another client while a local request is in flight.
                self.session = session;
                self.frame_dirty = true;
                self.request_render(effects);
            }
        } else if session.is_related(&self.session.id) {
            if self.children.insert(session.id.clone()) {
                debug!(session_id = %session.id, "Tracking child session");
            }
        } else {
            debug!(session_id = %session.id, "Ignored info for unrelated session");
        }
    }

    fn on_permission(&mut self, permission: Permission, effects: &mut Vec<Effect>) {
        let own = permission.session_id == self.session.id;
        if !own && !self.children.contains(&permission.session_id) {
            debug!(permission_id = %permission.id, "Ignored permission for unrelated session");
            return;
        }
        if !own && !self.previews.contains_key(&permission.id) {
            effects.push(Effect::Call(ServiceCall::FetchMessage {
                session_id: permission.session_id.clone(),
                message_id: permission.message_id.clone(),
                permission_id: permission.id.clone(),
            }));
        }
        if self.permissions.push(permission) {
            self.request_render(effects);
        }
    }

    fn on_command(&mut self, command: Command, effects: &mut Vec<Effect>) {
        match command {
            Command::Undo => self.undo(effects),
            Command::Redo => self.redo(effects),
            Command::ToggleToolDetails => {
                self.config.show_tool_details = !self.config.show_tool_details;
                self.request_render(effects);
            }
            Command::ToggleThinking => {
                self.config.show_thinking = !self.config.show_thinking;
                self.request_render(effects);
            }
            Command::SetTheme(name) => {
                self.theme = Theme::by_name(&name);
                self.config.theme = self.theme.name.clone();
                self.cache.clear("theme changed");
                self.request_render(effects);
            }
            Command::ScrollUp(lines) => self.scroll(|v| v.scroll_up(lines)),
            Command::ScrollDown(lines) => self.scroll(|v| v.scroll_down(lines)),
            Command::PageUp => self.scroll(Viewport::page_up),
            Command::PageDown => self.scroll(Viewport::page_down),
            Command::ScrollToTop => self.scroll(Viewport::scroll_to_top),
            Command::ScrollToBottom => self.scroll(Viewport::scroll_to_bottom),
            Command::JumpToMessage(message_id) => {
                if !self.viewport.jump_to_message(&message_id) {
                    debug!(message_id = %message_id, "Jump target not in buffer");
                }
                self.frame_dirty = true;
            }
            Command::SendPrompt { message_id, text } => self.send_prompt(message_id, text, effects),
            Command::CopySelection => {
                if let Some(range) = self.selection.current() {
                    self.copy(&range, effects);
                }
            }
            Command::ClearSelection => {
                self.selection.clear();
                self.frame_dirty = true;
            }
        }
    }

    fn scroll(&mut self, f: impl FnOnce(&mut Viewport)) {
        f(&mut self.viewport);
        self.frame_dirty = true;
    }

    fn undo(&mut self, effects: &mut Vec<Effect>) {
        if self.refuse_overlapping_revert() {
            return;
        }
        match undo_target(self.store.messages(), &self.revert_state()) {
            Some(request) => self.send_revert(request, effects),
            None => self.notify(Toast::info("Nothing to undo")),
        }
    }

    fn redo(&mut self, effects: &mut Vec<Effect>) {
        if self.refuse_overlapping_revert() {
            return;
        }
        match redo_target(self.store.messages(), &self.revert_state()) {
            Some(request) => self.send_revert(request, effects),
            None => self.notify(Toast::info("Nothing to redo")),
        }
    }

    fn refuse_overlapping_revert(&mut self) -> bool {
        if self.revert_in_flight {
            self.notify(Toast::warning("A revert is already in progress"));
        }
        self.revert_in_flight
    }

    fn send_revert(&mut self, request: RevertRequest, effects: &mut Vec<Effect>) {
        let session_id = self.session.id.clone();
        let call = match request {
            RevertRequest::Revert { message_id } => {
                debug!(session_id = %session_id, message_id = %message_id, "Requesting revert");
                ServiceCall::Revert {
                    session_id,
                    message_id,
                    part_id: None,
                }
            }
            RevertRequest::Unrevert => {
                debug!(session_id = %session_id, "Requesting unrevert");
                ServiceCall::Unrevert { session_id }
            }
        };
        self.revert_in_flight = true;
        effects.push(Effect::Call(call));
    }

    fn send_prompt(&mut self, message_id: String, text: String, effects: &mut Vec<Effect>) {
        let session_id = self.session.id.clone();
        let mut part = TextPart::new(session_id.clone(), message_id.clone(), text);
        part.id = format!("{message_id}_prompt");
        let info = Message::User(UserMessage::with_id(message_id, session_id));
        let inserted = self.store.upsert_message(info).changed();
        let added = self.store.upsert_part(MessagePart::Text(part)).changed();
        if inserted || added {
            self.viewport.scroll_to_bottom();
            self.request_render(effects);
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent, effects: &mut Vec<Effect>) {
        let offset = self.viewport.offset();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.selection.press(mouse.column, mouse.row, offset)
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.selection.drag(mouse.column, mouse.row, offset)
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(range) = self.selection.release(mouse.column, mouse.row, offset) {
                    if self.config.copy_on_select {
                        self.copy(&range, effects);
                    }
                }
            }
            MouseEventKind::ScrollUp => self.viewport.scroll_up(self.config.scroll_step),
            MouseEventKind::ScrollDown => self.viewport.scroll_down(self.config.scroll_step),
            _ => return,
        }
        self.frame_dirty = true;
    }

    fn copy(&mut self, range: &SelectionRange, effects: &mut Vec<Effect>) {
        let text = extract_text(self.viewport.lines(), range);
        if text.is_empty() {
            return;
        }
        self.clipboard = Some(text.clone());
        effects.push(Effect::Copy(text));
    }

    fn on_resize(&mut self, width: u16, height: u16, effects: &mut Vec<Effect>) {
        self.selection.set_area(Rect::new(0, 0, width, height));
        self.viewport.set_height(usize::from(height));
        self.frame_dirty = true;
        if width != self.width {
            self.width = width;
            self.cache.clear("width changed");
            self.request_render(effects);
        }
    }

    fn load_session(
        &mut self,
        session: Session,
        messages: Vec<MessageWithParts>,
        effects: &mut Vec<Effect>,
    ) {
        info!(session_id = %session.id, messages = messages.len(), "Loading session");
        self.store.reset(session.id.clone(), messages);
        self.session = session;
        self.children.clear();
        self.permissions.clear();
        self.previews.clear();
        self.revert_in_flight = false;
        self.selection.clear();
        self.cache.clear("session switched");
        self.viewport.scroll_to_bottom();
        self.request_render(effects);
    }

    /// A render pass finished.
    pub fn on_render_done(&mut self, output: RenderOutput) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.cache.record_hits(output.cache_hits);
        self.cache.merge(output.generation, output.fresh);
        self.viewport.apply(output.lines, output.message_offsets);
        self.frame_dirty = true;

        if self.scheduler.complete() {
            effects.push(Effect::Render(Box::new(self.render_snapshot())));
        }
        if self.store.has_in_flight() && !self.tick_armed {
            self.tick_armed = true;
            effects.push(Effect::ArmTick(self.config.tick_interval()));
        }
        effects
    }

    /// The animation tick fired.
    pub fn on_tick(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.tick_armed = false;
        if !self.store.has_in_flight() {
            debug!("Nothing in flight, animation stopped");
            return effects;
        }
        self.frame = self.frame.wrapping_add(1);
        self.request_render(&mut effects);
        effects
    }

    /// A service call came back.
    pub fn on_service_done(&mut self, outcome: ServiceOutcome) -> Vec<Effect> {
        let mut effects = Vec::new();
        match outcome {
            ServiceOutcome::Reverted(Ok(session)) => {
                self.revert_in_flight = false;
                info!(
                    session_id = %session.id,
                    boundary = ?session.revert.as_ref().map(|r| r.message_id.as_str()),
                    "Revert confirmed"
                );
                self.on_session_info(session, &mut effects);
            }
            ServiceOutcome::Reverted(Err(e)) => {
                self.revert_in_flight = false;
                warn!(session_id = %self.session.id, error = %e, "Revert failed");
                self.notify(Toast::error("Revert failed").with_message(e.to_string()));
            }
            ServiceOutcome::Fetched {
                permission_id,
                result: Ok(message),
            } => {
                if self.permissions.iter().any(|p| p.id == permission_id) {
                    self.previews.insert(permission_id, message);
                    self.request_render(&mut effects);
                }
            }
            ServiceOutcome::Fetched {
                permission_id,
                result: Err(e),
            } => {
                warn!(permission_id = %permission_id, error = %e, "Preview fetch failed, omitting");
            }
        }
        effects
    }

    pub fn notify(&mut self, toast: Toast) {
        self.toasts.push(toast);
        self.frame_dirty = true;
    }

    /// Whether anything visible changed since the last frame was taken.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.frame_dirty)
    }

    pub fn frame(&mut self) -> FrameSnapshot {
        let selection = self.selection.current();
        let highlight = Style::default().add_modifier(Modifier::REVERSED);
        FrameSnapshot {
            buffer: Arc::clone(self.viewport.lines()),
            visible: self.viewport.visible(selection.as_ref(), highlight),
            offset: self.viewport.offset(),
            tail_follow: self.viewport.is_following(),
            message_offsets: self.viewport.message_offsets().clone(),
            selection,
            toasts: self.toasts.active().to_vec(),
            revert: self.revert_state(),
            clipboard: self.clipboard.clone(),
            passes: self.scheduler.passes(),
            cache: self.cache.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{line_text, render_pass};
    use crate::service::ServiceError;
    use crate::toast::ToastKind;
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use threadline_core::RevertInfo;
    use threadline_test_utils::builders::{user, AssistantBuilder};
    use threadline_test_utils::events;
    use threadline_test_utils::SESSION;

    fn engine() -> Engine {
        Engine::new(Session::new(SESSION), EngineConfig::default())
    }

    /// Run render effects inline until the scheduler is idle; return the rest.
    fn drive(engine: &mut Engine, effects: Vec<Effect>) -> Vec<Effect> {
        let mut pending = effects;
        let mut other = Vec::new();
        while let Some(effect) = pending.pop() {
            match effect {
                Effect::Render(snapshot) => {
                    pending.extend(engine.on_render_done(render_pass(&snapshot)));
                }
                effect => other.push(effect),
            }
        }
        other
    }

    fn send(engine: &mut Engine, event: EngineEvent) -> Vec<Effect> {
        let effects = engine.handle(event);
        drive(engine, effects)
    }

    fn buffer_text(engine: &mut Engine) -> String {
        engine
            .frame()
            .buffer
            .iter()
            .map(line_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn conversation() -> Vec<MessageWithParts> {
        vec![
            user("msg_01", "first question"),
            AssistantBuilder::new("msg_02").text("first answer").completed().build(),
            user("msg_03", "second question"),
            AssistantBuilder::new("msg_04").text("second answer").completed().build(),
        ]
    }

    fn loaded() -> Engine {
        let mut engine = engine();
        send(
            &mut engine,
            EngineEvent::LoadSession {
                session: Session::new(SESSION),
                messages: conversation(),
            },
        );
        engine
    }

    fn reverted_session(boundary: &str) -> Session {
        let mut session = Session::new(SESSION);
        session.revert = Some(RevertInfo {
            message_id: boundary.to_string(),
            part_id: None,
            snapshot: None,
            diff: None,
        });
        session
    }

    fn calls(effects: &[Effect]) -> Vec<&ServiceCall> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Call(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_events_render_into_buffer() {
        let mut engine = engine();
        for event in [
            events::user_message("msg_01"),
            events::text_part("msg_01", "prt_01", "hello", true),
            events::assistant_message("msg_02", true),
            events::text_part("msg_02", "prt_02", "hi there", true),
        ] {
            send(&mut engine, EngineEvent::Server(event));
        }
        let text = buffer_text(&mut engine);
        assert!(text.contains("┃ hello"));
        assert!(text.contains("  hi there"));
        assert_eq!(engine.frame().message_offsets.get("msg_01"), Some(&0));
    }

    #[test]
    fn test_requests_during_render_coalesce() {
        let mut engine = engine();
        let first = engine.handle(EngineEvent::Server(events::user_message("msg_01")));
        assert_eq!(first.len(), 1);
        for n in 0..5 {
            let effects = engine.handle(EngineEvent::Server(events::text_part(
                "msg_01",
                "prt_01",
                &format!("draft {n}"),
                false,
            )));
            assert!(effects.is_empty());
        }
        drive(&mut engine, first);
        assert_eq!(engine.scheduler().passes(), 2);
        assert!(buffer_text(&mut engine).contains("draft 4"));
    }

    #[test]
    fn test_unchanged_event_does_not_render() {
        let mut engine = engine();
        send(&mut engine, EngineEvent::Server(events::user_message("msg_01")));
        let effects = engine.handle(EngineEvent::Server(events::user_message("msg_01")));
        assert!(effects.is_empty());
        assert_eq!(engine.scheduler().passes(), 1);
    }

    #[test]
    fn test_undo_waits_for_confirmation() {
        let mut engine = loaded();
        let effects = send(&mut engine, EngineEvent::Command(Command::Undo));
        assert_eq!(
            calls(&effects),
            vec![&ServiceCall::Revert {
                session_id: SESSION.to_string(),
                message_id: "msg_03".to_string(),
                part_id: None,
            }]
        );
        assert_eq!(engine.revert_state(), RevertState::Normal);
        assert!(buffer_text(&mut engine).contains("second answer"));

        let effects = engine.on_service_done(ServiceOutcome::Reverted(Ok(reverted_session("msg_03"))));
        drive(&mut engine, effects);
        let text = buffer_text(&mut engine);
        assert!(!text.contains("second answer"));
        assert!(text.contains("2 messages reverted"));
        assert_eq!(
            engine.revert_state(),
            RevertState::Reverted {
                boundary: "msg_03".to_string()
            }
        );
    }

    #[test]
    fn test_redo_without_later_user_message_unreverts() {
        let mut engine = loaded();
        send(
            &mut engine,
            EngineEvent::Server(events::session_updated(Some("msg_03"))),
        );
        let effects = send(&mut engine, EngineEvent::Command(Command::Redo));
        assert_eq!(
            calls(&effects),
            vec![&ServiceCall::Unrevert {
                session_id: SESSION.to_string()
            }]
        );
        let effects = engine.on_service_done(ServiceOutcome::Reverted(Ok(Session::new(SESSION))));
        drive(&mut engine, effects);
        assert_eq!(engine.revert_state(), RevertState::Normal);
        assert!(buffer_text(&mut engine).contains("second answer"));
    }

    #[test]
    fn test_revert_failure_keeps_state_and_toasts() {
        let mut engine = loaded();
        send(&mut engine, EngineEvent::Command(Command::Undo));
        let effects = engine.on_service_done(ServiceOutcome::Reverted(Err(ServiceError::Request(
            "conflict".to_string(),
        ))));
        assert!(effects.is_empty());
        assert_eq!(engine.revert_state(), RevertState::Normal);
        let frame = engine.frame();
        let toast = frame.toasts.last().expect("toast");
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "Revert failed");
    }

    #[test]
    fn test_second_undo_while_pending_is_refused() {
        let mut engine = loaded();
        let first = send(&mut engine, EngineEvent::Command(Command::Undo));
        assert_eq!(calls(&first).len(), 1);
        let second = send(&mut engine, EngineEvent::Command(Command::Undo));
        assert!(calls(&second).is_empty());
        assert_eq!(
            engine.frame().toasts.last().map(|t| t.kind),
            Some(ToastKind::Warning)
        );
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut engine = engine();
        let effects = send(&mut engine, EngineEvent::Command(Command::Undo));
        assert!(effects.is_empty());
        assert_eq!(
            engine.frame().toasts.last().map(|t| t.title.clone()),
            Some("Nothing to undo".to_string())
        );
    }

    #[test]
    fn test_tick_runs_only_while_in_flight() {
        let mut engine = engine();
        let effects = send(
            &mut engine,
            EngineEvent::Server(events::assistant_message("msg_02", false)),
        );
        let ticks: Vec<&Effect> = effects
            .iter()
            .filter(|e| matches!(e, Effect::ArmTick(_)))
            .collect();
        assert_eq!(ticks.len(), 1);

        let effects = engine.on_tick();
        let rest = drive(&mut engine, effects);
        assert!(matches!(rest.as_slice(), [Effect::ArmTick(_)]));

        send(
            &mut engine,
            EngineEvent::Server(events::assistant_message("msg_02", true)),
        );
        assert!(engine.on_tick().is_empty());
    }

    #[test]
    fn test_width_change_clears_cache() {
        let mut engine = loaded();
        assert!(!engine.cache().is_empty());
        let generation = engine.cache().generation();
        let effects = engine.handle(EngineEvent::Resize {
            width: 60,
            height: 30,
        });
        assert_eq!(engine.cache().generation(), generation + 1);
        drive(&mut engine, effects);
        assert!(!engine.cache().is_empty());

        let effects = engine.handle(EngineEvent::Resize {
            width: 60,
            height: 10,
        });
        assert!(effects.is_empty());
        assert_eq!(engine.viewport().height(), 10);
    }

    #[test]
    fn test_theme_change_clears_cache() {
        let mut engine = loaded();
        assert!(!engine.cache().is_empty());
        let generation = engine.cache().generation();

        let effects = engine.handle(EngineEvent::Command(Command::SetTheme("nord".to_string())));
        assert_eq!(engine.cache().generation(), generation + 1);
        assert!(engine.cache().is_empty());
        assert_eq!(engine.config().theme, "nord");

        drive(&mut engine, effects);
        assert!(!engine.cache().is_empty());
        assert_eq!(engine.cache().generation(), generation + 1);
    }

    #[test]
    fn test_session_switch_clears_cache() {
        let mut engine = loaded();
        let generation = engine.cache().generation();

        let effects = engine.handle(EngineEvent::LoadSession {
            session: Session::new("ses_other"),
            messages: Vec::new(),
        });
        assert_eq!(engine.cache().generation(), generation + 1);
        assert!(engine.cache().is_empty());

        drive(&mut engine, effects);
        assert!(engine.store().is_empty());
        assert!(!buffer_text(&mut engine).contains("first question"));
    }

    #[test]
    fn test_unchanged_groups_hit_cache() {
        let mut engine = loaded();
        let misses = engine.frame().cache.misses;
        send(&mut engine, EngineEvent::Server(events::user_message("msg_05")));
        let stats = engine.frame().cache;
        assert!(stats.hits > 0);
        assert_eq!(stats.misses, misses);
    }

    #[test]
    fn test_part_removal_clears_cache() {
        let mut engine = loaded();
        let generation = engine.cache().generation();
        send(
            &mut engine,
            EngineEvent::Server(events::part_removed("msg_04", "msg_04_p01")),
        );
        assert_eq!(engine.cache().generation(), generation + 1);
        assert!(!buffer_text(&mut engine).contains("second answer"));
    }

    #[test]
    fn test_send_prompt_is_confirmed_in_place() {
        let mut engine = engine();
        send(
            &mut engine,
            EngineEvent::Command(Command::SendPrompt {
                message_id: "msg_09".to_string(),
                text: "run the tests".to_string(),
            }),
        );
        assert_eq!(engine.store().len(), 1);
        send(&mut engine, EngineEvent::Server(events::user_message("msg_09")));
        assert_eq!(engine.store().len(), 1);
        assert!(buffer_text(&mut engine).contains("┃ run the tests"));
    }

    #[test]
    fn test_child_permission_fetches_preview() {
        let mut engine = engine();
        send(
            &mut engine,
            EngineEvent::Server(ServerEvent::SessionUpdated {
                info: json!({"id": "ses_child", "parent_id": SESSION}),
            }),
        );
        let effects = send(
            &mut engine,
            EngineEvent::Server(ServerEvent::PermissionUpdated {
                permission: json!({
                    "id": "per_1",
                    "session_id": "ses_child",
                    "message_id": "msg_c1",
                    "call_id": "call_c1",
                    "type": "bash",
                    "title": "rm -rf target"
                }),
            }),
        );
        assert_eq!(
            calls(&effects),
            vec![&ServiceCall::FetchMessage {
                session_id: "ses_child".to_string(),
                message_id: "msg_c1".to_string(),
                permission_id: "per_1".to_string(),
            }]
        );
        assert_eq!(engine.permissions().len(), 1);

        let mut child = AssistantBuilder::new("msg_c1")
            .bash_with_status("rm -rf target", "Clean", threadline_core::ToolStatus::Pending)
            .build();
        if let MessagePart::Tool(tool) = &mut child.parts[0] {
            tool.call_id = "call_c1".to_string();
        }
        let effects = engine.on_service_done(ServiceOutcome::Fetched {
            permission_id: "per_1".to_string(),
            result: Ok(child),
        });
        drive(&mut engine, effects);
        let text = buffer_text(&mut engine);
        assert!(text.contains("Subtask needs permission (ses_child)"));
        assert!(text.contains("△ Permission required: rm -rf target"));

        send(
            &mut engine,
            EngineEvent::Server(ServerEvent::PermissionReplied {
                session_id: Some("ses_child".to_string()),
                permission_id: "per_1".to_string(),
            }),
        );
        assert!(!buffer_text(&mut engine).contains("Subtask needs permission"));
    }

    #[test]
    fn test_failed_preview_fetch_is_omitted() {
        let mut engine = loaded();
        send(
            &mut engine,
            EngineEvent::Server(ServerEvent::SessionUpdated {
                info: json!({"id": "ses_child", "parent_id": SESSION}),
            }),
        );
        send(
            &mut engine,
            EngineEvent::Server(ServerEvent::PermissionUpdated {
                permission: json!({
                    "id": "per_1",
                    "session_id": "ses_child",
                    "message_id": "msg_c1",
                    "call_id": "call_c1",
                    "type": "bash",
                    "title": "rm -rf target"
                }),
            }),
        );
        let effects = engine.on_service_done(ServiceOutcome::Fetched {
            permission_id: "per_1".to_string(),
            result: Err(ServiceError::NotFound("msg_c1".to_string())),
        });
        assert!(effects.is_empty());
        assert_eq!(engine.permissions().len(), 1);

        let passes = engine.scheduler().passes();
        send(
            &mut engine,
            EngineEvent::Server(events::text_part("msg_03", "prt_late", "still rendering", true)),
        );
        assert_eq!(engine.scheduler().passes(), passes + 1);
        let text = buffer_text(&mut engine);
        assert!(text.contains("still rendering"));
        assert!(!text.contains("Subtask needs permission"));
    }

    #[test]
    fn test_unrelated_permission_is_ignored() {
        let mut engine = engine();
        let effects = engine.handle(EngineEvent::Server(ServerEvent::PermissionUpdated {
            permission: json!({
                "id": "per_1",
                "session_id": "ses_other",
                "message_id": "msg_1",
                "type": "bash",
                "title": "ls"
            }),
        }));
        assert!(effects.is_empty());
        assert!(engine.permissions().is_empty());
    }

    #[test]
    fn test_mouse_drag_copies_selection() {
        let mut engine = loaded();
        send(&mut engine, EngineEvent::Resize { width: 80, height: 40 });
        engine.handle(EngineEvent::Command(Command::ScrollToTop));

        let mouse = |kind, column, row| {
            EngineEvent::Mouse(MouseEvent {
                kind,
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };
        engine.handle(mouse(MouseEventKind::Down(MouseButton::Left), 2, 0));
        engine.handle(mouse(MouseEventKind::Drag(MouseButton::Left), 10, 2));
        let effects = engine.handle(mouse(MouseEventKind::Up(MouseButton::Left), 13, 2));
        let copied: Vec<&String> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Copy(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(copied, vec![&"first question\n\n  first answer".to_string()]);
        let frame = engine.frame();
        assert_eq!(frame.clipboard.as_deref(), Some("first question\n\n  first answer"));
        assert!(frame.selection.is_some());
    }
}
