//! `threadline replay`: feed a JSON-lines event log through the engine and
//! print the rendered buffer.

use anyhow::{bail, Context};
use std::path::PathBuf;
use std::sync::Arc;
use threadline_core::Session;
use threadline_protocol::ServerEvent;
use threadline_tui::render::line_text;
use threadline_tui::{
    spawn, DetachedService, Engine, EngineConfig, EngineEvent, SystemClipboard,
};
use tracing::{info, warn};

pub struct ReplayOptions {
    pub events: PathBuf,
    pub session: Option<String>,
    pub width: u16,
    pub height: u16,
    pub details: bool,
    pub thinking: bool,
    pub visible: bool,
}

/// Parse one event per non-empty line. Bad lines are reported and skipped.
pub fn parse_events(content: &str) -> Vec<ServerEvent> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match ServerEvent::from_json(line) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping unparseable event");
                eprintln!("Warning: line {}: {e}", idx + 1);
                None
            }
        })
        .collect()
}

/// Session of the first message in the log, else of the first event that has one.
fn infer_session(events: &[ServerEvent]) -> Option<String> {
    events
        .iter()
        .find(|e| matches!(e, ServerEvent::MessageUpdated { .. }))
        .and_then(ServerEvent::session_id)
        .or_else(|| events.iter().find_map(ServerEvent::session_id))
        .map(str::to_string)
}

pub async fn run(options: ReplayOptions, mut config: EngineConfig) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&options.events)
        .with_context(|| format!("Failed to read {}", options.events.display()))?;
    let events = parse_events(&content);

    let Some(session_id) = options.session.or_else(|| infer_session(&events)) else {
        bail!("No session found in {}; pass --session", options.events.display());
    };

    if options.details {
        config.show_tool_details = true;
    }
    if options.thinking {
        config.show_thinking = true;
    }

    info!(session_id = %session_id, events = events.len(), "Replaying event log");
    let engine = Engine::new(Session::new(session_id), config);
    let (handle, task) = spawn(
        engine,
        Arc::new(DetachedService),
        Box::new(SystemClipboard::new()),
    );

    handle.send(EngineEvent::Resize {
        width: options.width,
        height: options.height,
    });
    for event in events {
        handle.send(EngineEvent::Server(event));
    }
    let frame = handle
        .flush()
        .await
        .context("Engine stopped before rendering finished")?;
    handle.shutdown();
    task.await.context("Engine task failed")?;
    info!(
        passes = frame.passes,
        cache_hits = frame.cache.hits,
        cache_misses = frame.cache.misses,
        "Replay finished"
    );

    let lines = if options.visible {
        &frame.visible
    } else {
        frame.buffer.as_ref()
    };
    for line in lines {
        println!("{}", line_text(line).trim_end());
    }
    Ok(())
}
