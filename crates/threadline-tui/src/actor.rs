//! Tokio actor around [`Engine`].
//!
//! One task owns the engine and drains an unbounded inbox. Render passes run
//! on the blocking pool, service calls and the animation tick on ordinary
//! tasks; every completion comes back through the same inbox. Frames are
//! published through a `watch` channel.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clipboard::ClipboardSink;
use crate::engine::{Effect, Engine, EngineEvent, FrameSnapshot};
use crate::render::{render_pass, RenderOutput};
use crate::service::{ServiceOutcome, SessionService};
use crate::toast::Toast;

enum ActorMessage {
    Event(EngineEvent),
    RenderDone(RenderOutput),
    ServiceDone(ServiceOutcome),
    Tick,
    /// Answered with the current frame once no render pass is running.
    Flush(oneshot::Sender<Arc<FrameSnapshot>>),
    Shutdown,
}

/// Cheap handle for feeding the actor and watching its frames.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<ActorMessage>,
    frames: watch::Receiver<Arc<FrameSnapshot>>,
}

impl EngineHandle {
    /// Queue an event. Returns `false` once the actor has stopped.
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx.send(ActorMessage::Event(event)).is_ok()
    }

    pub fn frames(&self) -> watch::Receiver<Arc<FrameSnapshot>> {
        self.frames.clone()
    }

    pub fn latest(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.frames.borrow())
    }

    /// Wait until every queued event is applied and rendering has settled.
    pub async fn flush(&self) -> Option<Arc<FrameSnapshot>> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(ActorMessage::Flush(tx)).ok()?;
        rx.await.ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(ActorMessage::Shutdown);
    }
}

struct Actor {
    engine: Engine,
    service: Arc<dyn SessionService>,
    clipboard: Box<dyn ClipboardSink>,
    /// Weak so that dropping every handle lets the inbox close.
    tx: mpsc::WeakUnboundedSender<ActorMessage>,
    frames: watch::Sender<Arc<FrameSnapshot>>,
    waiters: Vec<oneshot::Sender<Arc<FrameSnapshot>>>,
}

/// Start the actor on the current runtime.
pub fn spawn(
    engine: Engine,
    service: Arc<dyn SessionService>,
    clipboard: Box<dyn ClipboardSink>,
) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut engine = engine;
    let (frames_tx, frames_rx) = watch::channel(Arc::new(engine.frame()));
    let actor = Actor {
        engine,
        service,
        clipboard,
        tx: tx.downgrade(),
        frames: frames_tx,
        waiters: Vec::new(),
    };
    let task = tokio::spawn(actor.run(rx));
    (
        EngineHandle {
            tx,
            frames: frames_rx,
        },
        task,
    )
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ActorMessage>) {
        while let Some(message) = rx.recv().await {
            let effects = match message {
                ActorMessage::Event(event) => self.engine.handle(event),
                ActorMessage::RenderDone(output) => self.engine.on_render_done(output),
                ActorMessage::ServiceDone(outcome) => self.engine.on_service_done(outcome),
                ActorMessage::Tick => self.engine.on_tick(),
                ActorMessage::Flush(waiter) => {
                    self.waiters.push(waiter);
                    Vec::new()
                }
                ActorMessage::Shutdown => break,
            };
            for effect in effects {
                self.execute(effect);
            }
            self.publish();
        }
        debug!("Engine actor stopped");
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Copy(text) => match self.clipboard.set_text(&text) {
                Ok(()) => self.engine.notify(Toast::success("Copied to clipboard")),
                Err(e) => {
                    warn!(error = %e, "Clipboard write failed");
                    self.engine
                        .notify(Toast::error("Copy failed").with_message(e.to_string()));
                }
            },
            effect => {
                let Some(tx) = self.tx.upgrade() else {
                    return;
                };
                match effect {
                    Effect::Render(snapshot) => {
                        tokio::task::spawn_blocking(move || {
                            let output = render_pass(&snapshot);
                            let _ = tx.send(ActorMessage::RenderDone(output));
                        });
                    }
                    Effect::Call(call) => {
                        let service = Arc::clone(&self.service);
                        tokio::spawn(async move {
                            let outcome = call.execute(service.as_ref()).await;
                            let _ = tx.send(ActorMessage::ServiceDone(outcome));
                        });
                    }
                    Effect::ArmTick(interval) => {
                        tokio::spawn(async move {
                            tokio::time::sleep(interval).await;
                            let _ = tx.send(ActorMessage::Tick);
                        });
                    }
                    Effect::Copy(_) => {}
                }
            }
        }
    }

    fn publish(&mut self) {
        let idle = self.engine.is_idle();
        if self.engine.take_dirty() || (idle && !self.waiters.is_empty()) {
            let frame = Arc::new(self.engine.frame());
            self.frames.send_replace(Arc::clone(&frame));
            if idle {
                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(Arc::clone(&frame));
                }
            }
        }
    }
}
