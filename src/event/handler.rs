use crossterm::event::{Event as TermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::wizard::steps::StepEnvelope;
use crate::wizard::WizardStateProps;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
    /// Progress reported by a step task
    Step(StepEnvelope),
    /// A new wizard snapshot was published
    StateChanged,
}

/// Funnels terminal input, ticks, step messages and store changes into one
/// queue the main loop drains.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let event_tx = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut ticks = tokio::time::interval(tick_rate);

            loop {
                let event = tokio::select! {
                    _ = ticks.tick() => Event::Tick,
                    next = reader.next() => match next {
                        Some(Ok(TermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Some(Ok(TermEvent::Resize(_, _))) => Event::Resize,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!("Terminal read failed: {}", e);
                            continue;
                        }
                        None => break,
                    },
                };

                if event_tx.send(event).is_err() {
                    break;
                }
            }
            debug!("Terminal reader stopped");
        });

        Self { rx, tx }
    }

    /// Forward step task messages into the event queue.
    pub fn attach_steps(&self, mut steps: mpsc::UnboundedReceiver<StepEnvelope>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(envelope) = steps.recv().await {
                if tx.send(Event::Step(envelope)).is_err() {
                    break;
                }
            }
        });
    }

    /// Forward store change notifications into the event queue.
    pub fn attach_store(&self, mut changes: watch::Receiver<Arc<WizardStateProps>>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                if tx.send(Event::StateChanged).is_err() {
                    break;
                }
            }
        });
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
