//! Minimal pub-sub plumbing for sale events.
//!
//! Handlers only see the event they are given; they have no access to the store or the ledger. Each event is handled
//! on its own task, so a slow handler does not hold up the producers.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinSet},
};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight handler jobs to finish.
    pub async fn start_handler(self) {
        let Self { mut listener, sender, handler } = self;
        debug!("📬️ Event handler running");
        // Only producers keep the channel open from here on
        drop(sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = listener.recv().await {
            let handler = Arc::clone(&handler);
            jobs.spawn(async move { (handler)(ev).await });
            // Reap finished jobs so the set does not grow with the event count
            while let Some(done) = jobs.try_join_next() {
                report_panic(done);
            }
        }
        trace!("📬️ Channel closed. Waiting for {} event jobs", jobs.len());
        while let Some(done) = jobs.join_next().await {
            report_panic(done);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn report_panic(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("📬️ Event hook did not complete. {e}");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues `event` for the handler. Waits while the channel is full; an event sent after shutdown is dropped.
    pub async fn publish_event(&self, event: E) {
        if self.sender.send(event).await.is_err() {
            warn!("📬️ Event handler has shut down. Event dropped.");
        }
    }
}
