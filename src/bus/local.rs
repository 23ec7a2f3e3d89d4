//! In-process request/reply bus.
//!
//! # Responsibilities
//! - Register responders per subject
//! - Deliver a request to the subject's responder and await its reply
//! - Enforce the configured request timeout
//!
//! # Design Decisions
//! - One bounded mpsc queue per subject; replies travel on a oneshot
//! - A later subscription to the same subject replaces the earlier one
//! - A full subject queue waits, bounded by the same timeout

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::bus::{BusError, MessageBus};

/// A request delivered to a subscriber, carrying its reply channel.
#[derive(Debug)]
pub struct Envelope {
    pub subject: String,
    pub payload: Bytes,
    reply: oneshot::Sender<Bytes>,
}

impl Envelope {
    /// Send the reply. Returns false if the requester stopped waiting.
    pub fn respond(self, payload: impl Into<Bytes>) -> bool {
        self.reply.send(payload.into()).is_ok()
    }
}

/// Request/reply bus living inside the gateway process.
#[derive(Debug)]
pub struct LocalBus {
    subjects: RwLock<HashMap<String, mpsc::Sender<Envelope>>>,
    timeout: Duration,
}

impl LocalBus {
    pub fn new(timeout: Duration) -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Subscribe to a subject, receiving its requests on the returned queue.
    pub fn subscribe(&self, subject: impl Into<String>, capacity: usize) -> mpsc::Receiver<Envelope> {
        let subject = subject.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tracing::debug!(subject = %subject, "Bus subscription registered");
        self.subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject, tx);
        rx
    }

    /// Remove a subject's responder. Pending requests fail with `Closed`.
    pub fn unsubscribe(&self, subject: &str) -> bool {
        self.subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject)
            .is_some()
    }

    /// Serve a subject with an async handler, one task per request.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn serve<F, Fut>(&self, subject: impl Into<String>, handler: F)
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Bytes> + Send + 'static,
    {
        let subject = subject.into();
        let mut requests = self.subscribe(subject.clone(), 64);
        let handler = std::sync::Arc::new(handler);

        tokio::spawn(async move {
            while let Some(envelope) = requests.recv().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let reply = handler(envelope.payload.clone()).await;
                    if !envelope.respond(reply) {
                        tracing::debug!("Requester gone before reply was sent");
                    }
                });
            }
            tracing::debug!(subject = %subject, "Bus responder stopped");
        });
    }

    fn sender(&self, subject: &str) -> Option<mpsc::Sender<Envelope>> {
        self.subjects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned()
    }

    async fn exchange(&self, subject: &str, payload: Bytes) -> Result<Bytes, BusError> {
        let no_responders = || BusError::NoResponders {
            subject: subject.to_string(),
        };
        let sender = self.sender(subject).ok_or_else(no_responders)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            subject: subject.to_string(),
            payload,
            reply: reply_tx,
        };

        let exchange = async {
            sender.send(envelope).await.map_err(|_| no_responders())?;
            reply_rx.await.map_err(|_| BusError::Closed {
                subject: subject.to_string(),
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BusError::Timeout {
                subject: subject.to_string(),
                after: self.timeout,
            }),
        }
    }
}

impl MessageBus for LocalBus {
    fn request<'a>(
        &'a self,
        subject: &'a str,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<Bytes, BusError>> {
        self.exchange(subject, payload).boxed()
    }
}
