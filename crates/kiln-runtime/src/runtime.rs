//! The serve loop.
//!
//! [`KilnRuntime`] pulls incoming chat messages off a channel, dispatches
//! each one on its own task, and hands any reply to the [`ChatTransport`]
//! collaborator for delivery. Messages for different scopes and commands
//! therefore execute concurrently; all the serialization the engine needs
//! lives inside the dispatcher's cooldown tracker.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kiln_core::{BoxError, ChatUser, Scope};
use kiln_dispatch::{Dispatcher, Reply};

/// One raw chat line awaiting dispatch.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// The raw message text, prefix and all.
    pub text: String,
    /// Who sent it.
    pub user: ChatUser,
    /// Where it was sent.
    pub scope: Scope,
}

impl IncomingMessage {
    /// Bundles a raw line with its sender and scope.
    pub fn new(text: impl Into<String>, user: ChatUser, scope: Scope) -> Self {
        Self {
            text: text.into(),
            user,
            scope,
        }
    }
}

/// Delivers replies back to the chat network.
///
/// How a reply reaches the user (channel message, direct reply thread) is
/// the transport's concern; the runtime only forwards the dispatcher's
/// [`Reply`], including its `reply_to_invoker` marker.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Delivers one reply.
    async fn deliver(
        &self,
        scope: &Scope,
        invoker: &ChatUser,
        reply: &Reply,
    ) -> Result<(), BoxError>;
}

/// Orchestrates the dispatcher against a message source and a transport.
pub struct KilnRuntime {
    dispatcher: Arc<Dispatcher>,
    transport: Arc<dyn ChatTransport>,
    shutdown: CancellationToken,
}

impl KilnRuntime {
    /// Creates a runtime over a built dispatcher and a transport.
    pub fn new(dispatcher: Dispatcher, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            transport,
            shutdown: CancellationToken::new(),
        }
    }

    /// The dispatcher serving this runtime.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves messages until the channel closes or shutdown is requested.
    ///
    /// Each message is dispatched on its own task; in-flight invocations
    /// are drained before `run` returns.
    pub async fn run(&self, mut messages: mpsc::Receiver<IncomingMessage>) {
        info!(
            commands = self.dispatcher.registry().len(),
            prefix = self.dispatcher.prefix(),
            "Dispatch loop started"
        );

        let mut tasks: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, stopping dispatch loop");
                    break;
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
                next = messages.recv() => {
                    let Some(message) = next else {
                        debug!("Message channel closed, stopping dispatch loop");
                        break;
                    };
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let transport = Arc::clone(&self.transport);
                    tasks.spawn(async move {
                        let reply = dispatcher
                            .dispatch(&message.text, &message.user, &message.scope)
                            .await;
                        if let Some(reply) = reply
                            && let Err(error) =
                                transport.deliver(&message.scope, &message.user, &reply).await
                        {
                            warn!(%error, scope = %message.scope.name, "Failed to deliver reply");
                        }
                    });
                }
            }
        }

        while tasks.join_next().await.is_some() {}
        info!("Dispatch loop stopped");
    }
}

impl std::fmt::Debug for KilnRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KilnRuntime")
            .field("dispatcher", &self.dispatcher)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}
