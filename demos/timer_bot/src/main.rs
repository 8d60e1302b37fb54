//! Timer Bot demo
//!
//! Wires the kiln dispatch engine against an in-memory transport and walks
//! a scripted conversation through it: a viewer pinging the bot, a
//! moderator managing timers, and a few denied or malformed invocations.
//!
//! ```bash
//! cargo run --package timer-bot
//! ```

mod commands;
mod timers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use kiln::prelude::*;
use kiln::{BoxError, KilnConfig, LoggingBuilder, PermissionResolver};

use commands::BotStatus;
use timers::TimerStore;

/// Maps known user ids to levels; everyone else is a viewer.
struct DemoPermissions {
    levels: HashMap<String, PermissionLevel>,
}

#[async_trait]
impl PermissionResolver for DemoPermissions {
    async fn resolve(&self, user: &ChatUser, _scope: &Scope) -> PermissionLevel {
        self.levels.get(&user.id).copied().unwrap_or_default()
    }
}

/// Prints replies the way a chat client would show them.
struct ConsoleTransport;

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn deliver(
        &self,
        scope: &Scope,
        invoker: &ChatUser,
        reply: &Reply,
    ) -> Result<(), BoxError> {
        if reply.reply_to_invoker {
            println!("[#{}] @{}: {}", scope.name, invoker.login, reply.text);
        } else {
            println!("[#{}] {}", scope.name, reply.text);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = KilnConfig::load()?;
    LoggingBuilder::from_config(&config.logging).init();

    let mut registry = CommandRegistry::new();
    commands::register(&mut registry)?;

    let permissions = DemoPermissions {
        levels: HashMap::from([("2".to_string(), PermissionLevel::Moderator)]),
    };

    let dispatcher = config
        .apply(Dispatcher::builder(registry))
        .permissions(Arc::new(permissions))
        .service(Arc::new(TimerStore::new()))
        .service(Arc::new(BotStatus {
            started: Instant::now(),
        }))
        .build();

    let runtime = KilnRuntime::new(dispatcher, Arc::new(ConsoleTransport));

    let viewer = ChatUser::new("1", "alice");
    let moderator = ChatUser::new("2", "brook");
    let chan = Scope::new("10", "somechannel");

    let script = [
        (&viewer, "!ping"),
        (&moderator, "!timer create greet Hello chat --interval=30"),
        (&moderator, "!timers list"),
        (&viewer, "!timer create mine I want one too"),
        (&moderator, "!timer bogus --nope"),
        (&viewer, "!ping"),
        (&moderator, "!timer delete greet"),
        (&viewer, "hello everyone"),
    ];

    let (tx, rx) = mpsc::channel(16);
    for (user, line) in script {
        info!(user = %user.login, %line, "Sending");
        tx.send(IncomingMessage::new(line, user.clone(), chan.clone()))
            .await?;
    }
    drop(tx);

    runtime.run(rx).await;
    Ok(())
}
