//! The demo's command definitions.

use std::time::{Duration, Instant};

use kiln::prelude::*;
use kiln::RegistryResult;

use crate::timers::{Timer, TimerStore};

/// Process-level status the `ping` command reports on.
pub struct BotStatus {
    /// When the bot came up.
    pub started: Instant,
}

/// Registers every demo command.
pub fn register(registry: &mut CommandRegistry) -> RegistryResult<()> {
    registry.register(ping())?;
    registry.register(timer())?;
    Ok(())
}

/// `!ping` - small status reply, sent as a direct reply to the invoker.
pub fn ping() -> Command {
    Command::builder("ping")
        .description("Pings the user with some small info.")
        .cooldown(Duration::from_secs(20))
        .flag(CommandFlag::ReplyToInvoker)
        .handler(|ctx| async move {
            let status = ctx
                .service::<BotStatus>()
                .ok_or("bot status not wired into the dispatcher")?;
            let uptime = format_duration(status.started.elapsed());
            Ok(CommandOutcome::ok(format!("🕴️ Uptime {uptime}")))
        })
}

/// `!timer` - create, remove, list, enable and disable chat timers.
pub fn timer() -> Command {
    Command::builder("timer")
        .alias("timers")
        .description("Enable or disable chat timers")
        .long_description(
            "A timer is a message sent every X seconds to a channel.\n\
             !timer create|add <name> <message>\n\
             !timer delete|remove <name>\n\
             !timer list\n\
             !timer enable <name>\n\
             !timer disable <name>\n\
             --interval=<seconds>  Interval between messages, default 60.",
        )
        .permission(PermissionLevel::Moderator)
        .cooldown(Duration::from_secs(5))
        .param(ArgSpec::string("interval"))
        .handler(|ctx| async move {
            let store = ctx
                .service::<TimerStore>()
                .ok_or("timer store not wired into the dispatcher")?;

            let Some(action) = ctx.input.first() else {
                return Ok(CommandOutcome::fail(
                    "Specify something to do with timers... (!help timer)",
                ));
            };
            let args = &ctx.input[1..];
            let owner = ctx.scope.id.as_str();

            // `add` and `remove` are plain delegations; failures forward
            // by value all the way up.
            let result = match action.as_str() {
                "create" | "add" => create(&ctx, &store, args),
                "delete" | "remove" => delete(&store, owner, args),
                "list" => list(&store, owner),
                "enable" => set_enabled(&store, owner, args, true),
                "disable" => set_enabled(&store, owner, args, false),
                other => return Ok(CommandOutcome::fail(format!("Unknown action {other}"))),
            };

            Ok(match result {
                Ok(message) => CommandOutcome::ok(message),
                Err(message) => CommandOutcome::fail(message),
            })
        })
}

fn create(ctx: &CommandContext, store: &TimerStore, args: &[String]) -> Result<String, String> {
    let interval = match ctx.param_str("interval") {
        Some(raw) if !raw.is_empty() => raw
            .parse::<u64>()
            .map_err(|_| "Invalid interval".to_string())?,
        _ => 60,
    };
    if interval < 1 {
        return Err("Invalid interval".to_string());
    }
    // Anything shorter than 10s would spam the channel.
    let interval = interval.max(10);

    let Some((name, message)) = args.split_first() else {
        return Err("No name provided".to_string());
    };
    if message.is_empty() {
        return Err("No message provided".to_string());
    }

    store.create(
        &ctx.scope.id,
        Timer {
            name: name.clone(),
            interval_secs: interval,
            message: message.join(" "),
            enabled: true,
        },
    )?;
    Ok("Created timer :)".to_string())
}

fn delete(store: &TimerStore, owner: &str, args: &[String]) -> Result<String, String> {
    let Some(name) = args.first() else {
        return Err("No name provided".to_string());
    };
    store.delete(owner, name)?;
    Ok("Deleted timer :)".to_string())
}

fn list(store: &TimerStore, owner: &str) -> Result<String, String> {
    let entries: Vec<String> = store
        .list(owner)
        .into_iter()
        .map(|timer| format!("{} - {}s", timer.name, timer.interval_secs))
        .collect();

    if entries.is_empty() {
        Ok("No timers found".to_string())
    } else if entries.len() > 5 {
        Ok(format!(
            "{} timers: {} (+{} more)",
            entries.len(),
            entries[..5].join(", "),
            entries.len() - 5
        ))
    } else {
        Ok(format!("Timers: {}", entries.join(", ")))
    }
}

fn set_enabled(
    store: &TimerStore,
    owner: &str,
    args: &[String],
    enabled: bool,
) -> Result<String, String> {
    let Some(name) = args.first() else {
        return Err("No name provided".to_string());
    };
    store.set_enabled(owner, name, enabled)?;
    Ok(if enabled {
        "Enabled timer :)".to_string()
    } else {
        "Disabled timer :)".to_string()
    })
}

fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
