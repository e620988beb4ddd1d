//! `lock` / `unlock`: reserve the bot's teleport for one player.

use crate::bot::{LockOutcome, UnlockOutcome};
use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Pause between the lock report and the confirmation prompt so the two
/// lines are not interleaved with other output.
const CONFIRM_DELAY: Duration = Duration::from_millis(500);

pub struct LockPlugin;

impl Plugin for LockPlugin {
    fn name(&self) -> &str {
        "lock"
    }

    fn description(&self) -> &str {
        "锁定相关功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("lock")
                .description("锁定机器人传送功能")
                .usage(ctx.usage("lock <原因>")),
            LockHandler,
        );
        ctx.register_command(
            CommandSpec::new("unlock")
                .description("解锁机器人传送功能")
                .usage(ctx.usage("unlock")),
            UnlockHandler,
        );
        Ok(())
    }
}

struct LockHandler;

#[async_trait]
impl CommandHandler for LockHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let current = ctx.bot.lock_state();
        if current.is_locked() {
            ctx.reply(format!(
                "机器人已被{}锁定，锁定原因：{}",
                current.locked_by(),
                current.reason()
            ));
            return Ok(());
        }
        if ctx.args.is_empty() {
            ctx.reply(format!(
                "请输入锁定原因，格式：{} lock <原因>",
                ctx.bot.config().commands.prefix
            ));
            return Ok(());
        }

        let reason = ctx.joined_args();
        match ctx.bot.with_lock(|lock| lock.lock(ctx.user, &reason)) {
            LockOutcome::Locked => {
                info!(user = ctx.user, reason = %reason, "Bot locked");
                ctx.reply(format!("机器人已被{}锁定，锁定原因：{reason}", ctx.user));
            }
            LockOutcome::AlreadyLocked { by, reason } => {
                ctx.reply(format!("机器人已被{by}锁定，锁定原因：{reason}"));
            }
        }
        Ok(())
    }
}

struct UnlockHandler;

#[async_trait]
impl CommandHandler for UnlockHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        match ctx.bot.with_lock(|lock| lock.request_unlock(ctx.user)) {
            UnlockOutcome::NotLocked => {
                ctx.reply("机器人未锁定");
            }
            UnlockOutcome::Unlocked => {
                info!(user = ctx.user, "Bot unlocked");
                ctx.reply(format!("机器人已被{}解锁", ctx.user));
            }
            UnlockOutcome::ConfirmationRequired { by, reason } => {
                ctx.reply(format!("机器人被{by}锁定，锁定原因：{reason}"));
                tokio::time::sleep(CONFIRM_DELAY).await;
                ctx.reply(format!(
                    "如果你执意要解除，请再次输入 {} unlock 命令确认",
                    ctx.bot.config().commands.prefix
                ));
            }
        }
        Ok(())
    }
}
