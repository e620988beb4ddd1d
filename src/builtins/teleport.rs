//! `来我这`: have the bot `/tpa` to the caller.
//!
//! Refused while the bot is locked; see the `lock` plugin.

use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use tracing::debug;

pub struct TeleportPlugin;

impl Plugin for TeleportPlugin {
    fn name(&self) -> &str {
        "teleport"
    }

    fn description(&self) -> &str {
        "传送相关功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("来我这")
                .description("让机器人tpa到你的位置")
                .usage(ctx.usage("来我这")),
            ComeHereHandler,
        );
        Ok(())
    }
}

/// Sends a `/tpa` to the caller unless the bot is locked.
struct ComeHereHandler;

#[async_trait]
impl CommandHandler for ComeHereHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let lock = ctx.bot.lock_state();
        if lock.is_locked() {
            ctx.reply(format!(
                "机器人被{}锁定，锁定原因：{}",
                lock.locked_by(),
                lock.reason()
            ));
            return Ok(());
        }
        if !ctx.bot.is_operator(ctx.user) {
            return Ok(());
        }

        debug!(user = ctx.user, "Sending teleport request");
        ctx.reply(format!("正在为{}发送TPA请求...", ctx.user));
        ctx.reply(format!("/tpa {}", ctx.user));
        Ok(())
    }
}
