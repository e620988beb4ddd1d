//! `run <command>`: send raw text as the bot.
//!
//! Operators see the usage hint, but only owners may actually run anything.

use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct RunPlugin;

impl Plugin for RunPlugin {
    fn name(&self) -> &str {
        "run"
    }

    fn description(&self) -> &str {
        "执行命令功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("run")
                .description("执行指定命令")
                .usage(ctx.usage("run <命令>")),
            RunHandler,
        );
        Ok(())
    }
}

struct RunHandler;

#[async_trait]
impl CommandHandler for RunHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        if !ctx.bot.is_operator(ctx.user) {
            return Ok(());
        }
        if ctx.args.is_empty() {
            ctx.reply(format!(
                "请提供要执行的命令，格式：{} run <命令>",
                ctx.bot.config().commands.prefix
            ));
            return Ok(());
        }
        if !ctx.bot.is_owner(ctx.user) {
            warn!(user = ctx.user, "Non-owner tried to run a command");
            ctx.reply("你没有权限执行此命令");
            return Ok(());
        }

        let command = ctx.joined_args();
        info!(user = ctx.user, command = %command, "Running command");
        ctx.reply(format!("执行命令：{command}"));
        ctx.reply(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{OWNER, rig};
    use std::sync::Arc;

    #[tokio::test]
    async fn owner_runs_commands() {
        let mut rig = rig(Arc::new(RunPlugin)).await;
        assert!(rig.run(OWNER, "run", &["/weather", "clear"]).await);
        assert_eq!(rig.chats(), vec!["执行命令：/weather clear", "/weather clear"]);
    }

    #[tokio::test]
    async fn operators_who_are_not_owner_are_refused() {
        let mut rig = rig(Arc::new(RunPlugin)).await;
        rig.operate("alice");
        assert!(rig.run("alice", "run", &["/op", "alice"]).await);
        assert_eq!(rig.chats(), vec!["你没有权限执行此命令"]);
    }

    #[tokio::test]
    async fn usage_without_arguments() {
        let mut rig = rig(Arc::new(RunPlugin)).await;
        assert!(rig.run(OWNER, "run", &[]).await);
        assert_eq!(rig.chats(), vec!["请提供要执行的命令，格式：.zybot run <命令>"]);
    }
}
