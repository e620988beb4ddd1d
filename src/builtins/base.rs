//! Core commands: bot selection, help and raw command passthrough.

use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use tracing::info;

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn description(&self) -> &str {
        "核心功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("set-bot")
                .description("修改当前操作的机器人")
                .usage(ctx.usage("set-bot <id>")),
            SetBotHandler,
        );
        ctx.register_command(
            CommandSpec::new("help")
                .description("获取帮助信息")
                .usage(ctx.usage("help")),
            HelpHandler,
        );
        ctx.register_command(
            CommandSpec::new("run_command")
                .description("运行任意Minecraft命令")
                .usage(ctx.usage("run_command <command>")),
            RunCommandHandler,
        );
        Ok(())
    }
}

/// `set-bot <id>`: select (or deselect) this bot for the caller.
struct SetBotHandler;

#[async_trait]
impl CommandHandler for SetBotHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let Some(bot_id) = ctx.arg(0) else {
            ctx.reply(format!(
                "请提供机器人ID，格式：{} set-bot <id>",
                ctx.bot.config().commands.prefix
            ));
            return Ok(());
        };

        ctx.bot.select_bot(ctx.user, bot_id);
        ctx.reply(format!("你正在操作机器人{bot_id}"));
        Ok(())
    }
}

struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        for command in ctx.commands.list() {
            ctx.reply(format!(
                "命令：{}，描述：{}，用法：{}",
                command.name, command.description, command.usage
            ));
        }
        Ok(())
    }
}

/// `run_command <cmd...>`: owner only.
struct RunCommandHandler;

#[async_trait]
impl CommandHandler for RunCommandHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        if ctx.args.is_empty() {
            ctx.reply(format!(
                "请提供要运行的命令，格式：{} run_command <command>",
                ctx.bot.config().commands.prefix
            ));
            return Ok(());
        }
        if !ctx.bot.is_owner(ctx.user) {
            ctx.reply("你没有权限运行此命令！");
            return Ok(());
        }

        let command = ctx.joined_args();
        info!(user = ctx.user, command = %command, "Running raw command");
        ctx.reply(command.as_str());
        ctx.reply(format!("已发送命令：{command}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{OWNER, rig};
    use std::sync::Arc;

    #[tokio::test]
    async fn set_bot_selects_and_deselects() {
        let mut rig = rig(Arc::new(CorePlugin)).await;

        assert!(rig.run("alice", "set-bot", &["zy"]).await);
        assert!(rig.bot.is_operator("alice"));
        assert!(rig.run("alice", "set-bot", &["other"]).await);
        assert!(!rig.bot.is_operator("alice"));
        assert_eq!(
            rig.chats(),
            vec!["你正在操作机器人zy", "你正在操作机器人other"]
        );
    }

    #[tokio::test]
    async fn set_bot_without_id_prints_usage() {
        let mut rig = rig(Arc::new(CorePlugin)).await;
        assert!(rig.run("alice", "set-bot", &[]).await);
        assert_eq!(rig.chats(), vec!["请提供机器人ID，格式：.zybot set-bot <id>"]);
    }

    #[tokio::test]
    async fn help_lists_sorted_commands() {
        let mut rig = rig(Arc::new(CorePlugin)).await;
        assert!(rig.run("alice", "help", &[]).await);
        assert_eq!(
            rig.chats(),
            vec![
                "命令：help，描述：获取帮助信息，用法：.zybot help",
                "命令：run_command，描述：运行任意Minecraft命令，用法：.zybot run_command <command>",
                "命令：set-bot，描述：修改当前操作的机器人，用法：.zybot set-bot <id>",
            ]
        );
    }

    #[tokio::test]
    async fn run_command_is_owner_only() {
        let mut rig = rig(Arc::new(CorePlugin)).await;

        assert!(rig.run("alice", "run_command", &["/time", "set", "day"]).await);
        assert_eq!(rig.chats(), vec!["你没有权限运行此命令！"]);

        assert!(rig.run(OWNER, "run_command", &["/time", "set", "day"]).await);
        assert_eq!(
            rig.chats(),
            vec!["/time set day", "已发送命令：/time set day"]
        );
    }
}
