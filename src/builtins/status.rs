//! `status`: report the teleport lock and uptime in chat.

use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;

pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "状态查询功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("status")
                .description("查看机器人当前状态")
                .usage(ctx.usage("status")),
            StatusHandler,
        );
        Ok(())
    }
}

/// Lock state and uptime, in chat.
struct StatusHandler;

#[async_trait]
impl CommandHandler for StatusHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        if !ctx.bot.is_operator(ctx.user) {
            return Ok(());
        }

        let lock = ctx.bot.lock_state();
        if lock.is_locked() {
            ctx.reply(format!(
                "传送锁定：被{}锁定，锁定原因：{}",
                lock.locked_by(),
                lock.reason()
            ));
        } else {
            ctx.reply("传送锁定：机器人未锁定");
        }

        let hours = ctx.bot.uptime().as_secs_f64() / 3600.0;
        ctx.reply(format!("已平稳运行{hours:.2}小时"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{OWNER, rig};
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_lock_and_uptime() {
        let mut rig = rig(Arc::new(StatusPlugin)).await;
        assert!(rig.run(OWNER, "status", &[]).await);
        assert_eq!(rig.chats(), vec!["传送锁定：机器人未锁定", "已平稳运行0.00小时"]);

        rig.bot.with_lock(|l| l.lock("alice", "afk"));
        assert!(rig.run(OWNER, "status", &[]).await);
        assert_eq!(rig.chats()[0], "传送锁定：被alice锁定，锁定原因：afk");
    }

    #[tokio::test]
    async fn silent_for_non_operators() {
        let mut rig = rig(Arc::new(StatusPlugin)).await;
        assert!(rig.run("alice", "status", &[]).await);
        assert!(rig.chats().is_empty());
    }
}
