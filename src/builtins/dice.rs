//! `摇色子`: roll a six-sided die for an operator.

use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use rand::Rng;

pub struct DicePlugin;

impl Plugin for DicePlugin {
    fn name(&self) -> &str {
        "dice"
    }

    fn description(&self) -> &str {
        "骰子相关功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("摇色子")
                .description("掷出一个1-6的随机数")
                .usage(ctx.usage("摇色子")),
            DiceHandler,
        );
        Ok(())
    }
}

struct DiceHandler;

#[async_trait]
impl CommandHandler for DiceHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        if !ctx.bot.is_operator(ctx.user) {
            return Ok(());
        }
        let roll: u8 = rand::thread_rng().gen_range(1..=6);
        ctx.reply(format!("{} 幸运的掷出了 {roll}", ctx.user));
        Ok(())
    }
}
