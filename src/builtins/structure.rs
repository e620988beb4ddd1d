//! `st <x> <z> <id>`: ask a structure locator service for the nearest match.

use crate::bot::BotHandle;
use crate::error::{HandlerError, HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{Instrument, debug, info_span, warn};

pub struct StructurePlugin;

impl Plugin for StructurePlugin {
    fn name(&self) -> &str {
        "structure"
    }

    fn description(&self) -> &str {
        "结构查找功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("st")
                .description("查找结构")
                .usage(ctx.usage("st <X> <Y> <结构ID>")),
            LocateHandler,
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LocateReply {
    text: String,
}

struct LocateHandler;

#[async_trait]
impl CommandHandler for LocateHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        if !ctx.bot.is_operator(ctx.user) {
            return Ok(());
        }
        let [x, z, structure, ..] = ctx.args else {
            ctx.reply(format!(
                "请提供X Y坐标和结构ID，格式：{} st <X> <Y> <结构ID>",
                ctx.bot.config().commands.prefix
            ));
            return Ok(());
        };

        for coordinate in [x, z] {
            if coordinate.parse::<i64>().is_err() {
                return Err(HandlerError::InvalidArgument(format!(
                    "coordinate {coordinate} is not an integer"
                )));
            }
        }

        let query = [
            ("x", x.clone()),
            ("z", z.clone()),
            ("structure", structure.clone()),
        ];
        let span = info_span!("locate", structure = %structure);
        tokio::spawn(locate(ctx.bot.clone(), query).instrument(span));
        Ok(())
    }
}

async fn locate(bot: BotHandle, query: [(&'static str, String); 3]) {
    let result = async {
        bot.http()
            .get(&bot.config().lookups.structure_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<LocateReply>()
            .await
    }
    .await;

    match result {
        Ok(reply) => {
            debug!(text = %reply.text, "Structure located");
            bot.chat(reply.text);
        }
        Err(e) => {
            warn!(error = %e, "Structure lookup failed");
            bot.chat(format!("查找结构失败：{e}"));
        }
    }
}
