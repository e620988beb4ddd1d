//! Greets the server with a quote from hitokoto.cn after the first spawn.

use crate::bot::BotHandle;
use crate::error::PluginError;
use crate::plugin::{Plugin, PluginContext};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

const FAILURE_MESSAGE: &str = "【一言】获取失败，请稍后重试";

#[derive(Debug, Deserialize)]
struct Quote {
    hitokoto: String,
    from: Option<String>,
    from_who: Option<String>,
}

impl Quote {
    fn author(&self) -> &str {
        [&self.from_who, &self.from]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("未知作者")
    }
}

#[derive(Default)]
struct QuoteState {
    sent: AtomicBool,
    in_flight: AtomicBool,
}

pub struct HitokotoPlugin {
    state: Arc<QuoteState>,
}

impl HitokotoPlugin {
    pub fn new() -> Self {
        Self {
            state: Arc::new(QuoteState::default()),
        }
    }
}

impl Default for HitokotoPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for HitokotoPlugin {
    fn name(&self) -> &str {
        "hitokoto"
    }

    fn description(&self) -> &str {
        "一言功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        let bot = ctx.bot().clone();
        let state = Arc::clone(&self.state);
        ctx.on_ready("quote", move |_session| {
            if state.sent.load(Ordering::SeqCst) || state.in_flight.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            tokio::spawn(send_quote(bot.clone(), Arc::clone(&state)));
            Ok(())
        });
        Ok(())
    }

    fn deactivate(&self) {
        self.state.sent.store(false, Ordering::SeqCst);
    }
}

async fn send_quote(bot: BotHandle, state: Arc<QuoteState>) {
    match fetch(&bot).await {
        Ok(quote) => {
            let author = quote.author();
            info!(content = %quote.hitokoto, author, "Quote sent");
            bot.chat(format!("【一言】{} —— {author}", quote.hitokoto));
            state.sent.store(true, Ordering::SeqCst);
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch quote");
            bot.chat(FAILURE_MESSAGE);
        }
    }
    state.in_flight.store(false, Ordering::SeqCst);
}

async fn fetch(bot: &BotHandle) -> Result<Quote, reqwest::Error> {
    bot.http()
        .get(&bot.config().lookups.hitokoto_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{rig_with, stub};
    use crate::config::Config;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;
    use zybot_proto::ServerEvent;

    #[test]
    fn author_falls_back() {
        let quote = |from: Option<&str>, who: Option<&str>| Quote {
            hitokoto: "q".into(),
            from: from.map(Into::into),
            from_who: who.map(Into::into),
        };
        assert_eq!(quote(Some("book"), Some("someone")).author(), "someone");
        assert_eq!(quote(Some("book"), None).author(), "book");
        assert_eq!(quote(Some("book"), Some("")).author(), "book");
        assert_eq!(quote(None, None).author(), "未知作者");
    }

    #[tokio::test]
    async fn quotes_once_per_process() {
        let base = stub(Router::new().route(
            "/",
            get(|| async {
                Json(json!({ "hitokoto": "生活不止眼前的苟且", "from": "歌", "from_who": null }))
            }),
        ))
        .await;
        let mut config = Config::default();
        config.lookups.hitokoto_url = format!("{base}/");
        config.reconnect.interval_secs = 0;

        let mut rig = rig_with(config, Arc::new(HitokotoPlugin::new())).await;
        assert_eq!(rig.next_chat().await, "【一言】生活不止眼前的苟且 —— 歌");

        // Reconnect: no second quote.
        rig.bridge.emit(ServerEvent::End { reason: None }).await;
        let mut next = tokio::time::timeout(Duration::from_secs(2), rig.bridges.recv())
            .await
            .unwrap()
            .unwrap();
        next.emit(ServerEvent::Spawn { username: None }).await;
        rig.wait_running().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(next.drain_ops().is_empty());
    }

    #[tokio::test]
    async fn failure_is_announced_and_retried_next_time() {
        let mut config = Config::default();
        config.lookups.hitokoto_url = "http://127.0.0.1:9/".into();
        let plugin = Arc::new(HitokotoPlugin::new());
        let state = Arc::clone(&plugin.state);

        let mut rig = rig_with(config, plugin).await;
        assert_eq!(rig.next_chat().await, FAILURE_MESSAGE);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!state.sent.load(Ordering::SeqCst));
        assert!(!state.in_flight.load(Ordering::SeqCst));
    }
}
