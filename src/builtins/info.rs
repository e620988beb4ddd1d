//! `开盒 <player> [p]`: look a player up on the web map and at Mojang.
//!
//! Lookup failures are reported to the requester and never fail the command.

use crate::bot::BotHandle;
use crate::error::{HandlerResult, PluginError};
use crate::plugin::{CommandHandler, CommandSpec, Context, Plugin, PluginContext};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Only map backend with a known player endpoint.
const BLUEMAP: &str = "BlueMap";
/// Custom permission gating lookups, configurable under `[plugins.info]`.
const LOOKUP_PERMISSION: &str = "lookup";

pub struct InfoPlugin;

impl Plugin for InfoPlugin {
    fn name(&self) -> &str {
        "info"
    }

    fn description(&self) -> &str {
        "信息查询功能插件"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.register_command(
            CommandSpec::new("开盒")
                .description("获取玩家信息")
                .usage(ctx.usage("开盒 <玩家ID> [p]")),
            PlayerInfoHandler,
        );
        Ok(())
    }
}

#[derive(Debug, Error)]
enum LookupError {
    #[error("player not found")]
    NotFound,

    #[error("profile has no textures")]
    NoSkin,

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Decode(String),
}

impl LookupError {
    fn message(&self, player: &str) -> String {
        match self {
            Self::NotFound => format!("未找到玩家 {player}"),
            Self::NoSkin => format!("无法获取 {player} 的皮肤信息"),
            Self::Http(e) if e.is_connect() => "网络错误: 无法连接到API服务器".to_string(),
            Self::Http(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                format!("未找到玩家 {player}")
            }
            other => format!("获取信息失败: {other}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapPlayers {
    #[serde(default)]
    players: Vec<MapPlayer>,
}

#[derive(Debug, Deserialize)]
struct MapPlayer {
    name: String,
    position: MapPosition,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct MapPosition {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionProfile {
    #[serde(default)]
    properties: Vec<ProfileProperty>,
}

#[derive(Debug, Deserialize)]
struct ProfileProperty {
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct TexturePayload {
    #[serde(default)]
    textures: Textures,
}

#[derive(Debug, Default, Deserialize)]
struct Textures {
    #[serde(rename = "SKIN")]
    skin: Option<Texture>,
}

#[derive(Debug, Deserialize)]
struct Texture {
    url: String,
}

/// Where the map thinks the player is.
struct MapReport {
    status: &'static str,
    position: MapPosition,
}

struct PlayerInfoHandler;

#[async_trait]
impl CommandHandler for PlayerInfoHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        if !ctx.bot.is_operator(ctx.user) {
            return Ok(());
        }
        if !ctx
            .permissions
            .check_custom_permission(ctx.user, "info", LOOKUP_PERMISSION)
        {
            ctx.reply(format!("{} 你没有权限使用命令 {}", ctx.user, ctx.command));
            return Ok(());
        }
        let Some(player) = ctx.arg(0) else {
            ctx.reply(format!(
                "请提供玩家正版ID，格式：{} 开盒 <玩家ID>",
                ctx.bot.config().commands.prefix
            ));
            return Ok(());
        };
        let private = ctx.args.iter().skip(1).any(|a| a == "p");

        let reply = |message: String, is_error: bool| {
            let line = if private {
                format!("/msg {} {message}", ctx.user)
            } else if is_error {
                format!("[{}] {message}", ctx.user)
            } else {
                message
            };
            ctx.reply(line);
        };

        match lookup(ctx.bot, player).await {
            Ok(summary) => reply(summary, false),
            Err(e) => {
                warn!(player, error = %e, "Player lookup failed");
                reply(e.message(player), true);
            }
        }
        Ok(())
    }
}

async fn lookup(bot: &BotHandle, player: &str) -> Result<String, LookupError> {
    let map = map_position(bot, player).await;

    let lookups = &bot.config().lookups;
    let profile_url = with_segment(&lookups.mojang_profile_url, player)?;
    let response = bot.http().get(profile_url).send().await?;
    if matches!(
        response.status(),
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND
    ) {
        return Err(LookupError::NotFound);
    }
    let profile: Profile = response.error_for_status()?.json().await?;
    let uuid = profile.id.ok_or(LookupError::NotFound)?;

    let mut session_url = with_segment(&lookups.mojang_session_url, &uuid)?;
    session_url.query_pairs_mut().append_pair("unsigned", "false");
    let session: SessionProfile = bot
        .http()
        .get(session_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let property = session.properties.first().ok_or(LookupError::NoSkin)?;
    let skin = skin_url(&property.value)?;

    let MapPosition { x, y, z } = map.position;
    Ok(format!(
        "{{ name: {player}, uuid: {uuid}, skin: {skin}, posmsg: {}, pos: {{ x: {x:.2}, y: {y:.2}, z: {z:.2} }} }}",
        map.status
    ))
}

async fn map_position(bot: &BotHandle, player: &str) -> MapReport {
    let main = &bot.config().main;
    let mut report = MapReport {
        status: "map error",
        position: MapPosition::default(),
    };
    if main.map_type != BLUEMAP {
        report.status = "map type error";
        return report;
    }

    let url = format!(
        "{}/maps/world/live/players.json",
        main.map_url.trim_end_matches('/')
    );
    let fetched = async {
        bot.http()
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<MapPlayers>()
            .await
    }
    .await;

    match fetched {
        Ok(map) => match map.players.into_iter().find(|p| p.name == player) {
            Some(found) => {
                report.status = "ok";
                report.position = found.position;
            }
            None => report.status = "error",
        },
        Err(e) => debug!(url = %url, error = %e, "Map lookup failed"),
    }
    report
}

fn with_segment(base: &str, segment: &str) -> Result<Url, LookupError> {
    let mut url = Url::parse(base).map_err(|e| LookupError::Decode(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| LookupError::Decode(format!("{base} cannot take a path")))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// Skin URL out of a base64 `textures` property. Empty if the player has none.
fn skin_url(encoded: &str) -> Result<String, LookupError> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| LookupError::Decode(e.to_string()))?;
    let payload: TexturePayload =
        serde_json::from_slice(&raw).map_err(|e| LookupError::Decode(e.to_string()))?;
    Ok(payload.textures.skin.map(|t| t.url).unwrap_or_default())
}
