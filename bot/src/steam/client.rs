use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.steampowered.com";

/// A game in a player's library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnedGame {
    pub appid: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub playtime_forever: u64,
}

#[derive(Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Deserialize)]
struct VanityResponse {
    success: u32,
    steamid: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct OwnedGamesResponse {
    /// Absent when the profile is private.
    games: Option<Vec<OwnedGame>>,
}

/// Minimal Steam Web API client.
#[derive(Clone)]
pub struct SteamApi {
    http: reqwest::Client,
    api_base: String,
    key: String,
}

impl SteamApi {
    pub fn new(key: &str, timeout: Duration) -> Result<Self> {
        Self::with_base(key, DEFAULT_API_BASE, timeout)
    }

    pub fn with_base(key: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Steam HTTP client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    /// Turn a vanity name (or an existing 64-bit id) into a 64-bit Steam id.
    /// Returns `None` when Steam has no match.
    pub async fn resolve_player(&self, vanity_or_id: &str) -> Result<Option<String>> {
        if is_steam_id64(vanity_or_id) {
            return Ok(Some(vanity_or_id.to_string()));
        }

        let url = format!("{}/ISteamUser/ResolveVanityURL/v0001/", self.api_base);
        let body: Envelope<VanityResponse> = self
            .http
            .get(url)
            .query(&[("key", self.key.as_str()), ("vanityurl", vanity_or_id)])
            .send()
            .await
            .context("ResolveVanityURL request failed")?
            .error_for_status()
            .context("ResolveVanityURL returned an error status")?
            .json()
            .await
            .context("ResolveVanityURL returned malformed JSON")?;

        let resp = body.response;
        if resp.success != 1 {
            debug!(
                player = vanity_or_id,
                message = resp.message.as_deref().unwrap_or(""),
                "vanity name not resolved"
            );
            return Ok(None);
        }
        resp.steamid
            .map(Some)
            .ok_or_else(|| anyhow!("ResolveVanityURL reported success without a steamid"))
    }

    /// Library of a player. `None` means the profile hides its games.
    pub async fn owned_games(&self, steam_id: &str) -> Result<Option<Vec<OwnedGame>>> {
        let url = format!("{}/IPlayerService/GetOwnedGames/v0001/", self.api_base);
        let body: Envelope<OwnedGamesResponse> = self
            .http
            .get(url)
            .query(&[
                ("key", self.key.as_str()),
                ("steamid", steam_id),
                ("include_appinfo", "1"),
                ("include_played_free_games", "1"),
                ("format", "json"),
            ])
            .send()
            .await
            .context("GetOwnedGames request failed")?
            .error_for_status()
            .context("GetOwnedGames returned an error status")?
            .json()
            .await
            .context("GetOwnedGames returned malformed JSON")?;

        Ok(body.response.games)
    }
}

/// 64-bit Steam ids are 17 decimal digits starting with 7656119.
pub fn is_steam_id64(s: &str) -> bool {
    s.len() == 17 && s.starts_with("7656119") && s.bytes().all(|b| b.is_ascii_digit())
}
