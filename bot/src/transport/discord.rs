use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ChannelRenamer, RenameError};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const AUDIT_LOG_REASON: &str = "Voice channel game tag";

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Renames channels through the Discord REST API (`PATCH /channels/{id}`).
///
/// Owns the call timeout. No retries: a failed rename is picked up again by the
/// next presence change.
#[derive(Clone)]
pub struct DiscordRenamer {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl DiscordRenamer {
    pub fn new(token: &str, api_base: &str, timeout: Duration) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tagger-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn channel_url(&self, channel: &str) -> String {
        format!("{}/channels/{}", self.api_base, channel)
    }
}

impl ChannelRenamer for DiscordRenamer {
    fn rename(&self, channel: &str, name: &str) -> BoxFuture<'static, Result<(), RenameError>> {
        let request = self
            .http
            .patch(self.channel_url(channel))
            .header("Authorization", format!("Bot {}", self.token))
            .header("X-Audit-Log-Reason", AUDIT_LOG_REASON)
            .json(&json!({ "name": name }));
        let channel = channel.to_string();

        Box::pin(async move {
            let resp = request
                .send()
                .await
                .map_err(|e| RenameError::Transport(e.to_string()))?;
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            debug!(%channel, status, "rename response");
            classify_response(status, &body)
        })
    }
}

/// Map a Discord response to the rename outcome.
pub fn classify_response(status: u16, body: &str) -> Result<(), RenameError> {
    match status {
        200..=299 => Ok(()),
        403 => Err(RenameError::PermissionDenied),
        404 => Err(RenameError::NotFound),
        429 => {
            let retry_after_secs = serde_json::from_str::<RateLimitBody>(body)
                .map(|b| b.retry_after)
                .unwrap_or(0.0);
            Err(RenameError::RateLimited { retry_after_secs })
        }
        _ => Err(RenameError::Http {
            status,
            body: body.chars().take(200).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert_eq!(classify_response(200, "{}"), Ok(()));
        assert_eq!(classify_response(204, ""), Ok(()));
    }

    #[test]
    fn test_permission_and_missing_channel() {
        assert_eq!(
            classify_response(403, r#"{"message":"Missing Permissions","code":50013}"#),
            Err(RenameError::PermissionDenied)
        );
        assert_eq!(
            classify_response(404, r#"{"message":"Unknown Channel","code":10003}"#),
            Err(RenameError::NotFound)
        );
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        let body = r#"{"message":"You are being rate limited.","retry_after":297.5,"global":false}"#;
        assert_eq!(
            classify_response(429, body),
            Err(RenameError::RateLimited {
                retry_after_secs: 297.5
            })
        );
        assert_eq!(
            classify_response(429, "not json"),
            Err(RenameError::RateLimited {
                retry_after_secs: 0.0
            })
        );
    }

    #[test]
    fn test_other_errors_keep_a_short_body() {
        let body = "x".repeat(1000);
        match classify_response(502, &body) {
            Err(RenameError::Http { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), 200);
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn test_channel_url_trims_trailing_slash() {
        let renamer =
            DiscordRenamer::new("token", "https://example.test/api/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            renamer.channel_url("123"),
            "https://example.test/api/channels/123"
        );
    }
}
