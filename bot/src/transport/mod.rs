//! Outbound rename calls. The renamer core only sees the [`ChannelRenamer`] trait;
//! timeouts and HTTP details live in the implementations.

pub mod discord;
pub mod dry_run;

use futures_util::future::BoxFuture;

/// Why a rename call did not take effect.
#[derive(Debug, Clone, PartialEq)]
pub enum RenameError {
    /// The bot lacks Manage Channels on this channel.
    PermissionDenied,
    /// The channel no longer exists.
    NotFound,
    /// The remote side asked us to slow down.
    RateLimited { retry_after_secs: f64 },
    /// Any other non-success HTTP status.
    Http { status: u16, body: String },
    /// Connection, TLS or timeout failure.
    Transport(String),
}

impl std::fmt::Display for RenameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenameError::PermissionDenied => write!(f, "missing permission to manage channel"),
            RenameError::NotFound => write!(f, "channel not found"),
            RenameError::RateLimited { retry_after_secs } => {
                write!(f, "rate limited (retry after {retry_after_secs:.1}s)")
            }
            RenameError::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            RenameError::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for RenameError {}

/// Something that can set a channel's display name.
///
/// The returned future must be `'static` so it can be spawned; dropping it before
/// completion is how a superseded request is cancelled. Whether a dropped request
/// still lands remotely is up to the implementation.
pub trait ChannelRenamer: Send + Sync + 'static {
    fn rename(&self, channel: &str, name: &str) -> BoxFuture<'static, Result<(), RenameError>>;
}
