use serde::{Deserialize, Serialize};

use super::activity::{Activity, ChannelId, Member, MemberId};

/// Gateway notification consumed by the bot.
///
/// Voice and presence variants drive renaming. Channel variants only keep the
/// directory current (and evict rename state on deletion).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// Member connected to a voice channel.
    MemberJoined { channel: ChannelId, member: Member },

    /// Member disconnected from a voice channel.
    MemberLeft { channel: ChannelId, member: MemberId },

    /// Member switched from one voice channel to another.
    MemberMoved {
        from: ChannelId,
        to: ChannelId,
        member: MemberId,
    },

    /// Member started an activity.
    ActivityStarted { member: MemberId, activity: Activity },

    /// Member stopped an activity.
    ActivityEnded { member: MemberId, activity: Activity },

    /// Channel was created or renamed (by anyone, including this bot).
    ChannelUpdated { channel: ChannelId, name: String },

    /// Channel was deleted.
    ChannelDeleted { channel: ChannelId },
}

impl PresenceEvent {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PresenceEvent::MemberJoined { .. } => "member_joined",
            PresenceEvent::MemberLeft { .. } => "member_left",
            PresenceEvent::MemberMoved { .. } => "member_moved",
            PresenceEvent::ActivityStarted { .. } => "activity_started",
            PresenceEvent::ActivityEnded { .. } => "activity_ended",
            PresenceEvent::ChannelUpdated { .. } => "channel_updated",
            PresenceEvent::ChannelDeleted { .. } => "channel_deleted",
        }
    }
}
