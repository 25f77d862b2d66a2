use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Unique identifier for a voice channel (a Discord snowflake, kept as text).
pub type ChannelId = String;

/// Unique identifier for a guild member.
pub type MemberId = String;

/// What a member is doing. Only `Playing` counts toward channel dominance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Playing => "playing",
            ActivityKind::Streaming => "streaming",
            ActivityKind::Listening => "listening",
            ActivityKind::Watching => "watching",
            ActivityKind::Custom => "custom",
            ActivityKind::Competing => "competing",
        }
    }
}

/// A single rich-presence activity.
///
/// Two activities are the same activity when their name and kind match.
/// `details` is informational only and never takes part in comparisons, so two
/// members showing different rich-presence text for one game still count together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Activity {
    pub fn new(name: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            details: None,
        }
    }

    /// Shorthand for a game activity.
    pub fn playing(name: impl Into<String>) -> Self {
        Self::new(name, ActivityKind::Playing)
    }

    pub fn is_game(&self) -> bool {
        self.kind == ActivityKind::Playing
    }
}

impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for Activity {}

impl Hash for Activity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
    }
}

/// An occupant of a voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
    #[serde(default)]
    pub activities: HashSet<Activity>,
}

impl Member {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            activities: HashSet::new(),
        }
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.insert(activity);
        self
    }
}

/// Point-in-time view of a channel, as handed out by a directory.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub name: String,
    pub members: Vec<Member>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_details() {
        let mut a = Activity::playing("Halo");
        a.details = Some("Ranked".into());
        let mut b = Activity::playing("Halo");
        b.details = Some("Campaign".into());
        assert_eq!(a, b);

        let set: HashSet<Activity> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_kind_participates_in_equality() {
        let game = Activity::playing("Spotify");
        let music = Activity::new("Spotify", ActivityKind::Listening);
        assert_ne!(game, music);
        assert!(game.is_game());
        assert!(!music.is_game());
    }

    #[test]
    fn test_activity_deserializes_without_details() {
        let a: Activity = serde_json::from_str(r#"{"name":"Chess","kind":"playing"}"#).unwrap();
        assert_eq!(a, Activity::playing("Chess"));
        assert!(a.details.is_none());
    }
}
