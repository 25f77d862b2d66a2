use std::collections::HashSet;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::activity::{Activity, ChannelId, ChannelSnapshot, Member, MemberId};
use super::events::PresenceEvent;

/// Read access to channel membership, member activities and channel names.
///
/// Implementations must hand out owned snapshots; the renamer never holds a
/// reference into the directory while it decides.
pub trait ChannelDirectory: Send + Sync {
    /// Current name and occupants of a channel, or `None` if it is unknown.
    fn channel(&self, id: &str) -> Option<ChannelSnapshot>;

    /// The voice channel a member is connected to, if any.
    fn voice_channel_of(&self, member: &str) -> Option<ChannelId>;
}

#[derive(Debug)]
struct ChannelEntry {
    name: String,
    members: HashSet<MemberId>,
}

#[derive(Debug)]
struct MemberEntry {
    member: Member,
    voice_channel: Option<ChannelId>,
}

/// Gateway-fed cache of voice channels and the members in them.
#[derive(Default)]
pub struct InMemoryDirectory {
    channels: DashMap<ChannelId, ChannelEntry>,
    members: DashMap<MemberId, MemberEntry>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a notification to the cache. Must run before the renamer sees the event.
    pub fn apply(&self, event: &PresenceEvent) {
        match event {
            PresenceEvent::MemberJoined { channel, member } => self.join(channel, member.clone()),
            PresenceEvent::MemberLeft { channel, member } => self.leave(channel, member),
            PresenceEvent::MemberMoved { from, to, member } => {
                let moved = self.members.get(member).map(|m| m.member.clone());
                self.leave(from, member);
                match moved {
                    Some(m) => self.join(to, m),
                    None => warn!(%member, "move for unknown member ignored"),
                }
            }
            PresenceEvent::ActivityStarted { member, activity } => {
                self.start_activity(member, activity.clone())
            }
            PresenceEvent::ActivityEnded { member, activity } => {
                self.end_activity(member, activity)
            }
            PresenceEvent::ChannelUpdated { channel, name } => {
                self.upsert_channel(channel, name);
            }
            PresenceEvent::ChannelDeleted { channel } => self.remove_channel(channel),
        }
    }

    /// Register a channel or change its name.
    pub fn upsert_channel(&self, id: &str, name: &str) {
        self.channels
            .entry(id.to_string())
            .and_modify(|ch| ch.name = name.to_string())
            .or_insert_with(|| ChannelEntry {
                name: name.to_string(),
                members: HashSet::new(),
            });
    }

    /// Set the name of a known channel. Returns false if the channel is unknown.
    pub fn set_channel_name(&self, id: &str, name: &str) -> bool {
        match self.channels.get_mut(id) {
            Some(mut ch) => {
                ch.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn channel_name(&self, id: &str) -> Option<String> {
        self.channels.get(id).map(|ch| ch.name.clone())
    }

    pub fn remove_channel(&self, id: &str) {
        let Some((_, entry)) = self.channels.remove(id) else {
            return;
        };
        for member_id in &entry.members {
            self.members
                .remove_if(member_id, |_, m| m.voice_channel.as_deref() == Some(id));
        }
    }

    fn join(&self, channel: &str, member: Member) {
        let member_id = member.id.clone();

        // Leave the previous channel first so a missed leave event can't leave a ghost behind.
        let previous = self
            .members
            .get(&member_id)
            .and_then(|m| m.voice_channel.clone());
        if let Some(prev) = previous
            && prev != channel
            && let Some(mut ch) = self.channels.get_mut(&prev)
        {
            ch.members.remove(&member_id);
        }

        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| {
                warn!(%channel, "join for unknown channel; using its id as the name");
                ChannelEntry {
                    name: channel.to_string(),
                    members: HashSet::new(),
                }
            })
            .members
            .insert(member_id.clone());

        self.members.insert(
            member_id,
            MemberEntry {
                member,
                voice_channel: Some(channel.to_string()),
            },
        );
    }

    fn leave(&self, channel: &str, member: &str) {
        if let Some(mut ch) = self.channels.get_mut(channel) {
            ch.members.remove(member);
        }
        // Only members in a voice channel are tracked.
        self.members
            .remove_if(member, |_, m| m.voice_channel.as_deref() == Some(channel));
    }

    fn start_activity(&self, member: &str, activity: Activity) {
        match self.members.get_mut(member) {
            Some(mut m) => {
                // Replace so refreshed details are kept.
                m.member.activities.replace(activity);
            }
            None => debug!(%member, "activity for member outside any tracked channel"),
        }
    }

    fn end_activity(&self, member: &str, activity: &Activity) {
        if let Some(mut m) = self.members.get_mut(member) {
            m.member.activities.remove(activity);
        }
    }
}

impl ChannelDirectory for InMemoryDirectory {
    fn channel(&self, id: &str) -> Option<ChannelSnapshot> {
        // Copy out of the channel entry before touching the member map.
        let (name, member_ids) = {
            let ch = self.channels.get(id)?;
            (ch.name.clone(), ch.members.iter().cloned().collect::<Vec<_>>())
        };

        let members = member_ids
            .iter()
            .filter_map(|mid| self.members.get(mid).map(|m| m.member.clone()))
            .collect();

        Some(ChannelSnapshot {
            id: id.to_string(),
            name,
            members,
        })
    }

    fn voice_channel_of(&self, member: &str) -> Option<ChannelId> {
        self.members.get(member).and_then(|m| m.voice_channel.clone())
    }
}
