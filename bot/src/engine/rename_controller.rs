use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::activity::{Activity, ChannelId};
use super::directory::ChannelDirectory;
use super::dominance::resolve_dominant_activity;
use super::events::PresenceEvent;
use super::naming::{
    DEFAULT_MAX_TAG_LENGTH, TruncationStyle, compose_channel_name, parse_channel_name,
    truncate_activity_name,
};
use crate::transport::ChannelRenamer;

/// Tunables for how channel names are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenamerSettings {
    /// Longest game tag (in characters) before truncation kicks in.
    pub max_tag_length: usize,
    pub truncation: TruncationStyle,
    /// Treat a channel with a single occupant as having no dominant game.
    pub skip_solo_channels: bool,
}

impl Default for RenamerSettings {
    fn default() -> Self {
        Self {
            max_tag_length: DEFAULT_MAX_TAG_LENGTH,
            truncation: TruncationStyle::Trailing,
            skip_solo_channels: false,
        }
    }
}

/// Outcome of evaluating one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameDecision {
    /// The dominant game is the same as last time; nothing to do.
    Unchanged,
    /// A rename to `name` was submitted. `target` is the game now tagged, if any.
    Submitted {
        target: Option<Activity>,
        name: String,
    },
    /// Recorded the new target, but the channel name already matches it.
    NameCurrent { target: Option<Activity> },
}

/// An in-flight rename for one channel.
struct PendingRename {
    request_id: Uuid,
    name: String,
    submitted_at: DateTime<Utc>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Per-channel bookkeeping, guarded by that channel's own lock.
#[derive(Default)]
struct ChannelRenameState {
    /// The last dominant game acted on. This is intent, not the live channel name.
    last_applied: Option<Activity>,
    pending: Vec<PendingRename>,
}

impl ChannelRenameState {
    fn prune_finished(&mut self) {
        self.pending.retain(|p| !p.handle.is_finished());
    }

    fn cancel_pending(&mut self, channel: &str) {
        for p in self.pending.drain(..) {
            debug!(
                %channel,
                request_id = %p.request_id,
                name = %p.name,
                age_ms = (Utc::now() - p.submitted_at).num_milliseconds(),
                "cancelling superseded rename"
            );
            p.cancel.cancel();
        }
    }
}

/// Keeps each voice channel's name in step with the game most of its occupants play.
///
/// Channels are independent: each has its own lock, so evaluations for different
/// channels never wait on each other. Renames are spawned and never awaited on the
/// notification path.
pub struct RenameController {
    directory: Arc<dyn ChannelDirectory>,
    renamer: Arc<dyn ChannelRenamer>,
    settings: RenamerSettings,
    channels: DashMap<ChannelId, Arc<Mutex<ChannelRenameState>>>,
}

impl RenameController {
    pub fn new(
        directory: Arc<dyn ChannelDirectory>,
        renamer: Arc<dyn ChannelRenamer>,
        settings: RenamerSettings,
    ) -> Self {
        Self {
            directory,
            renamer,
            settings,
            channels: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &RenamerSettings {
        &self.settings
    }

    /// Route a gateway notification to the channel(s) it affects.
    ///
    /// Must be called after the directory has applied the same event.
    pub fn handle_event(&self, event: &PresenceEvent) {
        match event {
            PresenceEvent::MemberJoined { channel, member } => {
                info!(%channel, member = %member.display_name, "member joined voice channel");
                self.on_channel_activity_changed(channel);
            }
            PresenceEvent::MemberLeft { channel, member } => {
                info!(%channel, %member, "member left voice channel");
                self.on_channel_activity_changed(channel);
            }
            PresenceEvent::MemberMoved { from, to, member } => {
                info!(%from, %to, %member, "member moved between voice channels");
                self.on_channel_activity_changed(from);
                self.on_channel_activity_changed(to);
            }
            PresenceEvent::ActivityStarted { member, activity }
            | PresenceEvent::ActivityEnded { member, activity } => {
                let Some(channel) = self.directory.voice_channel_of(member) else {
                    return;
                };
                info!(
                    %channel,
                    %member,
                    activity = %activity.name,
                    kind = activity.kind.as_str(),
                    event = event.kind(),
                    "activity changed in voice channel"
                );
                self.on_channel_activity_changed(&channel);
            }
            PresenceEvent::ChannelUpdated { .. } => {}
            PresenceEvent::ChannelDeleted { channel } => self.forget_channel(channel),
        }
    }

    /// Re-evaluate one channel and rename it if its dominant game changed.
    pub fn on_channel_activity_changed(&self, channel: &str) -> RenameDecision {
        let entry = self.entry(channel);
        let mut state = lock(&entry);

        // Snapshot under the channel lock so two evaluations can't apply out of order.
        let snapshot = self.directory.channel(channel);
        let dominant = match &snapshot {
            Some(s) if self.settings.skip_solo_channels && s.members.len() == 1 => None,
            Some(s) => resolve_dominant_activity(&s.members),
            None => None,
        };

        if state.last_applied == dominant {
            return RenameDecision::Unchanged;
        }

        let Some(snapshot) = snapshot else {
            // Vanished channel: nothing left to rename.
            debug!(%channel, "channel not in directory");
            state.last_applied = None;
            state.cancel_pending(channel);
            return RenameDecision::NameCurrent { target: None };
        };

        let current_name = snapshot.name.as_str();
        let parsed = parse_channel_name(current_name);

        let name = match &dominant {
            Some(activity) => {
                info!(%channel, game = %activity.name, "dominant game in channel");
                let tag = truncate_activity_name(
                    &activity.name,
                    self.settings.max_tag_length,
                    self.settings.truncation,
                );
                compose_channel_name(&tag, parsed.base)
            }
            None => {
                info!(
                    %channel,
                    tagged = parsed.is_tagged(),
                    "no single game is being played in channel"
                );
                parsed.base.to_string()
            }
        };

        state.last_applied = dominant.clone();

        // With a rename still in flight the visible name is stale, so always resubmit.
        state.prune_finished();
        if state.pending.is_empty() && name == current_name {
            debug!(%channel, %name, "channel already carries the target name");
            return RenameDecision::NameCurrent { target: dominant };
        }

        self.submit(channel, &mut state, name.clone());
        RenameDecision::Submitted {
            target: dominant,
            name,
        }
    }

    /// Drop all state for a channel and cancel its outstanding renames.
    pub fn forget_channel(&self, channel: &str) {
        if let Some((_, entry)) = self.channels.remove(channel) {
            lock(&entry).cancel_pending(channel);
            info!(%channel, "forgot channel rename state");
        }
    }

    /// The last dominant game acted on for a channel.
    pub fn last_intent(&self, channel: &str) -> Option<Activity> {
        let entry = self.channels.get(channel)?.clone();
        let state = lock(&entry);
        state.last_applied.clone()
    }

    /// Number of renames for the channel that have not finished yet.
    pub fn pending_count(&self, channel: &str) -> usize {
        let Some(entry) = self.channels.get(channel).map(|e| e.clone()) else {
            return 0;
        };
        let mut state = lock(&entry);
        state.prune_finished();
        state.pending.len()
    }

    pub fn tracked_channels(&self) -> usize {
        self.channels.len()
    }

    /// Wait for every outstanding rename to finish (or be cancelled).
    pub async fn drain(&self) {
        // Collect entries first; never hold a map reference across an await.
        let entries: Vec<(ChannelId, Arc<Mutex<ChannelRenameState>>)> = self
            .channels
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        for (channel, entry) in entries {
            let pending = std::mem::take(&mut lock(&entry).pending);
            for p in pending {
                if let Err(e) = p.handle.await {
                    warn!(%channel, request_id = %p.request_id, error = %e, "rename task failed");
                }
            }
        }
    }

    fn entry(&self, channel: &str) -> Arc<Mutex<ChannelRenameState>> {
        if let Some(entry) = self.channels.get(channel) {
            return entry.clone();
        }
        self.channels
            .entry(channel.to_string())
            .or_default()
            .value()
            .clone()
    }

    fn submit(&self, channel: &str, state: &mut ChannelRenameState, name: String) {
        state.cancel_pending(channel);

        let request_id = Uuid::new_v4();
        let submitted_at = Utc::now();
        let cancel = CancellationToken::new();
        let call = self.renamer.rename(channel, &name);

        let token = cancel.clone();
        let channel_id = channel.to_string();
        let target = name.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(channel = %channel_id, %request_id, "rename cancelled before completion");
                }
                result = call => match result {
                    Ok(()) => info!(
                        channel = %channel_id,
                        %request_id,
                        name = %target,
                        elapsed_ms = (Utc::now() - submitted_at).num_milliseconds(),
                        "channel renamed"
                    ),
                    Err(e) => warn!(
                        channel = %channel_id,
                        %request_id,
                        name = %target,
                        error = %e,
                        "channel rename failed"
                    ),
                },
            }
        });

        info!(%channel, %request_id, %name, "rename submitted");
        state.pending.push(PendingRename {
            request_id,
            name,
            submitted_at,
            cancel,
            handle,
        });
    }
}

fn lock(entry: &Mutex<ChannelRenameState>) -> MutexGuard<'_, ChannelRenameState> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
