use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::info;

use super::{ChannelRenamer, RenameError};
use crate::engine::directory::InMemoryDirectory;

/// Pretends to rename: waits a simulated round trip, then writes the new name
/// straight into the directory as the gateway echo would.
pub struct DryRunRenamer {
    directory: Arc<InMemoryDirectory>,
    latency: Duration,
}

impl DryRunRenamer {
    pub fn new(directory: Arc<InMemoryDirectory>, latency: Duration) -> Self {
        Self { directory, latency }
    }
}

impl ChannelRenamer for DryRunRenamer {
    fn rename(&self, channel: &str, name: &str) -> BoxFuture<'static, Result<(), RenameError>> {
        let directory = self.directory.clone();
        let latency = self.latency;
        let channel = channel.to_string();
        let name = name.to_string();

        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if !directory.set_channel_name(&channel, &name) {
                return Err(RenameError::NotFound);
            }
            info!(%channel, %name, "dry run: channel renamed");
            Ok(())
        })
    }
}
