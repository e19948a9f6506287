//! Discord side of the relay: posting messages and setting presence.

use serenity::async_trait;
use serenity::gateway::ActivityData;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use tracing::debug;

use crate::bridge::adapters::ChatSink;
use crate::common::error::{ChatError, ChatResult};
use crate::common::{PresenceKind, PresenceUpdate};

/// Activity shown for a presence update.
pub fn activity_for(presence: &PresenceUpdate) -> ActivityData {
    match presence.kind {
        PresenceKind::Watching => ActivityData::watching(presence.label.clone()),
        PresenceKind::Listening => ActivityData::listening(presence.label.clone()),
    }
}

/// Posts into the bridged channel through the live gateway context.
///
/// The context is set once the gateway is ready and cleared on disconnect;
/// without one every call fails with [`ChatError::NotConnected`].
pub struct DiscordSink {
    channel_id: ChannelId,
    context: RwLock<Option<Context>>,
}

impl DiscordSink {
    pub fn new(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            context: RwLock::new(None),
        }
    }

    pub async fn connect(&self, context: Context) {
        *self.context.write().await = Some(context);
    }

    pub async fn disconnect(&self) {
        *self.context.write().await = None;
    }

    async fn context(&self) -> ChatResult<Context> {
        self.context.read().await.clone().ok_or(ChatError::NotConnected)
    }
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn send_message(&self, text: &str) -> ChatResult<()> {
        let context = self.context().await?;
        self.channel_id.say(&context.http, text).await?;
        Ok(())
    }

    async fn set_presence(&self, presence: &PresenceUpdate) -> ChatResult<()> {
        let context = self.context().await?;
        debug!("Setting Discord activity: {}", presence);
        context.set_activity(Some(activity_for(presence)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::gateway::ActivityType;

    #[test]
    fn test_activity_for_presence() {
        let watching = activity_for(&PresenceUpdate::watching("the world burn"));
        assert_eq!(watching.kind, ActivityType::Watching);
        assert_eq!(watching.name, "the world burn");

        let listening = activity_for(&PresenceUpdate::listening("automation"));
        assert_eq!(listening.kind, ActivityType::Listening);
        assert_eq!(listening.name, "automation");
    }

    #[tokio::test]
    async fn test_not_connected_before_ready() {
        let sink = DiscordSink::new(ChannelId::new(1234));

        assert!(matches!(
            sink.send_message("hello").await,
            Err(ChatError::NotConnected)
        ));
        assert!(matches!(
            sink.set_presence(&PresenceUpdate::watching("the world burn")).await,
            Err(ChatError::NotConnected)
        ));
    }
}
