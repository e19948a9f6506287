//! Formatting of classified log events for Discord.
//!
//! Turns a [`LogEvent`] into at most one chat message and at most one
//! presence update. Never blocks; the only side effect is the player
//! counter update for join and leave events.

use crate::bridge::state::PlayerCountTracker;
use crate::common::{OutboundChatMessage, PresenceUpdate};
use crate::config::types::FeatureFlags;
use crate::game::classifier::LogEvent;

/// Speaker name the game uses for messages injected through the console.
pub const SERVER_ECHO_PREFIX: &str = "<server>";

/// Causes of death that get a cosmetic suffix.
const VEHICLE_CAUSES: &[&str] = &["locomotive", "cargo-wagon", "artillery-wagon", "fluid-wagon"];

/// Causes that are hard to die from.
const IMPROBABLE_CAUSES: &[&str] = &["cargo-wagon", "artillery-wagon", "fluid-wagon"];

/// Result of formatting a single event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedEvent {
    pub message: Option<OutboundChatMessage>,
    pub presence: Option<PresenceUpdate>,
}

impl FormattedEvent {
    fn none() -> Self {
        Self::default()
    }

    fn message(text: String) -> Self {
        Self {
            message: Some(text),
            presence: None,
        }
    }

    fn with_presence(mut self, presence: PresenceUpdate) -> Self {
        self.presence = Some(presence);
        self
    }
}

/// Format an event for the chat channel.
pub fn format_event(
    event: &LogEvent,
    features: &FeatureFlags,
    players: &PlayerCountTracker,
) -> FormattedEvent {
    match event {
        LogEvent::Chat {
            speaker,
            body,
            location_ping,
        } => {
            // Achievement mode injects bridged chat as server messages; reading
            // them back would relay them again forever.
            if features.achievement_mode && speaker.starts_with(SERVER_ECHO_PREFIX) {
                return FormattedEvent::none();
            }
            if *location_ping {
                if !features.send_gps_ping {
                    return FormattedEvent::none();
                }
                return FormattedEvent::message(format!(":map: | `{}`: {}", speaker, body));
            }
            FormattedEvent::message(format!(":speech_left: | `{}`: {}", speaker, body))
        }
        LogEvent::Join { player } => {
            players.joined();
            if !features.send_join_leave {
                return FormattedEvent::none();
            }
            FormattedEvent::message(format!(":green_circle: | `{}` joined the game!", player))
        }
        LogEvent::Leave { player } => {
            players.left();
            if !features.send_join_leave {
                return FormattedEvent::none();
            }
            FormattedEvent::message(format!(":red_circle: | `{}` left the game!", player))
        }
        LogEvent::ResearchStarted { tech } => {
            FormattedEvent::message(format!(":microscope: | Research started: `{}`", tech))
        }
        LogEvent::ResearchFinished { tech } => {
            FormattedEvent::message(format!(":microscope: | Research finished: `{}`", tech))
                .with_presence(PresenceUpdate::listening(tech.clone()))
        }
        LogEvent::PlayerDied {
            player,
            cause,
            death_counts,
        } => FormattedEvent::message(format_death(player, cause.as_deref(), *death_counts))
            .with_presence(PresenceUpdate::watching(format!("{} dying", player))),
        LogEvent::RocketLaunched { count } => {
            let presence = PresenceUpdate::watching("a rocket launch");
            if features.all_rocket_launches || is_launch_milestone(*count) {
                FormattedEvent::message(format!(
                    ":rocket: :rocket: :rocket: A rocket has been launched! ({} times)",
                    count
                ))
                .with_presence(presence)
            } else {
                FormattedEvent::none().with_presence(presence)
            }
        }
        LogEvent::Unrecognized => FormattedEvent::none(),
    }
}

/// Whether a launch count is announced when not announcing every launch.
///
/// Every launch up to 5, every 10th below 100, every 100th from 100 on.
pub fn is_launch_milestone(count: u64) -> bool {
    count <= 5
        || ((10..100).contains(&count) && count % 10 == 0)
        || (count >= 100 && count % 100 == 0)
}

fn death_suffix(cause: &str) -> &'static str {
    if IMPROBABLE_CAUSES.contains(&cause) {
        " (hahaha! how the hell did you do that?!?!)"
    } else if VEHICLE_CAUSES.contains(&cause) {
        " (hahaha!)"
    } else {
        ""
    }
}

fn format_death(player: &str, cause: Option<&str>, death_counts: Option<(u64, u64)>) -> String {
    let Some(cause) = cause else {
        return format!(":skull: | Player died: `{}` (unknown cause)", player);
    };

    let suffix = death_suffix(cause);
    let cause = if cause.is_empty() { "unknown" } else { cause };

    match death_counts {
        None => format!(":skull: | Player died: `{}`, cause: `{}`{}", player, cause, suffix),
        Some((deaths, total)) => format!(
            ":skull: | Player died: `{}`, cause: `{}`{} ({} times out of {} deaths)",
            player, cause, suffix, deaths, total
        ),
    }
}
