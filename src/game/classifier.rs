//! Classification of raw game log lines.
//!
//! Every interesting line carries a bracketed tag near its start:
//!
//! ```text
//! 2024-03-01 18:22:10 [CHAT] Alice: anyone got spare copper?
//! 2024-03-01 18:22:41 [JOIN] Bob joined the game
//! [FactoriGOChatBot]: [PLAYER_DIED:Bob:locomotive:3:12]
//! ```
//!
//! The first tag selects a rule from [`LINE_RULES`]; lines written by the
//! companion mod carry a second `[SUB_TAG:field:...]` group that selects a
//! rule from [`MOD_RULES`]. Rules are total: anything that does not fit
//! becomes [`LogEvent::Unrecognized`].

use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::debug;

/// Tag written by the companion mod in front of its structured entries.
pub const MOD_TAG: &str = "FactoriGOChatBot";

/// Substring marking a map ping inside a chat message.
pub const GPS_MARKER: &str = "[gps=";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w*)\]").expect("tag pattern is valid"));

static MOD_ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([A-Z_]+)((?::[^:\]]*)*)\]").expect("mod entry pattern is valid")
});

/// A structured event extracted from one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Chat {
        speaker: String,
        body: String,
        /// Body contains a map coordinate marker.
        location_ping: bool,
    },
    Join {
        player: String,
    },
    Leave {
        player: String,
    },
    ResearchStarted {
        tech: String,
    },
    ResearchFinished {
        tech: String,
    },
    PlayerDied {
        player: String,
        /// `None` when the mod did not report a cause at all.
        cause: Option<String>,
        /// `(deaths of this player, deaths overall)` from newer mod versions.
        death_counts: Option<(u64, u64)>,
    },
    RocketLaunched {
        count: u64,
    },
    Unrecognized,
}

/// Extraction rule for a top-level tag. Receives the text after the tag.
type LineRule = fn(&str) -> Option<LogEvent>;

/// Extraction rule for a mod sub-tag. Receives the `:`-separated fields.
type ModRule = fn(&[&str]) -> Option<LogEvent>;

/// Top-level tags in priority order.
pub const LINE_RULES: &[(&str, LineRule)] = &[
    ("CHAT", parse_chat),
    ("JOIN", parse_join),
    ("LEAVE", parse_leave),
    (MOD_TAG, parse_mod_entry),
];

/// Companion mod sub-tags in priority order.
pub const MOD_RULES: &[(&str, ModRule)] = &[
    ("RESEARCH_STARTED", parse_research_started),
    ("RESEARCH_FINISHED", parse_research_finished),
    ("PLAYER_DIED", parse_player_died),
    ("ROCKET_LAUNCHED", parse_rocket_launched),
];

/// Classify a raw log line. Never fails.
pub fn classify(line: &str) -> LogEvent {
    let Some((tag, rest)) = split_tag(line) else {
        debug!(line, "No tag found in log line, ignoring");
        return LogEvent::Unrecognized;
    };

    let event = LINE_RULES
        .iter()
        .find(|(name, _)| *name == tag)
        .and_then(|(_, rule)| rule(rest));

    match event {
        Some(event) => event,
        None => {
            debug!(line, tag, "Could not parse log line, ignoring");
            LogEvent::Unrecognized
        }
    }
}

/// Find the first `[TAG]` and return the tag and the text after it.
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let caps = TAG_PATTERN.captures(line).ok()??;
    let whole = caps.get(0)?;
    let tag = caps.get(1)?.as_str();
    Some((tag, &line[whole.end()..]))
}

fn parse_chat(rest: &str) -> Option<LogEvent> {
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let (speaker, body) = rest.split_once(": ")?;
    if speaker.is_empty() {
        return None;
    }
    Some(LogEvent::Chat {
        speaker: speaker.to_string(),
        body: body.to_string(),
        location_ping: body.contains(GPS_MARKER),
    })
}

fn first_word(rest: &str) -> Option<String> {
    rest.split_whitespace().next().map(str::to_string)
}

fn parse_join(rest: &str) -> Option<LogEvent> {
    first_word(rest).map(|player| LogEvent::Join { player })
}

fn parse_leave(rest: &str) -> Option<LogEvent> {
    first_word(rest).map(|player| LogEvent::Leave { player })
}

fn parse_mod_entry(rest: &str) -> Option<LogEvent> {
    let caps = MOD_ENTRY_PATTERN.captures(rest).ok()??;
    let sub_tag = caps.get(1)?.as_str();
    let payload = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    // Payload is ":a:b:c" or empty.
    let fields: Vec<&str> = match payload.strip_prefix(':') {
        Some(payload) => payload.split(':').collect(),
        None => Vec::new(),
    };

    MOD_RULES
        .iter()
        .find(|(name, _)| *name == sub_tag)
        .and_then(|(_, rule)| rule(&fields))
}

fn single_token(fields: &[&str]) -> Option<String> {
    match fields {
        [token] if !token.is_empty() && !token.contains(char::is_whitespace) => {
            Some(token.to_string())
        }
        _ => None,
    }
}

fn parse_research_started(fields: &[&str]) -> Option<LogEvent> {
    single_token(fields).map(|tech| LogEvent::ResearchStarted { tech })
}

fn parse_research_finished(fields: &[&str]) -> Option<LogEvent> {
    single_token(fields).map(|tech| LogEvent::ResearchFinished { tech })
}

fn parse_player_died(fields: &[&str]) -> Option<LogEvent> {
    let (player, cause, death_counts) = match fields {
        [player] => (player, None, None),
        [player, cause] => (player, Some(cause), None),
        [player, cause, deaths, total] => {
            let deaths = deaths.trim().parse::<u64>().ok()?;
            let total = total.trim().parse::<u64>().ok()?;
            (player, Some(cause), Some((deaths, total)))
        }
        _ => return None,
    };

    let player = player.trim();
    if player.is_empty() {
        return None;
    }

    Some(LogEvent::PlayerDied {
        player: player.to_string(),
        cause: cause.map(|c| c.trim().to_string()),
        death_counts,
    })
}

fn parse_rocket_launched(fields: &[&str]) -> Option<LogEvent> {
    match fields {
        [count] => count
            .trim()
            .parse::<u64>()
            .ok()
            .map(|count| LogEvent::RocketLaunched { count }),
        _ => None,
    }
}
