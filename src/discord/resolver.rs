//! Emoji and mention resolution for Discord -> game text.
//!
//! The game font cannot render emoji or Discord markup, so they are
//! rewritten into plain text before a message is relayed.

use std::sync::LazyLock;

use fancy_regex::{Captures, Regex};

/// Custom server emoji (`<:name:id>` or `<a:name:id>`).
static CUSTOM_EMOJI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<a?:([a-zA-Z0-9_]+):\d+>").expect("custom emoji pattern is valid")
});

/// User mentions (`<@123>` or `<@!123>`).
static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern is valid"));

/// Longest emoji sequence tried, in chars (ZWJ families, flags, keycaps).
const MAX_EMOJI_CHARS: usize = 10;

/// Slug for an emoji name: lower-case, words joined with `-`.
///
/// `thumbs up` becomes `thumbs-up`, `flag: Germany` becomes `flag-germany`.
pub fn emoji_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn could_start_emoji(ch: char, next: Option<char>) -> bool {
    // Keycaps start with an ASCII digit, `#` or `*`.
    !ch.is_ascii() || matches!(next, Some('\u{FE0F}') | Some('\u{20E3}'))
}

/// Replace Unicode emoji with `**slug**`.
///
/// At every position the longest known emoji sequence wins, so skin tones
/// and joined sequences resolve as one emoji.
pub fn resolve_unicode_emojis_to_text(message: &str) -> String {
    let chars: Vec<(usize, char)> = message.char_indices().collect();
    let mut result = String::with_capacity(message.len());
    let mut i = 0;

    while i < chars.len() {
        let (start, ch) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        let mut matched = None;
        if could_start_emoji(ch, next) {
            let longest = (chars.len() - i).min(MAX_EMOJI_CHARS);
            for len in (1..=longest).rev() {
                let end = chars.get(i + len).map_or(message.len(), |&(idx, _)| idx);
                if let Some(emoji) = emojis::get(&message[start..end]) {
                    matched = Some((emoji, len));
                    break;
                }
            }
        }

        match matched {
            Some((emoji, len)) => {
                result.push_str("**");
                result.push_str(&emoji_slug(emoji.name()));
                result.push_str("**");
                i += len;
            }
            None => {
                result.push(ch);
                i += 1;
            }
        }
    }

    result
}

/// Replace custom server emoji with `**name**`.
pub fn resolve_custom_emojis_to_text(message: &str) -> String {
    CUSTOM_EMOJI_PATTERN
        .replace_all(message, "**$1**")
        .to_string()
}

/// Replace user mentions with `@name` for the users the message mentions.
///
/// Unknown ids are left as they are.
pub fn resolve_mentions_to_text(message: &str, mentioned: &[(u64, String)]) -> String {
    MENTION_PATTERN
        .replace_all(message, |caps: &Captures| -> String {
            if let Ok(user_id) = caps[1].parse::<u64>() {
                if let Some((_, name)) = mentioned.iter().find(|(id, _)| *id == user_id) {
                    return format!("@{}", name);
                }
            }
            caps[0].to_string()
        })
        .to_string()
}

/// Full Discord -> game text preparation.
///
/// Attachment URLs are appended, separated by spaces.
pub fn process_discord_to_game<'a>(
    content: &str,
    attachment_urls: impl IntoIterator<Item = &'a str>,
    mentioned: &[(u64, String)],
) -> String {
    let mut full = content.to_string();
    for url in attachment_urls {
        if !full.is_empty() {
            full.push(' ');
        }
        full.push_str(url);
    }

    let step1 = resolve_mentions_to_text(&full, mentioned);
    let step2 = resolve_custom_emojis_to_text(&step1);
    resolve_unicode_emojis_to_text(&step2)
}
