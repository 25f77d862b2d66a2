use serde::Deserialize;

/// Delimits the injected game tag from the channel's own name.
///
/// A base name that itself contains this token will be mis-split.
pub const SEPARATOR: &str = " \u{1F3AE} ";

/// Default maximum length (in characters) of the game tag.
pub const DEFAULT_MAX_TAG_LENGTH: usize = 15;

const ELLIPSIS: char = '…';

/// How an over-long game name is shortened before it is put in front of the channel name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationStyle {
    /// Keep the first `max` characters and append `…`.
    #[default]
    Trailing,
    /// Keep `max / 2` characters from each end with `…` in between.
    /// Names up to one character over the limit are left alone.
    Symmetric,
}

impl TruncationStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trailing" => Some(TruncationStyle::Trailing),
            "symmetric" => Some(TruncationStyle::Symmetric),
            _ => None,
        }
    }
}

/// Shorten a game name to fit in a channel name.
pub fn truncate_activity_name(name: &str, max: usize, style: TruncationStyle) -> String {
    let len = name.chars().count();
    match style {
        TruncationStyle::Trailing => {
            if len <= max {
                return name.to_string();
            }
            let mut out: String = name.chars().take(max).collect();
            out.push(ELLIPSIS);
            out
        }
        TruncationStyle::Symmetric => {
            if len <= max + 1 {
                return name.to_string();
            }
            let half = max / 2;
            let mut out: String = name.chars().take(half).collect();
            out.push(ELLIPSIS);
            out.extend(name.chars().skip(len - half));
            out
        }
    }
}

/// A channel display name split into its injected tag (if any) and the user's base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName<'a> {
    pub tag: Option<&'a str>,
    pub base: &'a str,
}

impl ParsedName<'_> {
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }
}

/// Split on the first separator. Without a separator the whole name is the base name.
pub fn parse_channel_name(name: &str) -> ParsedName<'_> {
    match name.split_once(SEPARATOR) {
        Some((tag, base)) => ParsedName {
            tag: Some(tag),
            base,
        },
        None => ParsedName { tag: None, base: name },
    }
}

/// Build `<tag><separator><base>`.
pub fn compose_channel_name(tag: &str, base: &str) -> String {
    format!("{tag}{SEPARATOR}{base}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_is_controller_glyph_with_spaces() {
        assert_eq!(SEPARATOR, " 🎮 ");
    }

    #[test]
    fn test_short_names_are_untouched() {
        assert_eq!(
            truncate_activity_name("Halo", 15, TruncationStyle::Trailing),
            "Halo"
        );
        assert_eq!(
            truncate_activity_name("Halo", 15, TruncationStyle::Symmetric),
            "Halo"
        );
        let exact = "a".repeat(15);
        assert_eq!(
            truncate_activity_name(&exact, 15, TruncationStyle::Trailing),
            exact
        );
    }

    #[test]
    fn test_trailing_truncation() {
        assert_eq!(
            truncate_activity_name(
                "Counter-Strike: Global Offensive",
                15,
                TruncationStyle::Trailing
            ),
            "Counter-Strike:…"
        );
    }

    #[test]
    fn test_symmetric_truncation() {
        assert_eq!(
            truncate_activity_name(
                "Counter-Strike: Global Offensive",
                16,
                TruncationStyle::Symmetric
            ),
            "Counter-…ffensive"
        );
        // One character over the limit is tolerated.
        let name = "a".repeat(17);
        assert_eq!(
            truncate_activity_name(&name, 16, TruncationStyle::Symmetric),
            name
        );
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let name = "ポケモン不思議のダンジョン救助隊DX";
        let out = truncate_activity_name(name, 5, TruncationStyle::Trailing);
        assert_eq!(out, "ポケモン不…");
        assert_eq!(out.chars().count(), 6);
    }

    #[test]
    fn test_parse_untagged_name() {
        let parsed = parse_channel_name("Lounge");
        assert_eq!(parsed.tag, None);
        assert_eq!(parsed.base, "Lounge");
        assert!(!parsed.is_tagged());
    }

    #[test]
    fn test_parse_tagged_name() {
        let parsed = parse_channel_name("Halo 🎮 Lounge");
        assert_eq!(parsed.tag, Some("Halo"));
        assert_eq!(parsed.base, "Lounge");
    }

    #[test]
    fn test_compose_then_parse_recovers_parts() {
        for (tag, base) in [
            ("Halo", "Lounge"),
            ("Counter-Strike:…", "General Voice"),
            ("", "x"),
            ("Rocket League", ""),
        ] {
            let name = compose_channel_name(tag, base);
            let parsed = parse_channel_name(&name);
            assert_eq!(parsed.tag, Some(tag));
            assert_eq!(parsed.base, base);
        }
    }

    #[test]
    fn test_truncation_style_parse() {
        assert_eq!(
            TruncationStyle::parse("Symmetric"),
            Some(TruncationStyle::Symmetric)
        );
        assert_eq!(
            TruncationStyle::parse(" trailing "),
            Some(TruncationStyle::Trailing)
        );
        assert_eq!(TruncationStyle::parse("middle"), None);
    }
}
