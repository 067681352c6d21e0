//! Title, description and tags of a published highlight compilation.

use chrono::{DateTime, Utc};

const TWITCH_URL: &str = "https://twitch.tv/";

/// Tags attached to every compilation.
pub const DEFAULT_TAGS: [&str; 3] = ["Twitch", "Clip", "Highlight"];

/// `"ACME HIGHLIGHTS TWITCH MAY #3"`
pub fn highlight_title(creator: &str, date: DateTime<Utc>, sequence: i64) -> String {
    format!(
        "{} HIGHLIGHTS TWITCH {} #{}",
        creator.to_uppercase(),
        date.format("%b").to_string().to_uppercase(),
        sequence
    )
}

/// Description listing the creator's channel and, when configured, the
/// channel manager contact.
pub fn highlight_description(
    display_name: &str,
    login: &str,
    date: DateTime<Utc>,
    contact: Option<&str>,
) -> String {
    let month = date.format("%B");
    let mut description = format!(
        "This is a compilation of the most viewed clips from {display_name} from {month}.\n\
         \n\
         Follow {display_name} on Twitch:\n\
         ► Twitch: {TWITCH_URL}{login}\n"
    );
    if let Some(contact) = contact {
        description.push_str(&format!(
            "\nFor Video Removal and Copyright Issues:\nChannel Manager/Editor:\n► {contact}\n"
        ));
    }
    description
}

pub fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn may() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_title() {
        assert_eq!(highlight_title("acme", may(), 3), "ACME HIGHLIGHTS TWITCH MAY #3");
    }

    #[test]
    fn test_description_with_contact() {
        let text = highlight_description("Acme", "acme", may(), Some("editor@example.com"));
        assert!(text.starts_with("This is a compilation of the most viewed clips from Acme from May."));
        assert!(text.contains("Follow Acme on Twitch:"));
        assert!(text.contains("► Twitch: https://twitch.tv/acme"));
        assert!(text.contains("► editor@example.com"));
    }

    #[test]
    fn test_description_without_contact() {
        let text = highlight_description("Acme", "acme", may(), None);
        assert!(!text.contains("Channel Manager"));
    }
}
