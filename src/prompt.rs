//! Prompt assembly for description generation, and cleanup of what comes back.

use std::collections::HashSet;

use crate::models::UserInfo;

pub const INSTRUCTION: &str = "Create an attractive dating profile description based on the information above. Make it engaging, authentic, and positive:";

const MAX_CAPTIONS: usize = 3;
const MIN_LINE_CHARS: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 500;

pub fn build_prompt(user_info: &UserInfo, captions: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(age) = user_info.age {
        lines.push(format!("Age: {age}"));
    }
    let labelled = [
        ("Interests", user_info.interests.as_str()),
        ("Occupation", user_info.occupation.as_str()),
        ("Location", user_info.location.as_str()),
        ("Personality", user_info.personality.as_str()),
        ("Looking for", user_info.looking_for.as_str()),
    ];
    for (label, value) in labelled {
        let value = value.trim();
        if !value.is_empty() {
            lines.push(format!("{label}: {value}"));
        }
    }
    if let Some(style) = user_info.style {
        lines.push(format!("Style: {style}"));
    }

    if !captions.is_empty() {
        lines.push("Photos show:".to_string());
        lines.extend(captions.iter().take(MAX_CAPTIONS).cloned());
    }

    lines.push(String::new());
    lines.push(INSTRUCTION.to_string());
    lines.join("\n")
}

/// Trims lines, drops short ones and repeats, and bounds the length.
pub fn clean_description(raw: &str) -> String {
    let mut seen = HashSet::new();
    let kept: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
        .filter(|line| seen.insert(*line))
        .collect();

    let joined = kept.join("\n");
    if joined.chars().count() > MAX_DESCRIPTION_CHARS {
        let mut truncated: String = joined.chars().take(MAX_DESCRIPTION_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        joined
    }
}

/// Generators often echo their prompt before continuing it.
pub fn strip_prompt_echo<'a>(generated: &'a str, prompt: &str) -> &'a str {
    generated.strip_prefix(prompt).unwrap_or(generated).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileStyle;

    fn captions(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prompt_lists_present_fields_in_order() {
        let info = UserInfo {
            age: Some(28),
            occupation: "graphic designer".into(),
            location: "San Francisco".into(),
            interests: "photography, hiking, cooking".into(),
            personality: "creative and adventurous".into(),
            looking_for: String::new(),
            style: Some(ProfileStyle::Adventurous),
        };
        let prompt = build_prompt(&info, &[]);
        let expected = "Age: 28\n\
            Interests: photography, hiking, cooking\n\
            Occupation: graphic designer\n\
            Location: San Francisco\n\
            Personality: creative and adventurous\n\
            Style: adventurous\n\n";
        assert_eq!(prompt, format!("{expected}{INSTRUCTION}"));
        assert!(!prompt.contains("Photos show:"));
    }

    #[test]
    fn at_most_three_captions() {
        let info = UserInfo {
            age: Some(25),
            ..Default::default()
        };
        let prompt = build_prompt(
            &info,
            &captions(&["person hiking", "person reading", "person smiling", "extra description"]),
        );
        assert!(prompt.contains("Photos show:\nperson hiking\nperson reading\nperson smiling\n"));
        assert!(!prompt.contains("extra description"));
    }

    #[test]
    fn minimal_prompt_still_has_instruction() {
        let prompt = build_prompt(&UserInfo { age: Some(30), ..Default::default() }, &[]);
        assert!(prompt.starts_with("Age: 30\n"));
        assert!(prompt.ends_with(INSTRUCTION));
    }

    #[test]
    fn cleaning_drops_short_and_repeated_lines() {
        let messy = "Great person.\nGreat person.\nLoves hiking and reading.\n\nShort.\n  Loves hiking and reading.  \nAnother line here.";
        assert_eq!(
            clean_description(messy),
            "Great person.\nLoves hiking and reading.\nAnother line here."
        );
        assert_eq!(clean_description(""), "");

        let single = "This is a single line description that should remain unchanged.";
        assert_eq!(clean_description(single), single);
    }

    #[test]
    fn long_output_is_truncated() {
        let cleaned = clean_description(&"A".repeat(600));
        assert_eq!(cleaned.chars().count(), 503);
        assert!(cleaned.ends_with("..."));

        let exact = "B".repeat(500);
        assert_eq!(clean_description(&exact), exact);
    }

    #[test]
    fn echoed_prompt_is_removed() {
        assert_eq!(strip_prompt_echo("PROMPT Hello there", "PROMPT"), "Hello there");
        assert_eq!(strip_prompt_echo("Hello there", "PROMPT"), "Hello there");
    }
}
