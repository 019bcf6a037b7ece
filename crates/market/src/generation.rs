use serde::{Deserialize, Serialize};

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "best", "how", "why", "what", "when", "where",
];

const TOPIC_TOKEN: &str = "[INSERT YOUR TOPIC/NICHE HERE]";
const MAIN_KEYWORD_TOKEN: &str = "[INSERT MAIN KEYWORD HERE]";
const SECONDARY_KEYWORDS_TOKEN: &str = "[INSERT SECONDARY KEYWORDS]";
const BRAND_VOICE_TOKEN: &str = "[INSERT BRAND VOICE: friendly, professional, witty, etc.]";

pub const DEFAULT_BRAND_VOICE: &str = "professional";

/// User-supplied customization for a generation request. Only the topic is
/// mandatory; the rest is defaulted from it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationInput {
    pub topic: String,
    #[serde(default)]
    pub main_keyword: Option<String>,
    #[serde(default)]
    pub secondary_keywords: Option<String>,
    #[serde(default)]
    pub brand_voice: Option<String>,
}

impl GenerationInput {
    fn main_keyword(&self) -> String {
        self.main_keyword
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| extract_main_keyword(&self.topic))
    }

    fn secondary_keywords(&self) -> String {
        self.secondary_keywords
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| generate_secondary_keywords(&self.topic))
    }

    fn brand_voice(&self) -> String {
        self.brand_voice
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BRAND_VOICE.to_string())
    }
}

/// Substitutes the template's placeholder tokens with the request values,
/// filling gaps with smart defaults derived from the topic.
pub fn fill_template(template: &str, input: &GenerationInput) -> String {
    template
        .replace(TOPIC_TOKEN, &input.topic)
        .replace(MAIN_KEYWORD_TOKEN, &input.main_keyword())
        .replace(SECONDARY_KEYWORDS_TOKEN, &input.secondary_keywords())
        .replace(BRAND_VOICE_TOKEN, &input.brand_voice())
}

fn meaningful_words(topic: &str) -> Vec<String> {
    topic
        .to_lowercase()
        .split_whitespace()
        .filter(|word| {
            word.len() > 2
                && !STOP_WORDS.contains(word)
                && !word.chars().all(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
        .collect()
}

/// Most relevant words of the topic (up to two) as the main keyword.
fn extract_main_keyword(topic: &str) -> String {
    let words = meaningful_words(topic);
    if words.is_empty() {
        topic
            .split_whitespace()
            .take(2)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        words[..words.len().min(2)].join(" ")
    }
}

/// Related keyword variations derived from the topic.
fn generate_secondary_keywords(topic: &str) -> String {
    let words = meaningful_words(topic);
    if words.is_empty() {
        return format!("{topic} tips, {topic} guide, best {topic}");
    }

    let mut variations = Vec::new();
    for word in &words {
        variations.push(format!("{word}s"));
        variations.push(format!("{word} tips"));
        variations.push(format!("{word} guide"));
        variations.push(format!("best {word}"));
    }
    variations.truncate(5);
    variations.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_only(topic: &str) -> GenerationInput {
        GenerationInput {
            topic: topic.into(),
            main_keyword: None,
            secondary_keywords: None,
            brand_voice: None,
        }
    }

    #[test]
    fn fills_every_placeholder() {
        let template = format!(
            "Write about {TOPIC_TOKEN} targeting {MAIN_KEYWORD_TOKEN}; also {SECONDARY_KEYWORDS_TOKEN}. Voice: {BRAND_VOICE_TOKEN}."
        );
        let filled = fill_template(&template, &topic_only("indoor gardening"));
        assert!(!filled.contains("[INSERT"));
        assert!(filled.contains("indoor gardening"));
        assert!(filled.contains(DEFAULT_BRAND_VOICE));
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let input = GenerationInput {
            topic: "indoor gardening".into(),
            main_keyword: Some("hydroponics".into()),
            secondary_keywords: Some("grow lights, soil".into()),
            brand_voice: Some("witty".into()),
        };
        let filled = fill_template(
            &format!("{MAIN_KEYWORD_TOKEN} / {SECONDARY_KEYWORDS_TOKEN} / {BRAND_VOICE_TOKEN}"),
            &input,
        );
        assert_eq!(filled, "hydroponics / grow lights, soil / witty");
    }

    #[test]
    fn main_keyword_drops_stop_words() {
        assert_eq!(
            extract_main_keyword("the best coffee for beginners"),
            "coffee beginners"
        );
    }

    #[test]
    fn main_keyword_falls_back_to_topic_words() {
        // everything filtered out, fall back to the raw topic
        assert_eq!(extract_main_keyword("the of"), "the of");
    }

    #[test]
    fn secondary_keywords_build_variations() {
        let keywords = generate_secondary_keywords("coffee");
        assert!(keywords.contains("coffees"));
        assert!(keywords.contains("coffee tips"));
        assert!(keywords.contains("best coffee"));
        assert!(keywords.split(", ").count() <= 5);
    }

    #[test]
    fn numeric_words_are_ignored()  {
        assert_eq!(extract_main_keyword("top 10 hiking trails"), "top hiking");
    }
}
