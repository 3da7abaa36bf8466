//! Brand voice.

use serde::{Deserialize, Serialize};

const DEFAULT_BRAND: &str = "PcComponentes";

const DEFAULT_RULES: [&str; 10] = [
    "Expert without being pedantic: explain the tech so anyone understands it, skip jargon for its own sake",
    "Unashamedly geeky: tech analogies and internet humor are welcome when they help the point land",
    "Honest but never boring: if something has a catch, say so; it builds trust",
    "Close without faking it: natural and warm, no diminutives, no emoji spam",
    "Address the reader directly and give a real opinion",
    "Translate specifications into practical benefits (\"144Hz\" becomes \"smoother matches without stutter\")",
    "Vary paragraph structure; never open two paragraphs the same way",
    "Avoid filler openers such as \"In today's world\", \"It is important to note\" or \"Without a doubt\"",
    "Avoid empty adjectives such as \"incredible\", \"revolutionary\" or \"impressive\"",
    "The verdict adds value of its own instead of summarizing what was already said",
];

/// Name and tone rules injected into every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandVoice {
    name: String,
    rules: Vec<String>,
}

impl BrandVoice {
    /// Create a voice from a brand name and tone rules.
    pub fn new(name: impl Into<String>, rules: Vec<String>) -> Self {
        Self { name: name.into(), rules }
    }

    /// Brand name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tone rules in prompt order.
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Render the rules as a bullet list.
    pub fn to_prompt_section(&self) -> String {
        let mut section = format!("Write in the voice of {}:\n", self.name);
        for rule in &self.rules {
            section.push_str("- ");
            section.push_str(rule);
            section.push('\n');
        }
        section
    }
}

impl Default for BrandVoice {
    fn default() -> Self {
        Self::new(DEFAULT_BRAND, DEFAULT_RULES.iter().map(|r| (*r).to_string()).collect())
    }
}
