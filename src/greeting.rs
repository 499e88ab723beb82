//! Greeting detection for the short-circuit path.

use clap::ValueEnum;

pub const GREETING_TOKENS: &[&str] = &[
    "hello",
    "hi",
    "good morning",
    "good afternoon",
    "hey",
    "안녕하세요",
    "안녕",
    "안뇽",
    "하이",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GreetingMatch {
    /// Case-insensitive containment anywhere in the text ("this" contains "hi").
    Substring,
    /// Greeting tokens must line up with whole words of the text.
    #[default]
    Word,
}

impl GreetingMatch {
    pub fn is_greeting(self, message: &str) -> bool {
        match self {
            Self::Substring => is_greeting(message),
            Self::Word => is_greeting_word(message),
        }
    }
}

/// Substring classifier: true iff the lowercased message contains any token.
pub fn is_greeting(message: &str) -> bool {
    let lowercase = message.to_lowercase();
    GREETING_TOKENS.iter().any(|greeting| lowercase.contains(greeting))
}

/// Word-boundary classifier. Multi-word tokens ("good morning") must appear
/// as consecutive words.
pub fn is_greeting_word(message: &str) -> bool {
    let lowercase = message.to_lowercase();
    let words = split_words(&lowercase);

    GREETING_TOKENS.iter().any(|greeting| {
        let needle = split_words(greeting);
        !needle.is_empty() && words.windows(needle.len()).any(|window| window == needle.as_slice())
    })
}

fn split_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}
