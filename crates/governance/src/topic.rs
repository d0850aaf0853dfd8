//! Picking the discussion topic for a new proposing phase

use rand::seq::SliceRandom;
use rand::Rng;

use crate::rule::OfficialRule;

/// Number of challenges the game show is meant to have
pub const NUM_CHALLENGES: u32 = 10;

/// Topic used once every challenge is covered and no curated topic is left
pub const FALLBACK_TOPIC: &str = "The mechanics of the overall game";

const WORD_ORDINALS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth",
    "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// `1st`, `2nd`, `3rd`, `11th`, ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Whether a rule text talks about challenge `n`
pub fn is_about_challenge(description: &str, n: u32) -> bool {
    let text = description.to_lowercase();
    let mut phrases = vec![
        format!("challenge {}", n),
        format!("challenge #{}", n),
        format!("{} challenge", ordinal(n)),
    ];
    if let Some(word) = n.checked_sub(1).and_then(|i| WORD_ORDINALS.get(i as usize)) {
        phrases.push(format!("{} challenge", word));
    }

    phrases.iter().any(|phrase| mentions(&text, phrase))
}

/// `phrase` occurs in `text` and is not the start of a longer number
fn mentions(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase)
        .any(|(start, _)| !text[start + phrase.len()..].starts_with(|c: char| c.is_ascii_digit()))
}

/// Lowest-numbered challenge no official rule mentions yet
pub fn first_uncovered_challenge(rules: &[OfficialRule]) -> Option<u32> {
    (1..=NUM_CHALLENGES).find(|n| !rules.iter().any(|rule| is_about_challenge(&rule.description, *n)))
}

/// Question asked when challenge `n` has no rules yet
pub fn challenge_topic(n: u32) -> String {
    format!(
        "Challenge {} doesn't exist yet. What ideas do you have for it? Any specific mechanics, \
         story, or dynamics come to mind for the challenge? What would be fun and unique?",
        n
    )
}

/// Pick the next topic: a random curated one, else the first challenge that
/// still has no rules, else the generic fallback.
pub fn select_topic<R: Rng + ?Sized>(rules: &[OfficialRule], curated: &[String], rng: &mut R) -> String {
    if let Some(topic) = curated.choose(rng) {
        return topic.clone();
    }

    match first_uncovered_challenge(rules) {
        Some(n) => challenge_topic(n),
        None => FALLBACK_TOPIC.to_string(),
    }
}
