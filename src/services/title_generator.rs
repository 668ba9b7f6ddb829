// Title Generator
// Friendly fireplace-style title suggestions for new sessions

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Cozy", "Warm", "Crackling", "Peaceful", "Relaxing", "Ambient", "Soothing", "Tranquil", "Serene",
    "Calming",
];

const NOUNS: &[&str] = &["Fireplace", "Hearth", "Flames", "Embers", "Campfire", "Bonfire", "Fire", "Blaze"];

const TIMES: &[&str] = &["Evening", "Night", "Morning", "Afternoon", "Winter", "Holiday", "Weekend", "Midnight"];

/// Suggest a title such as "Cozy Hearth - Evening"
pub fn suggest_title() -> String {
    suggest_title_with(&mut rand::thread_rng())
}

pub fn suggest_title_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    // The word lists are non-empty constants
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Cozy");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Fireplace");
    let time = TIMES.choose(rng).copied().unwrap_or("Evening");
    format!("{adjective} {noun} - {time}")
}
