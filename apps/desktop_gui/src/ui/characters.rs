//! Presentational character catalog keyed by `character_choice`. Unknown
//! keys fall back to the teddy, matching what recipients of old links see.

use egui::Color32;

pub struct CharacterArt {
    pub key: &'static str,
    pub display_name: &'static str,
    pub emoji: &'static str,
    pub accent: Color32,
}

pub const CHARACTER_CHOICES: [CharacterArt; 3] = [
    CharacterArt {
        key: "panda",
        display_name: "Cute Panda",
        emoji: "🐼",
        accent: Color32::from_rgb(0x6B, 0x7A, 0x8F),
    },
    CharacterArt {
        key: "bear",
        display_name: "Couple Teddy",
        emoji: "🧸",
        accent: Color32::from_rgb(0xC4, 0x8A, 0x5A),
    },
    CharacterArt {
        key: "seal",
        display_name: "Sappy Seals",
        emoji: "🦭",
        accent: Color32::from_rgb(0x8F, 0xB4, 0xC9),
    },
];

pub fn character_art(key: &str) -> &'static CharacterArt {
    CHARACTER_CHOICES
        .iter()
        .find(|art| art.key == key)
        .unwrap_or(&CHARACTER_CHOICES[1])
}
