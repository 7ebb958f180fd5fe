//! crates/soul_whispers_core/src/catalog.rs
//!
//! The static content catalog: categories with their sub-topics, supported languages,
//! narration voices and the display-preference scales.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubTopic {
    pub label: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub sub_topics: &'static [SubTopic],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub id: &'static str,
    pub label: &'static str,
    pub gender: &'static str,
    pub icon: &'static str,
}

/// One step of a display-preference scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScaleStep {
    pub label: &'static str,
}

pub const FONT_SIZES: &[ScaleStep] = &[
    ScaleStep { label: "S" },
    ScaleStep { label: "M" },
    ScaleStep { label: "L" },
    ScaleStep { label: "XL" },
];

pub const LINE_SPACINGS: &[ScaleStep] = &[
    ScaleStep { label: "Tight" },
    ScaleStep { label: "Relaxed" },
    ScaleStep { label: "Loose" },
];

pub const VOICES: &[Voice] = &[
    Voice { id: "Kore", label: "Bright & Clear", gender: "Female", icon: "✨" },
    Voice { id: "Zephyr", label: "Gentle & Soothing", gender: "Female", icon: "🌬️" },
    Voice { id: "Puck", label: "Warm & Friendly", gender: "Male", icon: "☀️" },
    Voice { id: "Charon", label: "Deep & Resonant", gender: "Male", icon: "🌊" },
];

pub const DEFAULT_LANGUAGE_NAME: &str = "English";

pub const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English", native_name: "English" },
    Language { code: "es", name: "Spanish", native_name: "Español" },
    Language { code: "hi", name: "Hindi", native_name: "हिन्दी" },
    Language { code: "bn", name: "Bengali", native_name: "বাংলা" },
    Language { code: "te", name: "Telugu", native_name: "తెలుగు" },
    Language { code: "ta", name: "Tamil", native_name: "தமிழ்" },
    Language { code: "ur", name: "Urdu", native_name: "اردو" },
    Language { code: "ar", name: "Arabic", native_name: "العربية" },
    Language { code: "zh", name: "Chinese", native_name: "中文" },
    Language { code: "fr", name: "French", native_name: "Français" },
    Language { code: "pt", name: "Portuguese", native_name: "Português" },
    Language { code: "de", name: "German", native_name: "Deutsch" },
    Language { code: "it", name: "Italian", native_name: "Italiano" },
    Language { code: "ko", name: "Korean", native_name: "한국어" },
    Language { code: "ja", name: "Japanese", native_name: "日本語" },
];

macro_rules! topics {
    ($(($label:expr, $icon:expr)),* $(,)?) => {
        &[$(SubTopic { label: $label, icon: $icon }),*]
    };
}

pub const CATEGORIES: &[Category] = &[
    Category {
        id: "holy_spirit",
        label: "Holy Spirit",
        icon: "🕊️",
        description: "Guidance, comfort, and the power of the indwelling Spirit.",
        sub_topics: topics![
            ("Divine Guidance", "🧭"), ("Comforter", "🫂"), ("Empowerment", "⚡"),
            ("Seal of Promise", "📜"), ("Conviction", "⚖️"), ("Anointing", "🍯"),
            ("Intercession", "🙏"), ("Sweet Fellowship", "🤝"),
        ],
    },
    Category {
        id: "fruit_of_spirit",
        label: "Fruit of the Spirit",
        icon: "🍇",
        description: "Cultivating the character and nature of Christ.",
        sub_topics: topics![
            ("Unconditional Love", "❤️"), ("Abiding Joy", "✨"), ("Surpassing Peace", "🌊"),
            ("Long-suffering", "⏳"), ("Kindness", "🍯"), ("Goodness", "💎"),
            ("Faithfulness", "⚓"), ("Gentleness", "🦋"), ("Self-Control", "🛡️"),
        ],
    },
    Category {
        id: "blessings",
        label: "Divine Blessings",
        icon: "✨",
        description: "Invoking favor and abundance over every area of life.",
        sub_topics: topics![
            ("Household Peace", "🏠"), ("Generational", "🌳"), ("Fruitful Labor", "🛠️"),
            ("Divine Favor", "🌟"), ("Spiritual Riches", "💰"), ("Health & Vitality", "🌿"),
            ("Wisdom & Insight", "💡"), ("Overflowing Joy", "🍷"),
        ],
    },
    Category {
        id: "gifts_spirit",
        label: "Spiritual Gifts",
        icon: "🎁",
        description: "Activating the supernatural abilities given for the body.",
        sub_topics: topics![
            ("Word of Wisdom", "💎"), ("Word of Knowledge", "🔍"), ("Gift of Faith", "⛰️"),
            ("Gifts of Healing", "🩹"), ("Working of Miracles", "🌊"), ("Prophecy", "🗣️"),
            ("Discernment", "⚖️"), ("Various Tongues", "🔥"),
        ],
    },
    Category {
        id: "holiness",
        label: "Holiness & Purity",
        icon: "🕯️",
        description: "Walking the path of sanctification and righteousness.",
        sub_topics: topics![
            ("Purity of Heart", "🤍"), ("Sanctification", "🧼"), ("Set Apart", "🛡️"),
            ("Righteous Walk", "👣"), ("Transformation", "🦋"), ("Fear of the Lord", "🙇"),
            ("Consecration", "🏺"), ("Victory over Sin", "⚔️"),
        ],
    },
    Category {
        id: "deliverance",
        label: "Deliverance",
        icon: "⛓️",
        description: "Breaking chains and finding freedom in Christ.",
        sub_topics: topics![
            ("Breaking Addictions", "🔗"), ("Chain Breaking", "🔨"),
            ("Protection from Evil", "🛡️"), ("Emotional Healing", "❤️‍🩹"),
            ("Spiritual Victory", "🚩"), ("Mind Renewal", "🧠"),
            ("Stronghold Breaking", "🏰"), ("Freedom from Fear", "🕊️"),
        ],
    },
    Category {
        id: "second_coming",
        label: "The Second Coming",
        icon: "🎺",
        description: "The blessed hope of the Lord’s return.",
        sub_topics: topics![
            ("Watchfulness", "👁️"), ("Readiness", "🕯️"), ("Hope of Glory", "🌅"),
            ("Kingdom Come", "👑"), ("Eternal Life", "♾️"), ("Final Victory", "🏆"),
            ("Bride of Christ", "💍"), ("The Great Day", "☀️"),
        ],
    },
    Category {
        id: "heaven",
        label: "Heavenly Home",
        icon: "🏰",
        description: "Glimpsing the eternal dwelling and presence of God.",
        sub_topics: topics![
            ("Eternal Rest", "🛌"), ("No More Pain", "🚫"), ("God's Presence", "☁️"),
            ("New Jerusalem", "🏙️"), ("Crown of Life", "👑"), ("Family Reunion", "👨‍👩‍👧‍👦"),
            ("Golden Streets", "✨"), ("Worship Forever", "🎶"),
        ],
    },
    Category {
        id: "children",
        label: "Children",
        icon: "👶",
        description: "Protection and guidance for the next generation.",
        sub_topics: topics![
            ("Safety", "🛡️"), ("Spiritual Growth", "🌱"), ("School Success", "📚"),
            ("Purpose", "🎯"), ("Healing", "🌿"), ("Friendships", "🤝"),
            ("Obedience", "🙏"), ("Future Spouse", "💍"),
        ],
    },
    Category {
        id: "marriage",
        label: "Marriage",
        icon: "💍",
        description: "Unity and harmony in the marital bond.",
        sub_topics: topics![
            ("Communication", "🗣️"), ("Forgiveness", "🕊️"), ("Intimacy", "🕯️"),
            ("Rekindling Love", "🔥"), ("Conflict Resolution", "⚖️"),
            ("Infidelity Healing", "❤️‍🩹"),
        ],
    },
    Category {
        id: "health",
        label: "Physical Health",
        icon: "🌿",
        description: "Divine healing and bodily restoration.",
        sub_topics: topics![
            ("Chronic Pain", "🩹"), ("Cancer Battle", "🎗️"), ("Surgery Prep", "🩺"),
            ("Mental Clarity", "💡"), ("Immune System", "🛡️"), ("Strength", "🏋️"),
        ],
    },
    Category {
        id: "finances",
        label: "Finances",
        icon: "📈",
        description: "Provision and stewardship in difficult times.",
        sub_topics: topics![
            ("Debt Freedom", "✂️"), ("Unexpected Bills", "💸"), ("Job Loss", "📉"),
            ("Business Favor", "🏢"), ("Stewardship", "🤲"), ("Inflation", "🍞"),
        ],
    },
    Category {
        id: "morning_night",
        label: "Daily Rhythms",
        icon: "🌗",
        description: "Prayers for sunrise and sunset.",
        sub_topics: topics![
            ("Morning Energy", "☀️"), ("Night Peace", "🌙"), ("Protection", "🏰"),
            ("Meal Grace", "🍞"), ("Travel", "✈️"), ("Exams", "📝"),
        ],
    },
];

pub fn category(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

pub fn language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

pub fn voice(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.id == id)
}

pub fn default_category() -> &'static Category {
    &CATEGORIES[0]
}

pub fn default_voice() -> &'static Voice {
    &VOICES[0]
}

impl Category {
    pub fn first_sub_topic(&self) -> Option<&'static SubTopic> {
        self.sub_topics.first()
    }

    pub fn has_sub_topic(&self, label: &str) -> bool {
        self.sub_topics.iter().any(|t| t.label == label)
    }
}

/// Everything the selection screen needs in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub categories: &'static [Category],
    pub languages: &'static [Language],
    pub voices: &'static [Voice],
    pub font_sizes: &'static [ScaleStep],
    pub line_spacings: &'static [ScaleStep],
}

pub fn snapshot() -> CatalogSnapshot {
    CatalogSnapshot {
        categories: CATEGORIES,
        languages: LANGUAGES,
        voices: VOICES,
        font_sizes: FONT_SIZES,
        line_spacings: LINE_SPACINGS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn category_ids_are_unique() {
        let ids: HashSet<_> = CATEGORIES.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), CATEGORIES.len());
    }

    #[test]
    fn every_category_has_sub_topics() {
        for c in CATEGORIES {
            assert!(c.first_sub_topic().is_some(), "{} has no sub-topics", c.id);
        }
    }

    #[test]
    fn lookups_resolve_known_ids() {
        assert_eq!(category("marriage").map(|c| c.label), Some("Marriage"));
        assert_eq!(language("es").map(|l| l.name), Some("Spanish"));
        assert_eq!(voice("Charon").map(|v| v.gender), Some("Male"));
        assert!(category("nope").is_none());
        assert!(voice("Alloy").is_none());
    }

    #[test]
    fn sub_topic_membership_is_per_category() {
        let health = category("health").unwrap();
        assert!(health.has_sub_topic("Strength"));
        assert!(!health.has_sub_topic("Debt Freedom"));
    }

    #[test]
    fn defaults_point_at_first_entries() {
        assert_eq!(default_category().id, "holy_spirit");
        assert_eq!(default_voice().id, "Kore");
        assert_eq!(FONT_SIZES.len(), 4);
        assert_eq!(LINE_SPACINGS.len(), 3);
    }
}
