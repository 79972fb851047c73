//! Modifier, button, double-click and scroll bits of a trigger

use bitflags::bitflags;

bitflags! {
    /// Modifier/button/double-click/scroll bit-mask
    ///
    /// The same type describes both what a trigger requires and what the
    /// live input currently reports.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Mask: u32 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const META = 1 << 2;
        const ALT = 1 << 3;
        const ALT_GRAPH = 1 << 4;
        const WIN = 1 << 5;

        const BUTTON1 = 1 << 8;
        const BUTTON2 = 1 << 9;
        const BUTTON3 = 1 << 10;

        const DOUBLE_CLICK = 1 << 16;
        const SCROLL = 1 << 17;

        /// Only ever carried by the `not mapped` trigger; live input never sets it
        const NOT_MAPPED = 1 << 31;

        const BUTTONS = Self::BUTTON1.bits() | Self::BUTTON2.bits() | Self::BUTTON3.bits();

        /// Bits the host attaches to unrelated events; always taken from
        /// the physically-held state instead
        const PHYSICAL = Self::SHIFT.bits() | Self::META.bits() | Self::WIN.bits();
    }
}

/// Descriptor keywords in canonical formatting order
pub(crate) const KEYWORDS: &[(&str, Mask)] = &[
    ("shift", Mask::SHIFT),
    ("ctrl", Mask::CTRL),
    ("meta", Mask::META),
    ("alt", Mask::ALT),
    ("altGraph", Mask::ALT_GRAPH),
    ("win", Mask::WIN),
    ("button1", Mask::BUTTON1),
    ("button2", Mask::BUTTON2),
    ("button3", Mask::BUTTON3),
    ("double-click", Mask::DOUBLE_CLICK),
    ("scroll", Mask::SCROLL),
];

/// Alternative spellings accepted by the parser
const ALIASES: &[(&str, Mask)] = &[
    ("control", Mask::CTRL),
    ("cmd", Mask::META),
    ("command", Mask::META),
    ("windows", Mask::WIN),
];

impl Mask {
    /// Resolves a modifier keyword (case-insensitive)
    pub fn from_keyword(token: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .chain(ALIASES)
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(token))
            .map(|&(_, bit)| bit)
    }

    /// Canonical keywords of the bits set, in formatting order
    pub fn keywords(self) -> impl Iterator<Item = &'static str> {
        KEYWORDS
            .iter()
            .filter(move |(_, bit)| self.contains(*bit))
            .map(|&(keyword, _)| keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_remap() {
        assert_eq!(Mask::from_keyword("control"), Some(Mask::CTRL));
        assert_eq!(Mask::from_keyword("Command"), Some(Mask::META));
        assert_eq!(Mask::from_keyword("cmd"), Some(Mask::META));
        assert_eq!(Mask::from_keyword("windows"), Some(Mask::WIN));
        assert_eq!(Mask::from_keyword("ALTGRAPH"), Some(Mask::ALT_GRAPH));
        assert_eq!(Mask::from_keyword("A"), None);
    }

    #[test]
    fn test_keywords_in_canonical_order() {
        let mask = Mask::SCROLL | Mask::CTRL | Mask::SHIFT | Mask::BUTTON2;
        let words: Vec<_> = mask.keywords().collect();
        assert_eq!(words, vec!["shift", "ctrl", "button2", "scroll"]);
    }
}
