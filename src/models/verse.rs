#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Verse {
    pub(crate) reference: &'static str,
    pub(crate) text: &'static str,
}

pub(crate) const VERSES: &[Verse] = &[
    Verse {
        reference: "Malachi 3:10",
        text: "Bring the whole tithe into the storehouse... 'Test me in this,' says the LORD Almighty.",
    },
    Verse {
        reference: "Proverbs 21:20",
        text: "The wise store up choice food and olive oil, but fools gulp theirs down.",
    },
    Verse {
        reference: "Luke 14:28",
        text: "Suppose one of you wants to build a tower. Won't you first sit down and estimate the cost?",
    },
    Verse {
        reference: "2 Corinthians 9:7",
        text: "God loves a cheerful giver.",
    },
    Verse {
        reference: "Philippians 4:11-12",
        text: "I have learned to be content whatever the circumstances...",
    },
];

/// Verse for a stored index; out-of-range indices wrap.
pub(crate) fn verse_at(index: usize) -> &'static Verse {
    &VERSES[index % VERSES.len()]
}
