// src/tiles.rs
use std::fmt;

/// Number of physical tiles in a full set.
pub const TILES_IN_GAME: usize = 144;

/// Number of distinct (suit, rank) kinds, bonus tiles included.
pub const KIND_COUNT: usize = 42;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Dots = 0,
    Bamboo,
    Characters,
    Honors,
    Bonus,
}

impl Suit {
    pub const ALL: [Suit; 5] =
        [Suit::Dots, Suit::Bamboo, Suit::Characters, Suit::Honors, Suit::Bonus];

    /// Suits whose tiles can be grouped (everything but bonus tiles).
    pub const PLAYABLE: [Suit; 4] = [Suit::Dots, Suit::Bamboo, Suit::Characters, Suit::Honors];

    pub fn max_rank(self) -> u8 {
        match self {
            Suit::Dots | Suit::Bamboo | Suit::Characters => 9,
            Suit::Honors => 7,
            Suit::Bonus => 8,
        }
    }

    /// Only the three number suits form runs.
    pub fn forms_runs(self) -> bool {
        matches!(self, Suit::Dots | Suit::Bamboo | Suit::Characters)
    }

    /// Index into per-suit count tables; `None` for bonus tiles.
    pub fn playable_index(self) -> Option<usize> {
        match self {
            Suit::Bonus => None,
            s => Some(s as usize),
        }
    }

    fn copies(self) -> u8 {
        if self == Suit::Bonus { 1 } else { 4 }
    }

    fn first_flat_index(self) -> u8 {
        match self {
            Suit::Dots => 0,
            Suit::Bamboo => 9,
            Suit::Characters => 18,
            Suit::Honors => 27,
            Suit::Bonus => 34,
        }
    }
}

// Ranks are 1-based; index 0 of each row is the rank-1 tile.
const GLYPHS: [&[char]; 5] = [
    &['🀙', '🀚', '🀛', '🀜', '🀝', '🀞', '🀟', '🀠', '🀡'],
    &['🀐', '🀑', '🀒', '🀓', '🀔', '🀕', '🀖', '🀗', '🀘'],
    &['🀇', '🀈', '🀉', '🀊', '🀋', '🀌', '🀍', '🀎', '🀏'],
    &['🀀', '🀁', '🀂', '🀃', '🀄', '🀅', '🀆'],
    &['🀢', '🀣', '🀤', '🀥', '🀦', '🀧', '🀨', '🀩'],
];

/// Gameplay identity of a tile: two tiles of the same kind are interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKind {
    suit: Suit,
    rank: u8,
}

const fn kind(suit: Suit, rank: u8) -> TileKind {
    TileKind { suit, rank }
}

/// The seven honors plus the terminals of each number suit.
pub const SPECIAL_WIN_KINDS: [TileKind; 13] = [
    kind(Suit::Honors, 1),
    kind(Suit::Honors, 2),
    kind(Suit::Honors, 3),
    kind(Suit::Honors, 4),
    kind(Suit::Honors, 5),
    kind(Suit::Honors, 6),
    kind(Suit::Honors, 7),
    kind(Suit::Dots, 1),
    kind(Suit::Dots, 9),
    kind(Suit::Bamboo, 1),
    kind(Suit::Bamboo, 9),
    kind(Suit::Characters, 1),
    kind(Suit::Characters, 9),
];

impl TileKind {
    pub fn new(suit: Suit, rank: u8) -> Option<Self> {
        (1..=suit.max_rank()).contains(&rank).then_some(TileKind { suit, rank })
    }

    pub fn suit(self) -> Suit {
        self.suit
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn is_bonus(self) -> bool {
        self.suit == Suit::Bonus
    }

    /// Same suit, rank shifted by `delta`; `None` when that leaves the suit.
    pub fn offset(self, delta: i8) -> Option<Self> {
        let rank = self.rank as i16 + delta as i16;
        if rank < 1 || rank > self.suit.max_rank() as i16 {
            return None;
        }
        Some(TileKind { suit: self.suit, rank: rank as u8 })
    }

    /// Flat index 0..42 (dots, bamboo, characters, honors, bonus).
    pub fn index(self) -> u8 {
        self.suit.first_flat_index() + self.rank - 1
    }

    /// Returns the common Unicode Mahjong tile symbol
    pub fn to_unicode(self) -> char {
        GLYPHS[self.suit as usize][(self.rank - 1) as usize]
    }

    pub fn is_special_win_kind(self) -> bool {
        SPECIAL_WIN_KINDS.contains(&self)
    }
}

impl TryFrom<u8> for TileKind {
    type Error = ();
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Suit::ALL
            .iter()
            .rev()
            .find(|s| v >= s.first_flat_index())
            .and_then(|&s| TileKind::new(s, v - s.first_flat_index() + 1))
            .ok_or(())
    }
}

impl TryFrom<char> for TileKind {
    type Error = ();
    fn try_from(c: char) -> Result<Self, Self::Error> {
        for suit in Suit::ALL {
            if let Some(pos) = GLYPHS[suit as usize].iter().position(|&g| g == c) {
                return Ok(TileKind { suit, rank: pos as u8 + 1 });
            }
        }
        Err(())
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_unicode())
    }
}

/// One physical tile. Ordering is by kind first so sorted hands group naturally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    kind: TileKind,
    serial: u8,
}

impl Tile {
    /// `copy` selects one of the four physical copies (always 0 for bonus tiles).
    pub fn new(kind: TileKind, copy: u8) -> Option<Self> {
        if copy >= kind.suit.copies() {
            return None;
        }
        let serial = match kind.suit {
            Suit::Bonus => 136 + kind.rank,
            s => (s as u8) * 36 + (kind.rank - 1) * 4 + copy + 1,
        };
        Some(Tile { kind, serial })
    }

    pub fn kind(self) -> TileKind {
        self.kind
    }

    pub fn suit(self) -> Suit {
        self.kind.suit
    }

    pub fn rank(self) -> u8 {
        self.kind.rank
    }

    /// Unique id 1..=144.
    pub fn serial(self) -> u8 {
        self.serial
    }

    pub fn is_bonus(self) -> bool {
        self.kind.is_bonus()
    }

    pub fn to_unicode(self) -> char {
        self.kind.to_unicode()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:03}{}]", self.serial, self.kind.to_unicode())
    }
}

/// The full ordered set, serials ascending.
pub fn deck() -> Vec<Tile> {
    let mut deck = Vec::with_capacity(TILES_IN_GAME);
    for suit in Suit::ALL {
        for rank in 1..=suit.max_rank() {
            let kind = TileKind { suit, rank };
            for copy in 0..suit.copies() {
                if let Some(t) = Tile::new(kind, copy) {
                    deck.push(t);
                }
            }
        }
    }
    debug_assert_eq!(deck.len(), TILES_IN_GAME);
    deck
}

/// Builds distinct physical tiles from a glyph string, handing out copies in order.
/// `used` carries the copy counters across calls so several strings can share a deck.
#[cfg(test)]
pub(crate) fn tiles_from_glyphs(glyphs: &str, used: &mut [u8; KIND_COUNT]) -> Vec<Tile> {
    glyphs
        .chars()
        .map(|c| {
            let kind = TileKind::try_from(c).expect("unknown glyph");
            let copy = &mut used[kind.index() as usize];
            let tile = Tile::new(kind, *copy).expect("too many copies");
            *copy += 1;
            tile
        })
        .collect()
}
