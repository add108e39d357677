use serde::{Deserialize, Serialize};
use std::fmt;

/// Board grid: 3 columns by 4 rows.
pub const BOARD_COLUMNS: u32 = 3;
pub const BOARD_ROWS: u32 = 4;
pub const BOARD_SIZE: usize = (BOARD_COLUMNS * BOARD_ROWS) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Green,
    Red,
    Purple,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Diamond,
    Oval,
    Squiggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filling {
    Filled,
    Striped,
    Outline,
}

impl CardColor {
    pub fn name(self) -> &'static str {
        match self {
            CardColor::Green => "green",
            CardColor::Red => "red",
            CardColor::Purple => "purple",
            CardColor::Unknown => "unknown",
        }
    }
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Diamond => "diamond",
            Shape::Oval => "oval",
            Shape::Squiggle => "squiggle",
        }
    }
}

impl Filling {
    pub fn name(self) -> &'static str {
        match self {
            Filling::Filled => "filled",
            Filling::Striped => "striped",
            Filling::Outline => "outline",
        }
    }
}

/// Attributes of one card, tied to its board slot by `index`.
///
/// A slot where no symbol could be found keeps its place on the board as a
/// degraded card: `count == 0`, no shape, no filling, unknown color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub index: usize,
    pub color: CardColor,
    pub shape: Option<Shape>,
    pub count: u8,
    pub filling: Option<Filling>,
}

impl Card {
    pub fn new(index: usize, color: CardColor, shape: Shape, count: u8, filling: Filling) -> Self {
        Self {
            index,
            color,
            shape: Some(shape),
            count,
            filling: Some(filling),
        }
    }

    pub fn degraded(index: usize) -> Self {
        Self {
            index,
            color: CardColor::Unknown,
            shape: None,
            count: 0,
            filling: None,
        }
    }

    /// True when every attribute was classified.
    pub fn is_recognized(&self) -> bool {
        self.count > 0 && self.shape.is_some() && self.filling.is_some()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.color.name(),
            self.count,
            self.shape.map_or("-", Shape::name),
            self.filling.map_or("-", Filling::name),
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("a board holds exactly 12 cards, got {0}")]
    WrongSize(usize),
    #[error("card at position {position} claims index {index}")]
    IndexMismatch { position: usize, index: usize },
}

/// The 12 cards of one analysis cycle, in segmenter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct Board {
    cards: Vec<Card>,
}

impl Board {
    pub fn new(cards: Vec<Card>) -> Result<Self, BoardError> {
        if cards.len() != BOARD_SIZE {
            return Err(BoardError::WrongSize(cards.len()));
        }
        if let Some((position, card)) = cards.iter().enumerate().find(|(i, c)| c.index != *i) {
            return Err(BoardError::IndexMismatch {
                position,
                index: card.index,
            });
        }
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn recognized_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_recognized()).count()
    }
}

impl TryFrom<Vec<Card>> for Board {
    type Error = BoardError;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        Self::new(cards)
    }
}

impl From<Board> for Vec<Card> {
    fn from(board: Board) -> Self {
        board.cards
    }
}

/// Grid position of a flat board index: columns outer, rows inner.
pub fn grid_position(index: usize) -> (u32, u32) {
    let rows = BOARD_ROWS as usize;
    ((index / rows) as u32, (index % rows) as u32)
}

/// Three distinct board indices forming a Set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTriple(pub [usize; 3]);

impl SetTriple {
    pub fn indices(&self) -> [usize; 3] {
        self.0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }
}

impl fmt::Display for SetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "[{}, {}, {}]", a, b, c)
    }
}
