use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("Unknown action code: {0} (expected 0-3)")]
    UnknownAction(u8),
    #[error("Double down needs a two-card hand, active hand has {cards} cards")]
    DoubleDownNotAllowed { cards: usize },
    #[error("No round in progress, call reset first")]
    NoRoundInProgress,
    #[error("A hand needs at least one card")]
    EmptyHand,
    #[error("Invalid card rank: {0} (expected 1-10)")]
    InvalidCard(u8),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Env(#[from] EnvError),
}
