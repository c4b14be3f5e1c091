// Domain layer: the duel's scoring rule and its value types.

pub mod scoring;

pub use scoring::{GuessScore, SECRET_LEN, score_guess};
