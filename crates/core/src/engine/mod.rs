pub mod decision;
pub mod episode;

pub use decision::{Band, Decision, Trend, evaluate};
pub use episode::EpisodeState;
