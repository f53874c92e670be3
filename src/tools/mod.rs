pub mod search;
pub mod leaderboard;
pub mod config;

pub use search::WebSearchParams;
pub use leaderboard::LeaderboardParams;
pub use config::GetConfigInfoParams;
