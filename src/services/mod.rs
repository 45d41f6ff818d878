pub mod account_link;
pub mod leaderboard;
pub mod level;
pub mod oauth;
pub mod session;

pub use account_link::AccountLinkService;
pub use leaderboard::LeaderboardService;
pub use level::LevelCurve;
pub use oauth::{DiscordOAuthService, IdentityProvider};
pub use session::SessionService;
