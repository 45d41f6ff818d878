pub mod account;
pub mod health;
pub mod leaderboard;
pub mod logout;
pub mod me;
pub mod oauth;

pub use account::{add_mobs, bootstrap, list_mobs};
pub use health::health_check;
pub use leaderboard::{leaderboard, leaderboard_count};
pub use logout::logout;
pub use me::me;
pub use oauth::{oauth_callback, oauth_login};
