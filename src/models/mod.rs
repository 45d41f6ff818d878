pub mod account;
pub mod external_identity;
pub mod session;

pub use account::{Account, LeaderboardRow};
pub use external_identity::ExternalIdentityLink;
pub use session::Session;
