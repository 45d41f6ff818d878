pub mod account;
pub mod display_name;
pub mod external_identity;
pub mod mob_collection;
pub mod session;

pub use account::AccountRepository;
pub use display_name::DisplayNameRepository;
pub use external_identity::ExternalIdentityRepository;
pub use mob_collection::MobCollectionRepository;
pub use session::SessionRepository;

/// UNIQUE / PRIMARY KEY 制約違反かどうか
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
