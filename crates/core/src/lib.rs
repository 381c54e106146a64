pub mod config;
pub mod error;
pub mod types;

pub use config::PerksConfig;
pub use error::{PerkError, PerkResult, RowError};
pub use types::{Flight, Hotel, Perk, PerkAssignment, Session, SessionRow, User, UserMetrics};
