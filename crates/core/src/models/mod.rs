//! Data models for Salon

mod artwork;
mod environment;
mod exhibit;
mod invitation;
mod participant;
mod user;

pub use artwork::*;
pub use environment::*;
pub use exhibit::*;
pub use invitation::*;
pub use participant::*;
pub use user::*;
