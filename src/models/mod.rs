//! Database model definitions

mod contact;
mod game;
mod invoice;
mod localized;
mod payment;
mod reservation;
mod user;

pub use contact::*;
pub use game::*;
pub use invoice::*;
pub use localized::*;
pub use payment::*;
pub use reservation::*;
pub use user::*;
