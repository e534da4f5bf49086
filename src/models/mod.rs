mod movie;
mod rating;
mod user;

pub use movie::{Movie, MovieId, NewMovie};
pub use rating::{Rating, RatingId, RatingOutcome};
pub use user::{NewUser, User, UserId};
