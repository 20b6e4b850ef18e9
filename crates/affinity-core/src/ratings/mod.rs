//! Rating data: identifiers, samples, the rating store collaborator, and
//! dense user vectors.
//!
//! # Architecture
//!
//! - `types`: Core types (UserId, ItemId, RatingSample, ItemPreferences)
//! - `store`: RatingStore trait and the in-memory reference store
//! - `vector`: ItemUniverse, UserVector and the UserVectorBuilder

mod store;
pub mod types;
mod vector;

pub use store::{InMemoryRatingStore, RatingStore};
pub use types::{
    get_current_timestamp, ItemId, ItemPreferences, Preference, RatingSample, UserId,
};
pub use vector::{ItemUniverse, UserVector, UserVectorBuilder};
