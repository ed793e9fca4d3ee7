//! Avatar generation engine: trait catalog loading, rarity-weighted trait
//! selection, and layered PNG composition.
//!
//! The engine is deliberately free of HTTP and database concerns. The server
//! constructs a [`catalog::TraitCatalog`] once at startup and hands it to a
//! [`compose::Compositor`] per generation call.

pub mod catalog;
pub mod compose;
pub mod error;
pub mod rarity;
pub mod select;

pub use catalog::{Category, TraitAsset, TraitCatalog};
pub use compose::{AVATAR_SIZE, Compositor, GeneratedAvatar, TraitSet, flatten, roll_traits};
pub use error::EngineError;
pub use rarity::Rarity;
pub use select::weighted_choice;
