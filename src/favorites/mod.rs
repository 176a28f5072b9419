//! Favorites persistence behind [`FavoritesStore`].
//!
//! Two backends, picked at startup from `[favorites] backend`:
//! an in-process map for development and tests, and SQLite for durable state.

mod memory;
mod source;
mod sqlite;
mod types;

pub use memory::MemoryFavoritesStore;
pub(crate) use source::apply;
pub use source::FavoritesStore;
pub use sqlite::SqliteFavoritesStore;
pub use types::{FavoriteSet, Identity};
