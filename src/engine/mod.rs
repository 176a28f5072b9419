mod geo;
mod index;
pub mod loader;
mod record;
mod traits;

pub use geo::{Coordinate, EARTH_RADIUS_M};
pub use index::ChargerIndex;
pub use loader::{load_file, load_str, LoadReport};
pub use record::{ChargerId, ChargerRecord};
pub use traits::{Neighbor, ProximityIndex};
