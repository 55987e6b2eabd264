pub mod composer;
pub mod extent;
pub mod icon;
pub mod location;
pub mod marker;
pub mod popup;
pub mod projection;
pub mod tile_grid;
pub mod view;

pub use composer::{MapComposer, ViewOptions};
pub use extent::Extent;
pub use icon::{IconDescriptor, IconShape};
pub use location::*;
pub use marker::*;
pub use popup::{PopupChange, PopupState};
pub use projection::{Coordinate, from_lon_lat, to_lon_lat};
pub use tile_grid::{TileCoord, TileRange};
pub use view::MapView;
