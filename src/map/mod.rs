mod basemap;
pub mod drawing;
mod projection;
pub mod raster;
mod terminal_map;

pub use basemap::{Basemap, BasemapLayers, LineString, Lod};
pub use drawing::DrawingManager;
pub use projection::Viewport;
pub use terminal_map::{MapLayers, MapOptions, OverlayLayer, TerminalMap};
