//! Image placements for icat
//! 
//! A placement is a rectangle of terminal cells showing one transmitted
//! image. This crate sizes placements, keeps the ones already transmitted so
//! they can be shown again without resending data, and renders their
//! placeholder text into a chat buffer.

pub mod placement;
pub mod render;
pub mod sizer;
pub mod store;

pub use placement::ImagePlacement;
pub use render::{render, ChatBuffer};
pub use sizer::{parse_cell_count, CellExtent, PlacementSizer, DEFAULT_ROWS};
pub use store::PlacementStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    
    #[error("Render error: {0}")]
    Render(#[from] icat_graphics::GraphicsError),
}
