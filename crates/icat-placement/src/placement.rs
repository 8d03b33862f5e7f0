//! Placement records

use crate::PlacementError;
use icat_graphics::{virtual_placement, ControlData, ImageId, WireChunks, MAX_CELLS};
use std::path::{Path, PathBuf};

/// A sized image bound to an id, plus the commands that transmitted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlacement {
    source_path: PathBuf,
    image_id: ImageId,
    columns: u16,
    rows: u16,
    wire: WireChunks,
}

impl ImagePlacement {
    /// Create a placement that has not been transmitted yet
    pub fn new(
        source_path: impl Into<PathBuf>,
        image_id: ImageId,
        columns: u16,
        rows: u16,
    ) -> Result<Self, PlacementError> {
        if columns == 0 || rows == 0 || columns > MAX_CELLS || rows > MAX_CELLS {
            return Err(PlacementError::InvalidGeometry(format!(
                "{columns}x{rows} cells is outside 1..={MAX_CELLS}"
            )));
        }

        Ok(Self {
            source_path: source_path.into(),
            image_id,
            columns,
            rows,
            wire: WireChunks::new(),
        })
    }

    /// Attach the commands that were written for this placement
    pub fn with_wire(mut self, wire: WireChunks) -> Self {
        self.wire = wire;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn wire(&self) -> &WireChunks {
        &self.wire
    }

    /// False while the placement is only reserved
    pub fn is_transmitted(&self) -> bool {
        !self.wire.is_empty()
    }

    /// Whether this placement satisfies a request; `None` matches anything
    pub fn matches(&self, columns: Option<u16>, rows: Option<u16>) -> bool {
        columns.map_or(true, |c| c == self.columns) && rows.map_or(true, |r| r == self.rows)
    }

    /// Keys of the transmit-and-place command for this placement
    pub fn control_data(&self) -> ControlData {
        virtual_placement(self.image_id.protocol_value(), self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_oversized() {
        let id = ImageId::new(1, 2);
        assert!(ImagePlacement::new("a.png", id, 0, 3).is_err());
        assert!(ImagePlacement::new("a.png", id, 3, 0).is_err());
        assert!(ImagePlacement::new("a.png", id, 298, 3).is_err());
        assert!(ImagePlacement::new("a.png", id, 297, 297).is_ok());
    }

    #[test]
    fn test_wildcard_matching() {
        let p = ImagePlacement::new("a.png", ImageId::new(1, 2), 10, 5).unwrap();
        assert!(p.matches(None, None));
        assert!(p.matches(Some(10), None));
        assert!(p.matches(None, Some(5)));
        assert!(p.matches(Some(10), Some(5)));
        assert!(!p.matches(Some(11), None));
        assert!(!p.matches(Some(10), Some(4)));
    }

    #[test]
    fn test_control_data() {
        let p = ImagePlacement::new("a.png", ImageId::new(1, 2), 10, 5).unwrap();
        assert_eq!(
            p.control_data().encode(),
            "a=T,q=2,f=100,U=1,c=10,r=5,i=16777218"
        );
        assert!(!p.is_transmitted());
    }
}
