//! Placement cache
//!
//! Keeps every placement created in this session, keyed by source path, so a
//! repeated request can reuse an already transmitted image and a new terminal
//! can be restored by replaying the stored commands.

use crate::placement::ImagePlacement;
use icat_graphics::ImageId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default)]
pub struct PlacementStore {
    by_path: HashMap<PathBuf, Vec<ImagePlacement>>,
    /// Paths in the order they were first added
    paths: Vec<PathBuf>,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// First placement of `path` matching the request. `None` for columns or
    /// rows matches any value.
    pub fn find(
        &self,
        path: &Path,
        columns: Option<u16>,
        rows: Option<u16>,
    ) -> Option<&ImagePlacement> {
        self.by_path
            .get(path)?
            .iter()
            .find(|p| p.matches(columns, rows))
    }

    pub fn insert(&mut self, placement: ImagePlacement) {
        let path = placement.source_path().to_path_buf();
        debug!(
            "Storing placement {} ({}x{}) for {}",
            placement.image_id(),
            placement.columns(),
            placement.rows(),
            path.display()
        );
        if !self.by_path.contains_key(&path) {
            self.paths.push(path.clone());
        }
        self.by_path.entry(path).or_default().push(placement);
    }

    /// Replace the reserved entry with the same path and id, keeping its
    /// position. Inserts when there is no such entry.
    pub fn complete(&mut self, placement: ImagePlacement) {
        let slot = self
            .by_path
            .get_mut(placement.source_path())
            .and_then(|list| {
                list.iter_mut()
                    .find(|p| p.image_id() == placement.image_id())
            });
        match slot {
            Some(existing) => *existing = placement,
            None => self.insert(placement),
        }
    }

    /// Remove the placement of `path` with id `id`
    pub fn remove(&mut self, path: &Path, id: ImageId) -> Option<ImagePlacement> {
        let list = self.by_path.get_mut(path)?;
        let index = list.iter().position(|p| p.image_id() == id)?;
        let removed = list.remove(index);

        if list.is_empty() {
            self.by_path.remove(path);
            self.paths.retain(|p| p != path);
        }
        debug!("Removed placement {} for {}", id, path.display());
        Some(removed)
    }

    pub fn placements_for(&self, path: &Path) -> &[ImagePlacement] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All placements, grouped by path in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &ImagePlacement> {
        self.paths
            .iter()
            .filter_map(|path| self.by_path.get(path))
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.by_path.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
