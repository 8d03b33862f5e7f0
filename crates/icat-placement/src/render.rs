//! Placeholder text output
//!
//! The chat transcript only ever holds placeholder cells, never image data.

use crate::placement::ImagePlacement;
use crate::PlacementError;
use icat_graphics::marker_lines;

/// A line-oriented output owned by the host application
pub trait ChatBuffer {
    fn print_line(&self, line: &str);

    /// Report a failed command. Hosts with a separate error area override this.
    fn print_error(&self, message: &str) {
        self.print_line(message);
    }

    /// Ask the host to redraw lines that are already visible
    fn refresh(&self) {}
}

/// Print the placeholder lines of `placement` into `buffer`
pub fn render<B: ChatBuffer + ?Sized>(
    buffer: &B,
    placement: &ImagePlacement,
) -> Result<(), PlacementError> {
    let lines = marker_lines(placement.image_id(), placement.columns(), placement.rows())?;
    for line in &lines {
        buffer.print_line(line);
    }
    Ok(())
}
