// File: src/core/popover.rs
use crate::core::config::PopoverLayout;
use crate::core::types::{Point, Rect, Size};

/// Top-left corner for a popover anchored to `anchor`, all in viewport
/// coordinates.
///
/// The popover sits below the anchor, left-aligned with it. It moves above the
/// anchor when it would run past the bottom edge, shifts left when it would
/// run past the right edge, and never starts closer than `layout.margin` to
/// the left edge.
pub fn place_popover(anchor: Rect, popover: Size, viewport: Size, layout: &PopoverLayout) -> Point {
    let mut left = anchor.left;
    let mut top = anchor.bottom() + layout.gap;

    if left + popover.width > viewport.width {
        left = viewport.width - popover.width - layout.margin;
    }
    if top + popover.height > viewport.height {
        top = anchor.top - popover.height - layout.gap;
    }
    left = left.max(layout.margin);

    Point { x: left, y: top }
}
