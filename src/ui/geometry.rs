//! Placement of the citation popup and the footnote tooltip.
//!
//! Trigger rectangles are in viewport coordinates (as a browser reports
//! them for an element); results are page coordinates, ready for
//! `position: absolute`.

use serde::Serialize;

/// Gap kept between a floating box and its trigger or the viewport edges.
pub const MARGIN: f64 = 8.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Visible area and scroll offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn scrolled(mut self, x: f64, y: f64) -> Self {
        self.scroll_x = x;
        self.scroll_y = y;
        self
    }
}

/// Top-left corner in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// Left edge aligned with the trigger, pulled back inside the right edge.
fn clamp_left(trigger: Rect, size: Size, viewport: Viewport) -> f64 {
    let left = (trigger.left + viewport.scroll_x).max(MARGIN);
    if left - viewport.scroll_x + size.width > viewport.width - MARGIN {
        (viewport.width - size.width - MARGIN).max(MARGIN) + viewport.scroll_x
    } else {
        left
    }
}

/// Below the trigger; above it when the box would leave the bottom edge.
pub fn place_popup(trigger: Rect, size: Size, viewport: Viewport) -> Position {
    let below = trigger.bottom() + MARGIN;
    let top = if below + size.height > viewport.height - MARGIN {
        trigger.top - size.height - MARGIN
    } else {
        below
    };

    Position {
        left: clamp_left(trigger, size, viewport),
        top: top + viewport.scroll_y,
    }
}

/// Above the trigger; below it when the box would leave the top edge.
pub fn place_tooltip(trigger: Rect, size: Size, viewport: Viewport) -> Position {
    let above = trigger.top - size.height - MARGIN;
    let top = if above < MARGIN {
        trigger.bottom() + MARGIN
    } else {
        above
    };

    Position {
        left: clamp_left(trigger, size, viewport),
        top: top + viewport.scroll_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIEW: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
        scroll_x: 0.0,
        scroll_y: 0.0,
    };

    #[test]
    fn test_popup_below_trigger() {
        let pos = place_popup(Rect::new(100.0, 100.0, 20.0, 16.0), Size::new(300.0, 120.0), VIEW);
        assert_eq!(pos, Position { left: 100.0, top: 124.0 });
    }

    #[test]
    fn test_popup_page_coordinates() {
        let view = VIEW.scrolled(0.0, 2000.0);
        let pos = place_popup(Rect::new(100.0, 100.0, 20.0, 16.0), Size::new(300.0, 120.0), view);
        assert_eq!(pos.top, 2124.0);
    }

    #[test]
    fn test_popup_clamped_right() {
        let pos = place_popup(Rect::new(900.0, 100.0, 20.0, 16.0), Size::new(300.0, 120.0), VIEW);
        assert_eq!(pos.left, 692.0);
    }

    #[test]
    fn test_popup_flips_above() {
        let pos = place_popup(Rect::new(100.0, 700.0, 20.0, 16.0), Size::new(300.0, 120.0), VIEW);
        assert_eq!(pos.top, 572.0);
    }

    #[test]
    fn test_popup_left_margin() {
        let pos = place_popup(Rect::new(2.0, 100.0, 20.0, 16.0), Size::new(100.0, 50.0), VIEW);
        assert_eq!(pos.left, MARGIN);
    }

    #[test]
    fn test_tooltip_above_trigger() {
        let pos = place_tooltip(Rect::new(100.0, 300.0, 10.0, 16.0), Size::new(200.0, 80.0), VIEW);
        assert_eq!(pos, Position { left: 100.0, top: 212.0 });
    }

    #[test]
    fn test_tooltip_flips_below() {
        let pos = place_tooltip(Rect::new(100.0, 40.0, 10.0, 16.0), Size::new(200.0, 80.0), VIEW);
        assert_eq!(pos.top, 64.0);
    }

    #[test]
    fn test_tooltip_clamped_with_horizontal_scroll() {
        let view = VIEW.scrolled(50.0, 0.0);
        let pos = place_tooltip(Rect::new(950.0, 300.0, 10.0, 16.0), Size::new(200.0, 80.0), view);
        assert_eq!(pos.left, 742.0);
    }
}
