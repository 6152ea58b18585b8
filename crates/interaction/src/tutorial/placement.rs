use foundation::bounds::{Rect2, Size2};

/// Preferred side of the target for the tour box.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
}

/// Where the tour box ends up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BoxPlacement {
    /// Centred in the viewport.
    Centered,
    /// Absolute viewport position of the box's top-left corner.
    At { top: f64, left: f64 },
}

/// Positions a `size` box beside `target`, clamped into the viewport.
pub fn place_box(
    target: Option<Rect2>,
    hint: Placement,
    size: Size2,
    viewport: Size2,
    margin: f64,
) -> BoxPlacement {
    let Some(t) = target else {
        return BoxPlacement::Centered;
    };

    let centre_x = t.left + (t.width - size.width) / 2.0;
    let centre_y = t.top + (t.height - size.height) / 2.0;
    let (top, left) = match hint {
        Placement::Top => (t.top - size.height - margin, centre_x),
        Placement::Bottom => (t.bottom() + margin, centre_x),
        Placement::Left => (centre_y, t.left - size.width - margin),
        Placement::Right => (centre_y, t.right() + margin),
    };

    BoxPlacement::At {
        top: clamp(top, margin, viewport.height - size.height - margin),
        left: clamp(left, margin, viewport.width - size.width - margin),
    }
}

// Lower bound wins when the box does not fit at all.
fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.min(hi).max(lo)
}
