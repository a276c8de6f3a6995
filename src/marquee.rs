use std::collections::BTreeSet;

/// Distance from the viewport edge (px) at which a drag starts auto-scrolling.
pub const EDGE_THRESHOLD: f64 = 40.0;
/// Pixels scrolled per auto-scroll tick.
pub const SCROLL_STEP: f64 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned rectangle in grid-body content coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Rect {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Strict overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Where each row sits inside the grid body.
pub trait RowLayout {
    fn row_count(&self) -> usize;
    fn row_rect(&self, index: usize) -> Rect;
}

/// Rows of identical height stacked from `top`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformRowLayout {
    pub rows: usize,
    pub top: f64,
    pub row_height: f64,
    pub width: f64,
}

impl RowLayout for UniformRowLayout {
    fn row_count(&self) -> usize {
        self.rows
    }

    fn row_rect(&self, index: usize) -> Rect {
        let top = self.top + index as f64 * self.row_height;
        Rect {
            left: 0.0,
            top,
            right: self.width,
            bottom: top + self.row_height,
        }
    }
}

/// The scrollable area hosting the grid body.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Viewport {
    pub height: f64,
    pub scroll_top: f64,
    pub max_scroll: f64,
}

impl Viewport {
    /// Convert a point relative to the viewport into content coordinates.
    pub fn to_content(&self, p: Point) -> Point {
        Point::new(p.x, p.y + self.scroll_top)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// What the pointer went down on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressTarget {
    Body,
    Input,
    Button,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Press {
    /// Position relative to the viewport.
    pub at: Point,
    pub button: PointerButton,
    pub target: PressTarget,
    /// Additive modifier (shift/ctrl) held.
    pub additive: bool,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Marquee {
    #[default]
    Idle,
    Dragging {
        start: Point,
        /// Last pointer position relative to the viewport.
        pointer: Point,
        initial: BTreeSet<usize>,
    },
}

impl Marquee {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Marquee::Dragging { .. })
    }

    /// Start a drag. Returns false when the press does not qualify.
    pub fn press(&mut self, press: &Press, viewport: &Viewport, current: &BTreeSet<usize>) -> bool {
        if self.is_dragging()
            || press.button != PointerButton::Primary
            || press.target != PressTarget::Body
        {
            return false;
        }
        let initial = if press.additive {
            current.clone()
        } else {
            BTreeSet::new()
        };
        *self = Marquee::Dragging {
            start: viewport.to_content(press.at),
            pointer: press.at,
            initial,
        };
        true
    }

    /// Track the pointer and return the selection implied by the rectangle.
    pub fn pointer_moved(
        &mut self,
        at: Point,
        viewport: &Viewport,
        layout: &impl RowLayout,
    ) -> Option<BTreeSet<usize>> {
        match self {
            Marquee::Dragging { pointer, .. } => *pointer = at,
            Marquee::Idle => return None,
        }
        self.selection(viewport, layout)
    }

    /// Current selection: rows hit by the rectangle plus the pre-drag set.
    pub fn selection(&self, viewport: &Viewport, layout: &impl RowLayout) -> Option<BTreeSet<usize>> {
        let Marquee::Dragging {
            start,
            pointer,
            initial,
        } = self
        else {
            return None;
        };
        let rect = Rect::from_corners(*start, viewport.to_content(*pointer));
        let mut selected = initial.clone();
        for index in 0..layout.row_count() {
            if layout.row_rect(index).intersects(&rect) {
                selected.insert(index);
            }
        }
        Some(selected)
    }

    /// Scroll delta for one timer tick; 0 when the pointer is away from the
    /// edges or no drag is active.
    pub fn scroll_delta(&self, viewport: &Viewport) -> f64 {
        let Marquee::Dragging { pointer, .. } = self else {
            return 0.0;
        };
        if pointer.y < EDGE_THRESHOLD && viewport.scroll_top > 0.0 {
            -SCROLL_STEP.min(viewport.scroll_top)
        } else if pointer.y > viewport.height - EDGE_THRESHOLD
            && viewport.scroll_top < viewport.max_scroll
        {
            SCROLL_STEP.min(viewport.max_scroll - viewport.scroll_top)
        } else {
            0.0
        }
    }

    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        *self = Marquee::Idle;
        was_dragging
    }
}
