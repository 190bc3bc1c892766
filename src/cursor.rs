use crate::canvas::Canvas;
use crate::config::Labels;
use crate::debug::DebugRun;
use crate::font::FontRegistry;
use crate::header;
use crate::model::ReportDocument;
use crate::types::{Margins, Pt, Size};

/// Position of the layout pass. Every renderer takes one by value and returns
/// the cursor it leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCursor {
    pub y: Pt,
    pub page: usize,
    pub column: usize,
}

impl LayoutCursor {
    pub(crate) fn first_page(y: Pt) -> Self {
        Self {
            y,
            page: 1,
            column: 0,
        }
    }

    pub(crate) fn down(self, dy: Pt) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }

    pub(crate) fn at_y(self, y: Pt) -> Self {
        Self { y, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageGeometry {
    pub(crate) page_size: Size,
    pub(crate) margins: Margins,
    pub(crate) footer_reserve: Pt,
}

impl PageGeometry {
    pub(crate) fn content_left(&self) -> Pt {
        self.margins.left
    }

    pub(crate) fn content_right(&self) -> Pt {
        self.page_size.width - self.margins.right
    }

    pub(crate) fn content_width(&self) -> Pt {
        (self.content_right() - self.content_left()).max(Pt::ZERO)
    }

    pub(crate) fn available_below(&self, y: Pt) -> Pt {
        self.page_size.height - y - self.footer_reserve - self.margins.bottom
    }
}

pub(crate) struct LayoutContext<'a> {
    pub(crate) document: &'a ReportDocument,
    pub(crate) fonts: &'a FontRegistry,
    pub(crate) labels: &'a Labels,
    pub(crate) geometry: PageGeometry,
    pub(crate) debug: Option<&'a DebugRun<'a>>,
    pub(crate) body_top: Pt,
}

/// Starts a new page below a repainted header when fewer than `height_needed`
/// points remain. A block taller than a page stays on a header-only page.
pub(crate) fn ensure_space(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    cursor: LayoutCursor,
    height_needed: Pt,
    block: &str,
) -> LayoutCursor {
    if height_needed <= Pt::ZERO {
        return cursor;
    }
    let available = ctx.geometry.available_below(cursor.y);
    if available >= height_needed || cursor.y <= ctx.body_top {
        return cursor;
    }

    canvas.show_page();
    let y = header::draw_header(ctx, canvas, ctx.geometry.margins.top);
    log::debug!(
        "page break before {} on page {}: needed {:.1}pt, available {:.1}pt",
        block,
        cursor.page,
        height_needed.to_f32(),
        available.to_f32()
    );
    if let Some(debug) = ctx.debug {
        debug.page_break(block, cursor.page, height_needed, available);
    }
    LayoutCursor {
        y,
        page: cursor.page + 1,
        column: 0,
    }
}
