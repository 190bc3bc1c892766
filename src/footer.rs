use crate::canvas::Canvas;
use crate::cursor::{LayoutContext, LayoutCursor};
use crate::draw;
use crate::font::FontId;
use crate::header::{DIVIDER, format_date};
use crate::text::{self, TextAlign, TextStyle};
use crate::types::{Color, Pt};
use time::OffsetDateTime;
use time::macros::format_description;

const FOOTER_TEXT: Color = Color::hex(0x666666);
const OFFSET_FROM_BOTTOM: f32 = 40.0;
const TEXT_OFFSET: f32 = 8.0;
// Content must have moved this far below the top margin to earn a footer.
const MIN_CONTENT: f32 = 50.0;

pub(crate) fn format_time(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| value.time().to_string())
}

pub(crate) fn should_draw_footer(ctx: &LayoutContext<'_>, cursor: LayoutCursor) -> bool {
    cursor.y > ctx.geometry.margins.top + Pt::from_f32(MIN_CONTENT)
}

/// Paints the single footer on the current (last) page: a rule and the
/// centered generation line with the final page count.
pub(crate) fn draw_footer(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    generated_at: OffsetDateTime,
    page: usize,
    pages: usize,
) {
    let left = ctx.geometry.content_left();
    let width = ctx.geometry.content_width();
    let y = ctx.geometry.page_size.height - Pt::from_f32(OFFSET_FROM_BOTTOM);
    draw::divider(canvas, left, left + width, y, DIVIDER, Pt::from_f32(1.0));

    let line = ctx.labels.footer_line(
        &format_date(generated_at),
        &format_time(generated_at),
        page,
        pages,
    );
    let style = TextStyle::new(FontId::Regular, 8.0, FOOTER_TEXT).with_align(TextAlign::Center);
    text::draw_text(
        canvas,
        ctx.fonts,
        &line,
        &style,
        left,
        y + Pt::from_f32(TEXT_OFFSET),
        width,
    );
}
