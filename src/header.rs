use crate::canvas::Canvas;
use crate::cursor::LayoutContext;
use crate::draw;
use crate::font::FontId;
use crate::model::{ReportStatus, non_blank};
use crate::text::{self, TextStyle};
use crate::types::{Color, Pt, Rect};
use time::OffsetDateTime;
use time::macros::format_description;

const MUTED: Color = Color::hex(0x666666);
const TITLE: Color = Color::hex(0x1a1a1a);
const FINAL_GREEN: Color = Color::hex(0x2d5016);
pub(crate) const DIVIDER: Color = Color::hex(0xcccccc);

// The title column leaves this much room for the date/status column.
const RIGHT_COLUMN: f32 = 200.0;
const RIGHT_COLUMN_OFFSET: f32 = 150.0;
const LABEL_WIDTH: f32 = 70.0;
const VALUE_OFFSET: f32 = 75.0;
const ROW: f32 = 15.0;

pub(crate) fn format_date(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| value.date().to_string())
}

/// Paints the repeating header with its top edge at `top` and returns the y
/// where body content starts. Painting the same document twice at the same
/// offset produces the same commands.
pub(crate) fn draw_header(ctx: &LayoutContext<'_>, canvas: &mut Canvas, top: Pt) -> Pt {
    let doc = ctx.document;
    let labels = ctx.labels;
    let left = ctx.geometry.content_left();
    let width = ctx.geometry.content_width();
    let title_width = (width - Pt::from_f32(RIGHT_COLUMN)).max(Pt::from_f32(1.0));
    let row = Pt::from_f32(ROW);

    let mut title_y = top;
    if let Some(number) = non_blank(doc.report_number.as_deref()) {
        let style = TextStyle::new(FontId::Regular, 10.0, MUTED);
        let line = format!("{} {}", labels.number_prefix, number);
        text::draw_text(canvas, ctx.fonts, &line, &style, left, title_y, title_width);
        title_y += row;
    }

    let title_style = TextStyle::new(FontId::Bold, 24.0, TITLE);
    let title_height = text::draw_text(
        canvas,
        ctx.fonts,
        doc.title.trim(),
        &title_style,
        left,
        title_y,
        title_width,
    );

    let right_x = left + width - Pt::from_f32(RIGHT_COLUMN_OFFSET);
    let status_y = title_y + row;
    let (status_text, status_color) = match doc.status {
        ReportStatus::Final => (labels.status_final.as_str(), FINAL_GREEN),
        ReportStatus::Draft => (labels.status_draft.as_str(), MUTED),
    };
    let date = format_date(doc.date);
    draw_pair(ctx, canvas, right_x, title_y, &labels.date, &date, Color::BLACK);
    draw_pair(ctx, canvas, right_x, status_y, &labels.status, status_text, status_color);

    let header_height = title_height.max(status_y + row - title_y);
    let divider_y = title_y + header_height + row;
    draw::divider(
        canvas,
        left,
        left + width,
        divider_y,
        DIVIDER,
        Pt::from_f32(1.0),
    );
    canvas.record_block_bounds(
        "block.header",
        Rect::new(left, top, width, divider_y - top),
    );
    divider_y + Pt::from_f32(20.0)
}

/// Right-aligned gray label followed by a bold value.
fn draw_pair(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    x: Pt,
    top: Pt,
    label: &str,
    value: &str,
    value_color: Color,
) {
    let size = Pt::from_f32(10.0);
    let label_width = ctx.fonts.measure_text_width(FontId::Regular, size, label);
    let label_x = x + (Pt::from_f32(LABEL_WIDTH) - label_width).max(Pt::ZERO);
    text::draw_line(canvas, ctx.fonts, label, FontId::Regular, size, MUTED, label_x, top);
    text::draw_line(
        canvas,
        ctx.fonts,
        value,
        FontId::Bold,
        size,
        value_color,
        x + Pt::from_f32(VALUE_OFFSET),
        top,
    );
}
