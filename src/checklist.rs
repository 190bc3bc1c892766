use crate::canvas::Canvas;
use crate::cursor::{LayoutContext, LayoutCursor, ensure_space};
use crate::draw;
use crate::font::FontId;
use crate::model::{ChecklistItem, non_blank};
use crate::sections::{HEADING, draw_section_title};
use crate::text::{self, TextStyle};
use crate::types::{Color, Pt, Rect};

const CARD_FILL: Color = Color::hex(0xfafafa);
const CARD_BORDER: Color = Color::hex(0xe0e0e0);
const ORDINAL: Color = Color::hex(0x666666);
const CHECKED: Color = Color::hex(0x2d5016);
const UNCHECKED: Color = Color::hex(0x999999);

const TITLE_HEIGHT: f32 = 25.0;
const PADDING: f32 = 15.0;
// Room for the ordinal and the checkbox left of the description.
const LABEL_COLUMN: f32 = 60.0;
const CHECKBOX_OFFSET: f32 = 35.0;
const CHECKBOX_SIZE: f32 = 12.0;
const TEXT_OFFSET: f32 = 25.0;
const MIN_TEXT_HEIGHT: f32 = 20.0;
const NOTE_GAP: f32 = 5.0;
const NOTE_EXTRA: f32 = 10.0;
const CARD_GAP: f32 = 15.0;

fn description_style() -> TextStyle {
    TextStyle::new(FontId::Bold, 11.0, HEADING)
}

fn note_style() -> TextStyle {
    TextStyle::new(FontId::Regular, 9.0, ORDINAL).oblique()
}

struct CardMetrics {
    text_width: Pt,
    description_height: Pt,
    note: Option<(String, Pt)>,
    height: Pt,
}

fn measure_card(ctx: &LayoutContext<'_>, item: &ChecklistItem) -> CardMetrics {
    let padding = Pt::from_f32(PADDING);
    let text_width = (ctx.geometry.content_width() - padding * 2 - Pt::from_f32(LABEL_COLUMN))
        .max(Pt::from_f32(1.0));
    let description_height = text::measure_style(
        ctx.fonts,
        &item.description,
        &description_style(),
        text_width,
    );
    let note = non_blank(item.note.as_deref()).map(|note| {
        let line = format!("{} {}", ctx.labels.note_prefix, note);
        let height = text::measure_style(ctx.fonts, &line, &note_style(), text_width);
        (line, height)
    });
    let mut height = padding * 2 + description_height.max(Pt::from_f32(MIN_TEXT_HEIGHT));
    if let Some((_, note_height)) = &note {
        height += *note_height + Pt::from_f32(NOTE_EXTRA);
    }
    CardMetrics {
        text_width,
        description_height,
        note,
        height,
    }
}

/// "Itens do Relatório" followed by one card per item, in input order.
pub(crate) fn draw_checklist(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    cursor: LayoutCursor,
) -> LayoutCursor {
    let items = &ctx.document.items;
    if items.is_empty() {
        return cursor;
    }
    let title_height = Pt::from_f32(TITLE_HEIGHT);
    let cursor = ensure_space(ctx, canvas, cursor, title_height, "checklist.title");
    draw_section_title(ctx, canvas, &ctx.labels.checklist_title, cursor.y);
    let mut cursor = cursor.down(title_height);

    for (index, item) in items.iter().enumerate() {
        let card = measure_card(ctx, item);
        cursor = ensure_space(
            ctx,
            canvas,
            cursor,
            card.height + Pt::from_f32(CARD_GAP),
            "checklist.item",
        );
        cursor = draw_card(ctx, canvas, cursor, index, item, &card);
    }
    cursor
}

fn draw_card(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    cursor: LayoutCursor,
    index: usize,
    item: &ChecklistItem,
    card: &CardMetrics,
) -> LayoutCursor {
    let left = ctx.geometry.content_left();
    let padding = Pt::from_f32(PADDING);
    let rect = Rect::new(left, cursor.y, ctx.geometry.content_width(), card.height);
    draw::bordered_rect(canvas, rect, Some(CARD_FILL), CARD_BORDER, Pt::from_f32(1.0));
    canvas.meta("checklist.ordinal", (index + 1).to_string());

    let inner_top = cursor.y + padding;
    text::draw_line(
        canvas,
        ctx.fonts,
        &format!("{}.", index + 1),
        FontId::Bold,
        Pt::from_f32(12.0),
        ORDINAL,
        left + padding,
        inner_top,
    );

    let checkbox_x = left + padding + Pt::from_f32(CHECKBOX_OFFSET);
    let (box_color, checked) = if item.completed {
        (CHECKED, true)
    } else {
        (UNCHECKED, false)
    };
    draw::checkbox(
        canvas,
        checkbox_x,
        inner_top,
        Pt::from_f32(CHECKBOX_SIZE),
        checked,
        box_color,
    );

    let text_x = checkbox_x + Pt::from_f32(TEXT_OFFSET);
    text::draw_text(
        canvas,
        ctx.fonts,
        &item.description,
        &description_style(),
        text_x,
        inner_top,
        card.text_width,
    );
    if let Some((line, _)) = &card.note {
        let note_top = inner_top + card.description_height + Pt::from_f32(NOTE_GAP);
        text::draw_text(
            canvas,
            ctx.fonts,
            line,
            &note_style(),
            text_x,
            note_top,
            card.text_width,
        );
    }
    canvas.record_block_bounds("block.checklist_item", rect);
    cursor.down(card.height + Pt::from_f32(CARD_GAP))
}
