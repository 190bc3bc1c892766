use crate::canvas::Canvas;
use crate::cursor::{LayoutContext, LayoutCursor, ensure_space};
use crate::draw;
use crate::font::FontId;
use crate::images::{PhotoData, ResolvedPhoto};
use crate::sections::draw_section_title;
use crate::text::{self, TextAlign, TextStyle};
use crate::types::{Color, Pt, Rect};

const CARD_FILL: Color = Color::hex(0xfafafa);
const CARD_BORDER: Color = Color::hex(0xd0d0d0);
const PLACEHOLDER_TEXT: Color = Color::hex(0x999999);
const LEGEND_TEXT: Color = Color::hex(0x666666);

const SECTION_GAP: f32 = 15.0;
const TITLE_HEIGHT: f32 = 25.0;
const TITLE_GAP: f32 = 15.0;
const GAP: f32 = 25.0;
const CARD_PADDING: f32 = 8.0;
const BORDER_WIDTH: f32 = 1.5;
const LEGEND_HEIGHT: f32 = 20.0;
const LEGEND_OFFSET: f32 = 5.0;
const ROW_SPACING: f32 = 30.0;
const TRAILING_GAP: f32 = 10.0;

/// The last photo of an odd-sized set, when it starts a row, is drawn alone.
pub(crate) fn is_trailing_orphan(index: usize, count: usize, column: usize) -> bool {
    index + 1 == count && count % 2 == 1 && column == 0
}

/// Width of a grid cell: 60% of the content width for the hero cell, half of
/// the content width minus the gutter otherwise.
pub(crate) fn cell_width(content_width: Pt, hero: bool) -> Pt {
    if hero {
        content_width.mul_ratio(6, 10)
    } else {
        (content_width - Pt::from_f32(GAP)) / 2
    }
}

/// Two-column photo grid. Rows move to a new page as a whole; a row that
/// starts a page is preceded by the continuation title.
pub(crate) fn draw_photo_grid(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    cursor: LayoutCursor,
    photos: &[ResolvedPhoto],
) -> LayoutCursor {
    if photos.is_empty() {
        return cursor;
    }
    let left = ctx.geometry.content_left();
    let width = ctx.geometry.content_width();
    let title_block = Pt::from_f32(TITLE_HEIGHT + TITLE_GAP);
    let legend = Pt::from_f32(LEGEND_HEIGHT);
    let row_spacing = Pt::from_f32(ROW_SPACING);

    let cursor = cursor.down(Pt::from_f32(SECTION_GAP));
    let cursor = ensure_space(ctx, canvas, cursor, Pt::from_f32(TITLE_HEIGHT), "photos.title");
    draw_section_title(ctx, canvas, &ctx.labels.photos_title, cursor.y);
    let mut cursor = LayoutCursor {
        column: 0,
        ..cursor.down(title_block)
    };

    let mut row_top = cursor.y;
    for (index, photo) in photos.iter().enumerate() {
        let hero = is_trailing_orphan(index, photos.len(), cursor.column);
        let cell_w = cell_width(width, hero);
        let image_h = cell_w.mul_ratio(3, 4);

        if cursor.column == 0 {
            let next = ensure_space(ctx, canvas, cursor, image_h + legend + row_spacing, "photos.row");
            cursor = if next.page > cursor.page {
                draw_section_title(ctx, canvas, &ctx.labels.photos_continued_title, next.y);
                next.down(title_block)
            } else {
                next
            };
            row_top = cursor.y;
        }

        let x = if hero {
            left + (width - cell_w) / 2
        } else {
            left + (cell_w + Pt::from_f32(GAP)) * cursor.column as i32
        };
        let card = Rect::new(x, row_top, cell_w, image_h + legend);
        draw_cell(ctx, canvas, card, image_h, index, photo, hero);

        if hero || cursor.column == 1 {
            cursor = LayoutCursor {
                column: 0,
                ..cursor.at_y(row_top + image_h + legend + row_spacing)
            };
        } else {
            cursor.column = 1;
        }
    }
    // An even set never leaves a half row; an odd one ends on the hero row.
    if cursor.column == 1 {
        let image_h = cell_width(width, false).mul_ratio(3, 4);
        cursor = LayoutCursor {
            column: 0,
            ..cursor.at_y(row_top + image_h + legend + row_spacing)
        };
    }
    cursor.down(Pt::from_f32(TRAILING_GAP))
}

fn draw_cell(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    card: Rect,
    image_h: Pt,
    index: usize,
    photo: &ResolvedPhoto,
    hero: bool,
) {
    draw::filled_rect(canvas, card, CARD_FILL);
    draw::bordered_rect(canvas, card, None, CARD_BORDER, Pt::from_f32(BORDER_WIDTH));
    canvas.record_block_bounds(if hero { "photo.hero" } else { "photo.cell" }, card);

    let padding = Pt::from_f32(CARD_PADDING);
    let area = Rect::new(card.x, card.y, card.width, image_h).inset(padding);
    match &photo.data {
        PhotoData::Ready { resource_id, image } => {
            let target = cover_rect(area, image.width, image.height);
            canvas.save_state();
            canvas.clip_rect(area);
            canvas.draw_image(target, resource_id.clone());
            canvas.restore_state();
        }
        PhotoData::Missing => draw_placeholder(ctx, canvas, area, &ctx.labels.image_unavailable),
        PhotoData::Undecodable => draw_placeholder(ctx, canvas, area, &ctx.labels.image_error),
    }

    let legend_style = TextStyle::new(FontId::Regular, 9.0, LEGEND_TEXT);
    let legend = ctx.labels.photo_legend(index, photo.name.trim());
    let legend_width = (card.width - padding * 2).max(Pt::from_f32(1.0));
    // The legend strip holds a single line; long names are cut to fit.
    let line = text::layout_lines(ctx.fonts, &legend, FontId::Regular, legend_style.size, legend_width)
        .into_iter()
        .next()
        .map(|line| line.text)
        .unwrap_or(legend);
    text::draw_line(
        canvas,
        ctx.fonts,
        &line,
        FontId::Regular,
        legend_style.size,
        legend_style.color,
        card.x + padding,
        card.y + image_h + Pt::from_f32(LEGEND_OFFSET),
    );
}

fn draw_placeholder(ctx: &LayoutContext<'_>, canvas: &mut Canvas, area: Rect, label: &str) {
    let style = TextStyle::new(FontId::Regular, 9.0, PLACEHOLDER_TEXT).with_align(TextAlign::Center);
    text::draw_text(
        canvas,
        ctx.fonts,
        label,
        &style,
        area.x,
        area.y + area.height / 2,
        area.width,
    );
}

/// Scales an image of `width` x `height` pixels so it covers `area` while
/// keeping its aspect ratio, centered on `area`. The overflow is clipped by
/// the caller.
pub(crate) fn cover_rect(area: Rect, width: u32, height: u32) -> Rect {
    if width == 0 || height == 0 {
        return area;
    }
    let area_w = area.width.to_f32();
    let area_h = area.height.to_f32();
    let scale = (area_w / width as f32).max(area_h / height as f32);
    let w = Pt::from_f32(width as f32 * scale);
    let h = Pt::from_f32(height as f32 * scale);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
