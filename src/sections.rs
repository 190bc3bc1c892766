use crate::canvas::Canvas;
use crate::cursor::{LayoutContext, LayoutCursor, ensure_space};
use crate::font::FontId;
use crate::model::non_blank;
use crate::text::{self, TextAlign, TextStyle};
use crate::types::{Color, Pt, Rect};

pub(crate) const HEADING: Color = Color::hex(0x333333);

const TITLE_BAND: f32 = 20.0;
const TRAILING_GAP: f32 = 20.0;

fn body_style() -> TextStyle {
    TextStyle::new(FontId::Regular, 11.0, HEADING)
        .with_align(TextAlign::Justify)
        .with_line_gap(3.0)
}

/// Bold 14pt section heading spanning the content width.
pub(crate) fn draw_section_title(ctx: &LayoutContext<'_>, canvas: &mut Canvas, title: &str, top: Pt) {
    let style = TextStyle::new(FontId::Bold, 14.0, HEADING);
    text::draw_text(
        canvas,
        ctx.fonts,
        title,
        &style,
        ctx.geometry.content_left(),
        top,
        ctx.geometry.content_width(),
    );
}

/// Titled block of justified text. Skipped entirely when `body` is blank.
pub(crate) fn draw_text_section(
    ctx: &LayoutContext<'_>,
    canvas: &mut Canvas,
    cursor: LayoutCursor,
    title: &str,
    body: Option<&str>,
    block: &str,
) -> LayoutCursor {
    let Some(body) = non_blank(body) else {
        return cursor;
    };
    let style = body_style();
    let left = ctx.geometry.content_left();
    let width = ctx.geometry.content_width();
    let band = Pt::from_f32(TITLE_BAND);
    let gap = Pt::from_f32(TRAILING_GAP);

    let body_height = text::measure_style(ctx.fonts, body, &style, width);
    let cursor = ensure_space(ctx, canvas, cursor, band + body_height + gap, block);

    draw_section_title(ctx, canvas, title, cursor.y);
    let painted = text::draw_text(canvas, ctx.fonts, body, &style, left, cursor.y + band, width);
    canvas.record_block_bounds(block, Rect::new(left, cursor.y, width, band + painted));
    cursor.down(band + painted + gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::tests::{sample_document, with_context};

    #[test]
    fn blank_sections_are_skipped() {
        let doc = sample_document();
        with_context(&doc, |ctx, canvas| {
            let cursor = LayoutCursor::first_page(ctx.body_top);
            let before = canvas.current_command_count();
            let next = draw_text_section(ctx, canvas, cursor, "Conclusão", Some("  \n "), "t");
            assert_eq!(next, cursor);
            assert_eq!(canvas.current_command_count(), before);
            let next = draw_text_section(ctx, canvas, cursor, "Conclusão", None, "t");
            assert_eq!(next, cursor);
        });
    }

    #[test]
    fn section_advances_by_title_body_and_gap() {
        let doc = sample_document();
        with_context(&doc, |ctx, canvas| {
            let cursor = LayoutCursor::first_page(ctx.body_top);
            let next = draw_text_section(
                ctx,
                canvas,
                cursor,
                "Descrição do Relatório",
                Some("Vistoria de rotina."),
                "section.description",
            );
            // One 11pt line: 11 * 1.156 + 3 = 15.716.
            assert_eq!(next.y, cursor.y + Pt::from_f32(20.0 + 15.716 + 20.0));
            assert_eq!(next.page, 1);
        });
    }

    #[test]
    fn section_that_does_not_fit_moves_to_next_page() {
        let doc = sample_document();
        with_context(&doc, |ctx, canvas| {
            let cursor = LayoutCursor::first_page(Pt::from_f32(700.0));
            let body = "linha de texto ".repeat(40);
            let next = draw_text_section(ctx, canvas, cursor, "Observações Gerais", Some(&body), "t");
            assert_eq!(next.page, 2);
            assert!(next.y > ctx.body_top);
            assert_eq!(canvas.page_number(), 2);
        });
    }
}
