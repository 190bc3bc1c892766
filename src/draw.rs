use crate::canvas::Canvas;
use crate::types::{Color, Pt, Rect};

/// Horizontal rule from `x1` to `x2` at `y`.
pub(crate) fn divider(canvas: &mut Canvas, x1: Pt, x2: Pt, y: Pt, color: Color, width: Pt) {
    canvas.set_stroke_color(color);
    canvas.set_line_width(width);
    canvas.move_to(x1, y);
    canvas.line_to(x2, y);
    canvas.stroke();
}

pub(crate) fn filled_rect(canvas: &mut Canvas, rect: Rect, color: Color) {
    canvas.set_fill_color(color);
    canvas.draw_rect(rect);
}

/// Rectangle outline, optionally filled underneath in the same path.
pub(crate) fn bordered_rect(
    canvas: &mut Canvas,
    rect: Rect,
    fill: Option<Color>,
    stroke: Color,
    line_width: Pt,
) {
    canvas.set_stroke_color(stroke);
    canvas.set_line_width(line_width);
    canvas.rect_path(rect);
    match fill {
        Some(color) => {
            canvas.set_fill_color(color);
            canvas.fill_stroke();
        }
        None => canvas.stroke(),
    }
}

/// Square checkbox with its top-left corner at `(x, y)`. A checked box gets a
/// tick drawn inside it.
pub(crate) fn checkbox(canvas: &mut Canvas, x: Pt, y: Pt, size: Pt, checked: bool, color: Color) {
    let rect = Rect::new(x, y, size, size);
    canvas.set_stroke_color(color);
    canvas.set_line_width(Pt::from_f32(1.2));
    canvas.rect_path(rect);
    canvas.stroke();
    if checked {
        canvas.set_line_width(Pt::from_f32(1.6));
        canvas.move_to(x + size.mul_ratio(2, 10), y + size.mul_ratio(5, 10));
        canvas.line_to(x + size.mul_ratio(42, 100), y + size.mul_ratio(75, 100));
        canvas.line_to(x + size.mul_ratio(8, 10), y + size.mul_ratio(25, 100));
        canvas.stroke();
    }
}
