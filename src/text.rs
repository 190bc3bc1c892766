use crate::canvas::Canvas;
use crate::font::{FontId, FontRegistry};
use crate::types::{Color, Pt};
use std::collections::HashMap;

// tan(12deg); horizontal shear used for oblique text.
const OBLIQUE_SHEAR: f32 = 0.212_556_56;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextAlign {
    Left,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TextStyle {
    pub(crate) font: FontId,
    pub(crate) size: Pt,
    pub(crate) color: Color,
    pub(crate) align: TextAlign,
    pub(crate) line_gap: Pt,
    pub(crate) oblique: bool,
}

impl TextStyle {
    pub(crate) fn new(font: FontId, size: f32, color: Color) -> Self {
        Self {
            font,
            size: Pt::from_f32(size),
            color,
            align: TextAlign::Left,
            line_gap: Pt::ZERO,
            oblique: false,
        }
    }

    pub(crate) fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub(crate) fn with_line_gap(mut self, line_gap: f32) -> Self {
        self.line_gap = Pt::from_f32(line_gap);
        self
    }

    pub(crate) fn oblique(mut self) -> Self {
        self.oblique = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LineLayout {
    pub(crate) text: String,
    pub(crate) width: Pt,
    pub(crate) ends_paragraph: bool,
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace(['\r', '\t'], " ")
}

pub(crate) fn layout_lines(
    registry: &FontRegistry,
    text: &str,
    font: FontId,
    size: Pt,
    max_width: Pt,
) -> Vec<LineLayout> {
    let text = normalize(text);
    if text.trim().is_empty() {
        return Vec::new();
    }
    let max_width = max_width.max(Pt::from_f32(1.0));
    let space_width = registry.measure_text_width(font, size, " ");
    let mut word_widths: HashMap<&str, Pt> = HashMap::new();
    let mut lines: Vec<LineLayout> = Vec::new();

    for segment in text.trim_end().split('\n') {
        let mut current = String::new();
        let mut current_width = Pt::ZERO;
        for word in segment.split_whitespace() {
            let word_width = *word_widths
                .entry(word)
                .or_insert_with(|| registry.measure_text_width(font, size, word));
            if !current.is_empty() {
                let next_width = current_width + space_width + word_width;
                if next_width <= max_width {
                    current.push(' ');
                    current.push_str(word);
                    current_width = next_width;
                    continue;
                }
                lines.push(LineLayout {
                    text: std::mem::take(&mut current),
                    width: current_width,
                    ends_paragraph: false,
                });
                current_width = Pt::ZERO;
            }
            if word_width > max_width {
                let mut parts = split_long_word(registry, word, font, size, max_width);
                let tail = parts.pop();
                lines.extend(parts);
                if let Some(tail) = tail {
                    current = tail.text;
                    current_width = tail.width;
                }
            } else {
                current.push_str(word);
                current_width = word_width;
            }
        }
        lines.push(LineLayout {
            text: current,
            width: current_width,
            ends_paragraph: true,
        });
    }
    lines
}

fn split_long_word(
    registry: &FontRegistry,
    word: &str,
    font: FontId,
    size: Pt,
    max_width: Pt,
) -> Vec<LineLayout> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = Pt::ZERO;
    let mut buf = [0u8; 4];
    for ch in word.chars() {
        let w = registry.measure_text_width(font, size, ch.encode_utf8(&mut buf));
        let mut next_width = current_width + w;
        if !current.is_empty() && next_width > max_width {
            parts.push(LineLayout {
                text: std::mem::take(&mut current),
                width: current_width,
                ends_paragraph: false,
            });
            next_width = w;
        }
        current.push(ch);
        current_width = next_width;
    }
    if !current.is_empty() {
        parts.push(LineLayout {
            text: current,
            width: current_width,
            ends_paragraph: false,
        });
    }
    parts
}

fn line_advance(registry: &FontRegistry, font: FontId, size: Pt, line_gap: Pt) -> Pt {
    registry.line_height(font, size) + line_gap
}

pub(crate) fn measure_height(
    registry: &FontRegistry,
    text: &str,
    font: FontId,
    size: Pt,
    width: Pt,
    _align: TextAlign,
    line_gap: Pt,
) -> Pt {
    let lines = layout_lines(registry, text, font, size, width);
    if lines.is_empty() {
        return Pt::ZERO;
    }
    line_advance(registry, font, size, line_gap) * lines.len() as i32
}

pub(crate) fn measure_style(registry: &FontRegistry, text: &str, style: &TextStyle, width: Pt) -> Pt {
    measure_height(
        registry,
        text,
        style.font,
        style.size,
        width,
        style.align,
        style.line_gap,
    )
}

// Returns the painted height, equal to `measure_style` for the same inputs.
pub(crate) fn draw_text(
    canvas: &mut Canvas,
    registry: &FontRegistry,
    text: &str,
    style: &TextStyle,
    x: Pt,
    top: Pt,
    width: Pt,
) -> Pt {
    let lines = layout_lines(registry, text, style.font, style.size, width);
    if lines.is_empty() {
        return Pt::ZERO;
    }
    canvas.set_font(style.font);
    canvas.set_font_size(style.size);
    canvas.set_fill_color(style.color);

    let advance = line_advance(registry, style.font, style.size, style.line_gap);
    let ascent = registry.ascent(style.font, style.size);
    let mut line_top = top;
    for line in &lines {
        let baseline = line_top + ascent;
        let offset = match style.align {
            TextAlign::Center => (width - line.width).max(Pt::ZERO) / 2,
            TextAlign::Left | TextAlign::Justify => Pt::ZERO,
        };
        let gaps = line.text.matches(' ').count() as i32;
        let justify = style.align == TextAlign::Justify && !line.ends_paragraph && gaps > 0;
        if justify {
            canvas.set_word_spacing(((width - line.width).max(Pt::ZERO)) / gaps);
        } else {
            canvas.set_word_spacing(Pt::ZERO);
        }
        if style.oblique {
            canvas.draw_string_transformed(
                x + offset,
                baseline,
                line.text.clone(),
                [1.0, 0.0, OBLIQUE_SHEAR, 1.0],
            );
        } else {
            canvas.draw_string(x + offset, baseline, line.text.clone());
        }
        line_top += advance;
    }
    canvas.set_word_spacing(Pt::ZERO);
    advance * lines.len() as i32
}

pub(crate) fn draw_line(
    canvas: &mut Canvas,
    registry: &FontRegistry,
    text: &str,
    font: FontId,
    size: Pt,
    color: Color,
    x: Pt,
    top: Pt,
) {
    canvas.set_font(font);
    canvas.set_font_size(size);
    canvas.set_fill_color(color);
    canvas.set_word_spacing(Pt::ZERO);
    canvas.draw_string(x, top + registry.ascent(font, size), text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::font::FontPair;
    use crate::types::Size;

    fn registry() -> FontRegistry {
        FontRegistry::load(&FontPair::standard()).unwrap()
    }

    #[test]
    fn blank_text_has_no_height() {
        let fonts = registry();
        let height = measure_height(
            &fonts,
            "  \n\t ",
            FontId::Regular,
            Pt::from_f32(11.0),
            Pt::from_f32(200.0),
            TextAlign::Justify,
            Pt::from_f32(3.0),
        );
        assert_eq!(height, Pt::ZERO);
    }

    #[test]
    fn lines_never_exceed_column_width() {
        let fonts = registry();
        let text = "Inspeção realizada no quadro elétrico principal com verificação \
                    dos disjuntores e aterramento conforme norma vigente";
        let width = Pt::from_f32(120.0);
        let lines = layout_lines(&fonts, text, FontId::Regular, Pt::from_f32(11.0), width);
        assert!(lines.len() > 2);
        for line in &lines {
            assert!(line.width <= width, "{:?} is too wide", line.text);
        }
        assert!(lines.last().unwrap().ends_paragraph);
    }

    #[test]
    fn long_words_break_by_character() {
        let fonts = registry();
        let width = Pt::from_f32(40.0);
        let lines = layout_lines(
            &fonts,
            "AAAAAAAAAAAAAAAAAAAA",
            FontId::Bold,
            Pt::from_f32(12.0),
            width,
        );
        assert!(lines.len() > 1);
        let joined: String = lines.iter().map(|line| line.text.as_str()).collect();
        assert_eq!(joined, "AAAAAAAAAAAAAAAAAAAA");
        for line in &lines {
            assert!(line.width <= width);
        }
    }

    #[test]
    fn explicit_newlines_start_paragraphs() {
        let fonts = registry();
        let size = Pt::from_f32(10.0);
        let gap = Pt::from_f32(3.0);
        let one = measure_height(
            &fonts,
            "a",
            FontId::Regular,
            size,
            Pt::from_f32(300.0),
            TextAlign::Left,
            gap,
        );
        let three = measure_height(
            &fonts,
            "a\n\nb",
            FontId::Regular,
            size,
            Pt::from_f32(300.0),
            TextAlign::Left,
            gap,
        );
        assert_eq!(one, Pt::from_f32(14.56));
        assert_eq!(three, one * 3);
    }

    #[test]
    fn painted_height_matches_measured_height() {
        let fonts = registry();
        let style = TextStyle::new(FontId::Regular, 11.0, Color::hex(0x333333))
            .with_align(TextAlign::Justify)
            .with_line_gap(3.0);
        let text = "Texto longo o bastante para quebrar em varias linhas dentro da coluna.";
        let width = Pt::from_f32(150.0);
        let mut canvas = Canvas::new(Size::a4());
        let painted = draw_text(&mut canvas, &fonts, text, &style, Pt::ZERO, Pt::ZERO, width);
        assert_eq!(painted, measure_style(&fonts, text, &style, width));
    }

    #[test]
    fn justified_lines_stretch_except_the_last() {
        let fonts = registry();
        let style = TextStyle::new(FontId::Regular, 11.0, Color::BLACK)
            .with_align(TextAlign::Justify);
        let text = "um dois tres quatro cinco seis sete oito nove dez onze doze treze";
        let mut canvas = Canvas::new(Size::a4());
        draw_text(
            &mut canvas,
            &fonts,
            text,
            &style,
            Pt::ZERO,
            Pt::ZERO,
            Pt::from_f32(120.0),
        );
        let doc = canvas.finish();
        let commands = &doc.pages[0].commands;
        assert!(commands.iter().any(
            |cmd| matches!(cmd, Command::SetWordSpacing(spacing) if *spacing > Pt::ZERO)
        ));
        // The closing line of the paragraph is painted with spacing reset.
        let n = commands.len();
        assert!(matches!(commands[n - 1], Command::DrawString { .. }));
        assert_eq!(commands[n - 2], Command::SetWordSpacing(Pt::ZERO));
    }
}
