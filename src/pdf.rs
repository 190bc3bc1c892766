use crate::canvas::{Command, Document, Page};
use crate::font::{FontId, FontProgramKind, FontRegistry, RegisteredFont, encode_winansi};
use crate::images::{AlphaData, ImageData};
use crate::types::{Color, Pt, Size};
use fixed::types::I32F32;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;
use time::OffsetDateTime;

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

const PRODUCER: &str = concat!("relatorio-pdf ", env!("CARGO_PKG_VERSION"));

/// Document information dictionary entries.
pub(crate) struct PdfInfo<'a> {
    pub(crate) title: &'a str,
    pub(crate) created_at: OffsetDateTime,
}

/// Serializes recorded pages to PDF 1.7. Output depends only on the inputs, so
/// the same document and timestamp always produce the same bytes.
pub(crate) fn document_to_pdf(
    document: &Document,
    fonts: &FontRegistry,
    images: &BTreeMap<&str, &ImageData>,
    info: &PdfInfo<'_>,
) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3 shared resources, then fonts, images, pages, info.
    let mut objects: Vec<String> = vec![String::new(); 3];

    let mut font_entries: Vec<(String, usize)> = Vec::new();
    for id in [FontId::Regular, FontId::Bold] {
        let font = fonts.font(id);
        let font_obj_id = push_font_objects(&mut objects, font);
        font_entries.push((id.resource_name().to_string(), font_obj_id));
    }

    let mut image_entries: Vec<(String, usize)> = Vec::new();
    for (resource_id, image) in images {
        let smask_id = image.alpha.as_ref().map(|alpha| {
            objects.push(image_smask_object(alpha));
            objects.len()
        });
        objects.push(image_object(image, smask_id));
        image_entries.push((resource_id.to_string(), objects.len()));
    }

    let mut page_ids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = render_page(page, document.page_size.height, images);
        objects.push(stream_object(&content));
        let content_id = objects.len();
        objects.push(page_object(document.page_size, content_id));
        page_ids.push(objects.len());
    }

    objects.push(info_object(info));
    let info_id = objects.len();

    objects[PDF_CATALOG_ID - 1] = format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID);
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");
    objects[PDF_PAGES_ID - 1] = format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        page_ids.len()
    );
    let mut resources = format!("<< /Font {}", name_dictionary(&font_entries));
    if !image_entries.is_empty() {
        resources.push_str(&format!(" /XObject {}", name_dictionary(&image_entries)));
    }
    resources.push_str(" >>");
    objects[PDF_RESOURCES_ID - 1] = resources;

    build_pdf(objects, PDF_CATALOG_ID, info_id)
}

fn push_font_objects(objects: &mut Vec<String>, font: &RegisteredFont) -> usize {
    match &font.data {
        None => {
            objects.push(font_object(&font.name));
            objects.len()
        }
        Some(data) => {
            objects.push(font_file_object(data, font.program_kind));
            let file_id = objects.len();
            objects.push(font_descriptor_object(font, file_id));
            let descriptor_id = objects.len();
            objects.push(truetype_font_object(font, descriptor_id));
            objects.len()
        }
    }
}

fn page_object(page_size: Size, content_id: usize) -> String {
    format!(
        "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
        PDF_PAGES_ID,
        fmt_pt(page_size.width),
        fmt_pt(page_size.height),
        PDF_RESOURCES_ID,
        content_id
    )
}

fn name_dictionary(entries: &[(String, usize)]) -> String {
    let entries = entries
        .iter()
        .map(|(name, id)| format!("/{} {} 0 R", name, id))
        .collect::<Vec<_>>();
    format!("<< {} >>", entries.join(" "))
}

fn render_page(page: &Page, page_height: Pt, images: &BTreeMap<&str, &ImageData>) -> String {
    let mut out = String::new();
    let mut current_font = FontId::Regular;
    let mut current_font_size = Pt::from_f32(12.0);

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => out.push_str("q\n"),
            Command::RestoreState => out.push_str("Q\n"),
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => out.push_str(&color_to_pdf_fill(*color)),
            Command::SetStrokeColor(color) => out.push_str(&color_to_pdf_stroke(*color)),
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFont(font) => current_font = *font,
            Command::SetFontSize(size) => current_font_size = *size,
            Command::SetWordSpacing(spacing) => {
                out.push_str(&format!("{} Tw\n", fmt_pt(*spacing)));
            }
            Command::ClipRect {
                x,
                y,
                width,
                height,
            } => {
                // Top-left origin in the display list, bottom-left in PDF.
                out.push_str(&format!(
                    "{} {} {} {} re\nW\nn\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::RectPath {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::Stroke => out.push_str("S\n"),
            Command::FillStroke => out.push_str("B\n"),
            Command::DrawString { x, y, text } => {
                out.push_str("BT\n");
                out.push_str(&format!(
                    "/{} {} Tf\n",
                    current_font.resource_name(),
                    fmt_pt(current_font_size)
                ));
                out.push_str(&format!("{} {} Td\n", fmt_pt(*x), fmt_pt(page_height - *y)));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::DrawStringTransformed {
                x,
                y,
                text,
                m00,
                m01,
                m10,
                m11,
            } => {
                out.push_str("BT\n");
                out.push_str(&format!(
                    "/{} {} Tf\n",
                    current_font.resource_name(),
                    fmt_pt(current_font_size)
                ));
                out.push_str(&format!(
                    "{} {} {} {} {} {} Tm\n",
                    fmt(*m00),
                    fmt(*m01),
                    fmt(*m10),
                    fmt(*m11),
                    fmt_pt(*x),
                    fmt_pt(page_height - *y)
                ));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                if images.contains_key(resource_id.as_str()) {
                    let draw_y = page_height - *y - *height;
                    out.push_str("q\n");
                    out.push_str(&format!(
                        "{} 0 0 {} {} {} cm\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(draw_y)
                    ));
                    out.push_str(&format!("/{} Do\n", resource_id));
                    out.push_str("Q\n");
                }
            }
        }
    }
    out
}

fn build_pdf(objects: Vec<String>, catalog_id: usize, info_id: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(obj.as_bytes());
        out.extend_from_slice(b"\nendobj\n");
    }

    // File identifier derived from the body so identical input yields identical bytes.
    let digest = Sha256::digest(&out);
    let file_id = ascii_hex_encode(&digest[..16]).to_ascii_lowercase();

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    let trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R /ID [<{}> <{}>] >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        catalog_id,
        info_id,
        file_id,
        file_id,
        xref_start
    );
    out.extend_from_slice(trailer.as_bytes());
    out
}

fn stream_object(content: &str) -> String {
    let length = content.len();
    format!("<< /Length {} >>\nstream\n{}\nendstream", length, content)
}

fn info_object(info: &PdfInfo<'_>) -> String {
    format!(
        "<< /Title {} /Producer ({}) /CreationDate ({}) >>",
        utf16be_hex(info.title),
        escape_pdf_string(PRODUCER),
        pdf_date(info.created_at)
    )
}

// Text string as UTF-16BE with a byte order mark.
fn utf16be_hex(text: &str) -> String {
    let mut hex = String::from("<FEFF");
    for unit in text.encode_utf16() {
        hex.push_str(&format!("{:04X}", unit));
    }
    hex.push('>');
    hex
}

fn pdf_date(value: OffsetDateTime) -> String {
    let offset = value.offset();
    let (hours, minutes, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{}{:02}'{:02}'",
        value.year(),
        u8::from(value.month()),
        value.day(),
        value.hour(),
        value.minute(),
        value.second(),
        sign,
        hours.unsigned_abs(),
        minutes.unsigned_abs()
    )
}

fn image_object(image: &ImageData, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let filters = match image.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} /Length {} /Filter {}{} >>
stream
{}
endstream",
        image.width,
        image.height,
        image.color_space,
        image.bits_per_component,
        stream_data.len(),
        filters,
        smask,
        stream_data
    )
}

fn image_smask_object(alpha: &AlphaData) -> String {
    let stream_data = encode_stream_data(&alpha.data);
    let filters = match alpha.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent {} /Length {} /Filter {} >>
stream
{}
endstream",
        alpha.width,
        alpha.height,
        alpha.bits_per_component,
        stream_data.len(),
        filters,
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn truetype_font_object(font: &RegisteredFont, descriptor_id: usize) -> String {
    let base = sanitize_font_name(&font.name);
    let metrics = &font.metrics;
    let subtype = match font.program_kind {
        FontProgramKind::OpenTypeCff => "Type1",
        FontProgramKind::TrueType | FontProgramKind::Standard => "TrueType",
    };
    let widths = metrics
        .widths
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<< /Type /Font /Subtype /{} /BaseFont /{} /FirstChar {} /LastChar {} /Widths [{}] /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
        subtype, base, metrics.first_char, metrics.last_char, widths, descriptor_id
    )
}

fn font_descriptor_object(font: &RegisteredFont, font_file_id: usize) -> String {
    let base = sanitize_font_name(&font.name);
    let metrics = &font.metrics;
    let mut flags = 32;
    if metrics.is_fixed_pitch {
        flags |= 1;
    }
    let font_file_entry = match font.program_kind {
        FontProgramKind::OpenTypeCff => "FontFile3",
        FontProgramKind::TrueType | FontProgramKind::Standard => "FontFile2",
    };
    format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags {} /FontBBox [{} {} {} {}] /ItalicAngle {} /Ascent {} /Descent {} /CapHeight {} /StemV {} /MissingWidth {} /{} {} 0 R >>",
        base,
        flags,
        metrics.bbox.0,
        metrics.bbox.1,
        metrics.bbox.2,
        metrics.bbox.3,
        metrics.italic_angle,
        metrics.ascent,
        metrics.descent,
        metrics.cap_height,
        metrics.stem_v,
        metrics.missing_width,
        font_file_entry,
        font_file_id
    )
}

fn font_file_object(data: &[u8], kind: FontProgramKind) -> String {
    let mut stream_data = ascii_hex_encode(data);
    stream_data.push('>');
    stream_data.push('\n');
    let mut dict = format!(
        "<< /Length {} /Length1 {} /Filter /ASCIIHexDecode",
        stream_data.len(),
        data.len()
    );
    if matches!(kind, FontProgramKind::OpenTypeCff) {
        dict.push_str(" /Subtype /OpenType");
    }
    dict.push_str(" >>\nstream\n");
    format!("{}{}endstream", dict, stream_data)
}

fn font_object(name: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        sanitize_font_name(name)
    )
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 32);
    for (index, byte) in data.iter().enumerate() {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn sanitize_font_name(name: &str) -> String {
    let mut out = String::new();
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        } else if ch == ' ' {
            out.push('-');
        }
    }
    if out.is_empty() {
        "Helvetica".to_string()
    } else {
        out
    }
}

fn escape_pdf_string(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

/// Encodes text as a WinAnsi literal string body. Bytes outside printable
/// ASCII are written as octal escapes; unencodable characters become `?`,
/// matching how they were measured.
pub(crate) fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match encode_winansi(ch).unwrap_or(b'?') {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if !(0x20..0x7f).contains(&b) => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    out
}

pub(crate) fn flate_compress(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::saturating_from_num(value);
    let scaled = (fixed * I32F32::from_num(1000)).round();
    let milli: i64 = scaled.to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

fn color_to_pdf_fill(color: Color) -> String {
    format!(
        "{} {} {} rg\n",
        fmt(clamp_unit(color.r)),
        fmt(clamp_unit(color.g)),
        fmt(clamp_unit(color.b))
    )
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!(
        "{} {} {} RG\n",
        fmt(clamp_unit(color.r)),
        fmt(clamp_unit(color.g)),
        fmt(clamp_unit(color.b))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::font::FontPair;
    use crate::images::decode_image_bytes;
    use crate::images::tests::png_bytes;
    use crate::types::Rect;
    use time::macros::datetime;

    fn count_token(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle)
            .count()
    }

    fn info() -> PdfInfo<'static> {
        PdfInfo {
            title: "Relatório (teste)",
            created_at: datetime!(2024-01-01 12:30:05 -3),
        }
    }

    #[test]
    fn winansi_strings_escape_delimiters_and_high_bytes() {
        assert_eq!(encode_winansi_pdf_string("a(b)\\"), "a\\(b\\)\\\\");
        assert_eq!(encode_winansi_pdf_string("ó"), "\\363");
        assert_eq!(encode_winansi_pdf_string("\u{2014}"), "\\227");
        assert_eq!(encode_winansi_pdf_string("\u{2611}"), "?");
    }

    #[test]
    fn title_is_utf16_with_byte_order_mark() {
        assert_eq!(utf16be_hex(""), "<FEFF>");
        assert_eq!(utf16be_hex("A\u{2014}ó"), "<FEFF0041201400F3>");
        assert_eq!(utf16be_hex("\u{2611}"), "<FEFF2611>");
        assert_eq!(utf16be_hex("\u{1F4F7}"), "<FEFFD83DDCF7>");

        let fonts = FontRegistry::load(&FontPair::standard()).unwrap();
        let title = "Vistoria \u{2014} Bloco \u{2611}";
        let pdf = document_to_pdf(
            &Canvas::new(Size::a4()).finish(),
            &fonts,
            &BTreeMap::new(),
            &PdfInfo { title, created_at: info().created_at },
        );
        let parsed = lopdf::Document::load_mem(&pdf).unwrap();
        let info_ref = parsed.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info_dict = parsed.get_dictionary(info_ref).unwrap();
        let raw = info_dict.get(b"Title").unwrap().as_str().unwrap();
        assert_eq!(&raw[..2], &[0xFE, 0xFF]);
        let units: Vec<u16> = raw[2..]
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(String::from_utf16(&units).unwrap(), title);
    }

    #[test]
    fn numbers_are_formatted_compactly() {
        assert_eq!(format_milli(841_890), "841.89");
        assert_eq!(format_milli(-15_000), "-15");
        assert_eq!(fmt(0.5), "0.5");
        assert_eq!(fmt_pt(Pt::ZERO), "0");
    }

    #[test]
    fn pdf_date_keeps_offset() {
        assert_eq!(pdf_date(info().created_at), "D:20240101123005-03'00'");
    }

    #[test]
    fn standard_fonts_are_referenced_not_embedded() {
        let fonts = FontRegistry::load(&FontPair::standard()).unwrap();
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font(FontId::Bold);
        canvas.set_font_size(Pt::from_f32(24.0));
        canvas.draw_string(Pt::from_f32(50.0), Pt::from_f32(80.0), "Relatório");
        let pdf = document_to_pdf(&canvas.finish(), &fonts, &BTreeMap::new(), &info());

        assert!(pdf.starts_with(b"%PDF-1.7\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count_token(&pdf, b"/BaseFont /Helvetica-Bold"), 1);
        assert_eq!(count_token(&pdf, b"/FontFile2"), 0);
        assert_eq!(count_token(&pdf, b"/F2 24 Tf"), 1);
        assert_eq!(count_token(&pdf, b"50 761.89 Td"), 1);
        assert_eq!(count_token(&pdf, b"(Relat\\363rio) Tj"), 1);
        assert_eq!(
            count_token(&pdf, b"/Title <FEFF00520065006C0061007400F300720069006F00200028007400650073007400650029>"),
            1
        );

        let parsed = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn images_are_emitted_once_with_soft_mask() {
        let fonts = FontRegistry::load(&FontPair::standard()).unwrap();
        let image = decode_image_bytes(&png_bytes(3, 2, 100)).unwrap();
        let mut images = BTreeMap::new();
        images.insert("Im1", &image);

        let mut canvas = Canvas::new(Size::a4());
        let area = Rect::new(
            Pt::from_f32(50.0),
            Pt::from_f32(100.0),
            Pt::from_f32(120.0),
            Pt::from_f32(90.0),
        );
        canvas.save_state();
        canvas.clip_rect(area);
        canvas.draw_image(area, "Im1");
        canvas.restore_state();
        canvas.show_page();
        canvas.draw_image(area, "Im9");
        let pdf = document_to_pdf(&canvas.finish(), &fonts, &images, &info());

        assert_eq!(count_token(&pdf, b"/Subtype /Image"), 2);
        assert_eq!(count_token(&pdf, b"/SMask"), 1);
        assert_eq!(count_token(&pdf, b"/Im1 Do"), 1);
        assert_eq!(count_token(&pdf, b"/Im9 Do"), 0);
        assert_eq!(count_token(&pdf, b"W\nn\n"), 1);
        let parsed = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[test]
    fn output_is_deterministic() {
        let fonts = FontRegistry::load(&FontPair::standard()).unwrap();
        let render = || {
            let mut canvas = Canvas::new(Size::a4());
            canvas.set_font(FontId::Regular);
            canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(20.0), "igual");
            document_to_pdf(&canvas.finish(), &fonts, &BTreeMap::new(), &info())
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn truetype_fonts_are_embedded_with_widths() {
        let Some((regular, bold)) = crate::font::tests::system_truetype_paths() else {
            eprintln!("skipping: DejaVu Sans not installed");
            return;
        };
        let program_len = std::fs::metadata(&regular).unwrap().len() as i64;
        let fonts = FontRegistry::load(&FontPair::from_files(&regular, &bold)).unwrap();
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font(FontId::Bold);
        canvas.draw_string(Pt::from_f32(50.0), Pt::from_f32(80.0), "Relatório");
        canvas.set_font(FontId::Regular);
        canvas.draw_string(Pt::from_f32(50.0), Pt::from_f32(100.0), "Extintores — ok");
        let pdf = document_to_pdf(&canvas.finish(), &fonts, &BTreeMap::new(), &info());

        assert_eq!(count_token(&pdf, b"/Subtype /TrueType"), 2);
        assert_eq!(count_token(&pdf, b"/FontFile2"), 2);
        assert_eq!(count_token(&pdf, b"/Widths ["), 2);
        assert_eq!(count_token(&pdf, b"/BaseFont /Helvetica"), 0);
        let w_width = fonts.font(FontId::Regular).metrics.widths[(b'W' - 32) as usize];
        assert!(w_width > 0);

        let parsed = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
        let embedded = parsed
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Length1")
                    .and_then(|length| length.as_i64())
                    .is_ok_and(|length| length == program_len)
            })
            .count();
        assert_eq!(embedded, 1);
    }
}
