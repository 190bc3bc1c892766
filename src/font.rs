use crate::error::ReportError;
use crate::types::Pt;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The two faces a report is typeset with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontId {
    Regular,
    Bold,
}

impl FontId {
    pub(crate) fn resource_name(self) -> &'static str {
        match self {
            FontId::Regular => "F1",
            FontId::Bold => "F2",
        }
    }

    fn index(self) -> usize {
        match self {
            FontId::Regular => 0,
            FontId::Bold => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    fn base_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontSource {
    /// PDF base-14 font, referenced by name and never embedded.
    Standard(StandardFont),
    /// TrueType/OpenType file read when the generator is built.
    File(PathBuf),
    Bytes { name: String, data: Vec<u8> },
}

/// Regular + bold font resources. Both must resolve before any page is created.
#[derive(Debug, Clone)]
pub struct FontPair {
    pub regular: FontSource,
    pub bold: FontSource,
}

impl FontPair {
    pub fn standard() -> Self {
        Self {
            regular: FontSource::Standard(StandardFont::Helvetica),
            bold: FontSource::Standard(StandardFont::HelveticaBold),
        }
    }

    pub fn from_files(regular: impl Into<PathBuf>, bold: impl Into<PathBuf>) -> Self {
        Self {
            regular: FontSource::File(regular.into()),
            bold: FontSource::File(bold.into()),
        }
    }

    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>) -> Self {
        Self {
            regular: FontSource::Bytes {
                name: "Regular".to_string(),
                data: regular,
            },
            bold: FontSource::Bytes {
                name: "Bold".to_string(),
                data: bold,
            },
        }
    }
}

impl Default for FontPair {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TextWidthKey {
    font: FontId,
    size_milli: i64,
    text: String,
}

#[derive(Debug)]
struct TextWidthCache {
    map: HashMap<TextWidthKey, Pt>,
    order: VecDeque<TextWidthKey>,
    max_entries: usize,
}

impl TextWidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, key: &TextWidthKey) -> Option<Pt> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: TextWidthKey, value: Pt) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
        while self.map.len() > self.max_entries {
            let Some(old) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&old);
        }
    }
}

#[derive(Debug)]
pub(crate) struct FontRegistry {
    fonts: [RegisteredFont; 2],
    text_width_cache: Mutex<TextWidthCache>,
}

#[derive(Debug)]
pub(crate) struct RegisteredFont {
    pub(crate) name: String,
    /// Font program bytes; `None` for standard fonts.
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) metrics: FontMetrics,
    pub(crate) program_kind: FontProgramKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontProgramKind {
    Standard,
    TrueType,
    OpenTypeCff,
}

/// Metrics in 1/1000 em, indexed by WinAnsi code.
#[derive(Debug)]
pub(crate) struct FontMetrics {
    pub(crate) first_char: u8,
    pub(crate) last_char: u8,
    pub(crate) widths: Vec<u16>,
    pub(crate) ascent: i16,
    pub(crate) descent: i16,
    pub(crate) line_gap: i16,
    pub(crate) cap_height: i16,
    pub(crate) italic_angle: i16,
    pub(crate) stem_v: i16,
    pub(crate) bbox: (i16, i16, i16, i16),
    pub(crate) missing_width: u16,
    pub(crate) is_fixed_pitch: bool,
}

impl FontRegistry {
    pub(crate) fn load(pair: &FontPair) -> Result<Self, ReportError> {
        let regular = RegisteredFont::load(&pair.regular)?;
        let bold = RegisteredFont::load(&pair.bold)?;
        Ok(Self {
            fonts: [regular, bold],
            text_width_cache: Mutex::new(TextWidthCache::new(20_000)),
        })
    }

    pub(crate) fn font(&self, id: FontId) -> &RegisteredFont {
        &self.fonts[id.index()]
    }

    pub(crate) fn measure_text_width(&self, id: FontId, font_size: Pt, text: &str) -> Pt {
        let key = TextWidthKey {
            font: id,
            size_milli: font_size.to_milli_i64(),
            text: text.to_string(),
        };
        if let Ok(cache) = self.text_width_cache.lock() {
            if let Some(value) = cache.get(&key) {
                return value;
            }
        }
        let value = self.font(id).metrics.measure_text_width(font_size, text);
        if let Ok(mut cache) = self.text_width_cache.lock() {
            cache.insert(key, value);
        }
        value
    }

    pub(crate) fn line_height(&self, id: FontId, font_size: Pt) -> Pt {
        self.font(id).metrics.line_height(font_size)
    }

    pub(crate) fn ascent(&self, id: FontId, font_size: Pt) -> Pt {
        let ascent = self.font(id).metrics.ascent as i32;
        font_size.mul_ratio(ascent.max(0), 1000)
    }
}

impl RegisteredFont {
    fn load(source: &FontSource) -> Result<Self, ReportError> {
        match source {
            FontSource::Standard(font) => Ok(Self::standard(*font)),
            FontSource::File(path) => {
                if !path.is_file() {
                    return Err(ReportError::MissingFont(path.display().to_string()));
                }
                let data = fs::read(path)?;
                Self::from_program(data, path)
            }
            FontSource::Bytes { name, data } => Self::from_program(data.clone(), Path::new(name)),
        }
    }

    fn standard(font: StandardFont) -> Self {
        Self {
            name: font.base_name().to_string(),
            data: None,
            metrics: FontMetrics::standard(font),
            program_kind: FontProgramKind::Standard,
        }
    }

    fn from_program(data: Vec<u8>, source: &Path) -> Result<Self, ReportError> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|err| {
            ReportError::InvalidFont(format!("{}: {}", source.display(), err))
        })?;
        let name = font_name(&face, source);
        let program_kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };
        let metrics = FontMetrics::from_face(&face);
        Ok(Self {
            name,
            data: Some(data),
            metrics,
            program_kind,
        })
    }
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;
        let mut widths = Vec::with_capacity((last_char - first_char) as usize + 1);
        for code in first_char..=last_char {
            let width = decode_winansi(code)
                .and_then(|ch| face.glyph_index(ch))
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(0);
            let scaled = (width as f32 * scale).round() as i32;
            widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
        }
        let missing_width = widths
            .get((b'?' - first_char) as usize)
            .copied()
            .unwrap_or(0);

        let ascent = scale_i16(face.ascender(), scale);
        let descent = scale_i16(face.descender(), scale);
        let bbox = face.global_bounding_box();
        Self {
            first_char,
            last_char,
            widths,
            ascent,
            descent,
            line_gap: scale_i16(face.line_gap(), scale),
            cap_height: face
                .capital_height()
                .map(|value| scale_i16(value, scale))
                .unwrap_or(ascent),
            italic_angle: face
                .italic_angle()
                .map(|value| value.round() as i16)
                .unwrap_or(0),
            stem_v: 80,
            bbox: (
                scale_i16(bbox.x_min, scale),
                scale_i16(bbox.y_min, scale),
                scale_i16(bbox.x_max, scale),
                scale_i16(bbox.y_max, scale),
            ),
            missing_width,
            is_fixed_pitch: face.is_monospaced(),
        }
    }

    fn standard(font: StandardFont) -> Self {
        let bold = font == StandardFont::HelveticaBold;
        let first_char = 32u8;
        let last_char = 255u8;
        let widths = (first_char..=last_char)
            .map(|code| helvetica_width(code, bold))
            .collect::<Vec<_>>();
        Self {
            first_char,
            last_char,
            widths,
            ascent: 718,
            descent: -207,
            // Matches the font bbox height (1156) that viewers use for leading.
            line_gap: 231,
            cap_height: 718,
            italic_angle: 0,
            stem_v: if bold { 140 } else { 88 },
            bbox: if bold {
                (-170, -228, 1003, 962)
            } else {
                (-166, -225, 1000, 931)
            },
            missing_width: 556,
            is_fixed_pitch: false,
        }
    }

    fn advance_for_char(&self, ch: char) -> u16 {
        let code = encode_winansi(ch).unwrap_or(b'?');
        if code < self.first_char || code > self.last_char {
            return self.missing_width;
        }
        let idx = (code - self.first_char) as usize;
        self.widths.get(idx).copied().unwrap_or(self.missing_width)
    }

    fn measure_text_width(&self, font_size: Pt, text: &str) -> Pt {
        let total_units: i32 = text
            .chars()
            .fold(0i32, |acc, ch| acc.saturating_add(self.advance_for_char(ch) as i32));
        if total_units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(total_units, 1000)
    }

    fn line_height(&self, font_size: Pt) -> Pt {
        let height_1000 = self.ascent as i32 - self.descent as i32 + self.line_gap as i32;
        if height_1000 <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(height_1000, 1000)
    }
}

// cp1252 code points 0x80..=0x9F that differ from Latin-1.
const WINANSI_EXTENSIONS: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// Maps a character to its WinAnsi byte. Measurement and the PDF writer both
/// go through this so unencodable characters are sized as the `?` they become.
pub(crate) fn encode_winansi(ch: char) -> Option<u8> {
    match ch {
        '\u{0000}'..='\u{007F}' => Some(ch as u8),
        '\u{00A0}'..='\u{00FF}' => Some(ch as u8),
        _ => WINANSI_EXTENSIONS
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, byte)| *byte),
    }
}

pub(crate) fn decode_winansi(byte: u8) -> Option<char> {
    match byte {
        0x00..=0x7F | 0xA0..=0xFF => Some(byte as char),
        _ => WINANSI_EXTENSIONS
            .iter()
            .find(|(_, b)| *b == byte)
            .map(|(c, _)| *c),
    }
}

const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32..47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48..63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64..79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80..95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96..111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112..126
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32..47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48..63
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64..79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80..95
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96..111
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112..126
];

fn helvetica_width(code: u8, bold: bool) -> u16 {
    let ascii = if bold {
        &HELVETICA_BOLD_ASCII
    } else {
        &HELVETICA_ASCII
    };
    if (32..=126).contains(&code) {
        return ascii[(code - 32) as usize];
    }
    let Some(ch) = decode_winansi(code) else {
        return 556;
    };
    if let Some(base) = fold_latin_letter(ch) {
        return ascii[(base as u8 - 32) as usize];
    }
    match ch {
        '\u{2026}' | '\u{2030}' | '\u{2014}' | '\u{2122}' | '\u{0152}' | '\u{00C6}' => 1000,
        '\u{0153}' => 944,
        '\u{00E6}' => 889,
        '\u{00BC}' | '\u{00BD}' | '\u{00BE}' => 834,
        '\u{00A9}' | '\u{00AE}' => 737,
        '\u{00B0}' => 400,
        '\u{00AA}' => 370,
        '\u{00BA}' => 365,
        '\u{2022}' => 350,
        '\u{00A6}' => {
            if bold {
                280
            } else {
                260
            }
        }
        '\u{00A0}' | '\u{00B7}' => 278,
        '\u{2018}' | '\u{2019}' | '\u{201A}' => {
            if bold {
                278
            } else {
                222
            }
        }
        '\u{201C}' | '\u{201D}' | '\u{201E}' => {
            if bold {
                500
            } else {
                333
            }
        }
        '\u{00A1}' | '\u{00A8}' | '\u{00AD}' | '\u{00AF}' | '\u{00B2}' | '\u{00B3}'
        | '\u{00B4}' | '\u{00B8}' | '\u{00B9}' | '\u{02C6}' | '\u{02DC}' | '\u{2039}'
        | '\u{203A}' => 333,
        '\u{00AC}' | '\u{00B1}' | '\u{00D7}' | '\u{00F7}' => 584,
        '\u{00BF}' => 611,
        '\u{00DF}' | '\u{00F8}' => 611,
        _ => 556,
    }
}

/// Folds accented Latin letters onto their unaccented ASCII base.
fn fold_latin_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'Þ' => 'P',
        'Š' => 'S',
        'Ž' => 'Z',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ð' => 'o',
        'ñ' => 'n',
        'ò'..='ö' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'þ' => 'p',
        'š' => 's',
        'ž' => 'z',
        'ƒ' => 'f',
        _ => return None,
    };
    Some(base)
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn font_name(face: &ttf_parser::Face<'_>, path: &Path) -> String {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut full = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => {
                family.get_or_insert(name);
            }
            name_id::FULL_NAME => {
                full.get_or_insert(name);
            }
            name_id::POST_SCRIPT_NAME => {
                post.get_or_insert(name);
            }
            _ => {}
        }
    }
    let stem = path
        .file_stem()
        .and_then(|v| v.to_str())
        .map(|v| v.to_string());
    post.or(full)
        .or(family)
        .or(stem)
        .unwrap_or_else(|| "EmbeddedFont".to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const DEJAVU_DIRS: [&str; 3] = [
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/dejavu",
        "/usr/share/fonts/TTF",
    ];

    /// DejaVu Sans regular/bold from the system font directory, when present.
    pub(crate) fn system_truetype_paths() -> Option<(PathBuf, PathBuf)> {
        DEJAVU_DIRS.iter().find_map(|dir| {
            let regular = Path::new(dir).join("DejaVuSans.ttf");
            let bold = Path::new(dir).join("DejaVuSans-Bold.ttf");
            (regular.is_file() && bold.is_file()).then_some((regular, bold))
        })
    }

    #[test]
    fn winansi_round_trips_extension_range() {
        for (ch, byte) in WINANSI_EXTENSIONS {
            assert_eq!(encode_winansi(ch), Some(byte));
            assert_eq!(decode_winansi(byte), Some(ch));
        }
        assert_eq!(encode_winansi('ç'), Some(0xE7));
        assert_eq!(encode_winansi('\u{2611}'), None);
    }

    #[test]
    fn standard_widths_follow_helvetica_afm() {
        let registry = FontRegistry::load(&FontPair::standard()).unwrap();
        let size = Pt::from_f32(10.0);
        // "Hi" = 722 + 222 in regular, 722 + 278 in bold.
        assert_eq!(
            registry.measure_text_width(FontId::Regular, size, "Hi"),
            Pt::from_f32(9.44)
        );
        assert_eq!(
            registry.measure_text_width(FontId::Bold, size, "Hi"),
            Pt::from_f32(10.0)
        );
    }

    #[test]
    fn unencodable_characters_measure_as_question_mark() {
        let registry = FontRegistry::load(&FontPair::standard()).unwrap();
        let size = Pt::from_f32(12.0);
        assert_eq!(
            registry.measure_text_width(FontId::Regular, size, "\u{2611}"),
            registry.measure_text_width(FontId::Regular, size, "?")
        );
    }

    #[test]
    fn accented_letters_use_base_widths() {
        let registry = FontRegistry::load(&FontPair::standard()).unwrap();
        let size = Pt::from_f32(11.0);
        assert_eq!(
            registry.measure_text_width(FontId::Regular, size, "Descrição"),
            registry.measure_text_width(FontId::Regular, size, "Descricao")
        );
    }

    #[test]
    fn line_height_uses_ascent_descent_and_gap() {
        let registry = FontRegistry::load(&FontPair::standard()).unwrap();
        assert_eq!(
            registry.line_height(FontId::Regular, Pt::from_f32(10.0)),
            Pt::from_f32(11.56)
        );
    }

    #[test]
    fn missing_font_file_is_reported() {
        let pair = FontPair::from_files("/nonexistent/Roboto-Regular.ttf", "/nonexistent/b.ttf");
        let err = FontRegistry::load(&pair).unwrap_err();
        assert!(matches!(err, ReportError::MissingFont(_)));
        assert!(err.to_string().contains("Roboto-Regular.ttf"));
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let pair = FontPair::from_bytes(vec![0u8; 16], vec![0u8; 16]);
        let err = FontRegistry::load(&pair).unwrap_err();
        assert!(matches!(err, ReportError::InvalidFont(_)));
    }

    #[test]
    fn truetype_metrics_come_from_the_face() {
        let Some((regular_path, bold_path)) = system_truetype_paths() else {
            eprintln!("skipping: DejaVu Sans not installed");
            return;
        };
        let registry = FontRegistry::load(&FontPair::from_files(&regular_path, &bold_path)).unwrap();
        let regular = registry.font(FontId::Regular);
        assert_eq!(regular.program_kind, FontProgramKind::TrueType);
        assert_eq!(regular.data.as_deref().map(<[u8]>::len), Some(fs::metadata(&regular_path).unwrap().len() as usize));
        assert!(regular.name.contains("DejaVu"));

        let data = fs::read(&regular_path).unwrap();
        let face = ttf_parser::Face::parse(&data, 0).unwrap();
        let scale = 1000.0 / face.units_per_em() as f32;
        let advance = face
            .glyph_index('W')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap();
        let expected = (advance as f32 * scale).round() as i32;
        assert_eq!(regular.metrics.widths[(b'W' - 32) as usize] as i32, expected);

        let size = Pt::from_f32(10.0);
        assert_eq!(
            registry.measure_text_width(FontId::Regular, size, "W"),
            size.mul_ratio(expected, 1000)
        );
        let standard = FontRegistry::load(&FontPair::standard()).unwrap();
        assert_ne!(
            registry.measure_text_width(FontId::Regular, size, "Relatório"),
            standard.measure_text_width(FontId::Regular, size, "Relatório")
        );
        let ascent = (face.ascender() as f32 * scale).round() as i32;
        assert_eq!(registry.ascent(FontId::Regular, size), size.mul_ratio(ascent, 1000));
        assert!(
            registry.measure_text_width(FontId::Bold, size, "Extintores")
                > registry.measure_text_width(FontId::Regular, size, "Extintores")
        );
    }
}
