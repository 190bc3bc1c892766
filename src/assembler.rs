use crate::canvas::{Canvas, Document};
use crate::checklist;
use crate::cursor::{LayoutContext, LayoutCursor};
use crate::error::ReportError;
use crate::footer;
use crate::header;
use crate::images::ResolvedPhoto;
use crate::model::non_blank;
use crate::photo_grid;
use crate::sections;
use crate::types::Pt;
use time::OffsetDateTime;

const GENERAL_NOTES_GAP: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssemblerState {
    NotStarted,
    Paginating,
    Finalizing,
    Done,
}

/// Drives one layout pass over one document. Each transition runs once and
/// in order; anything else is rejected with [`ReportError::InvalidState`].
pub(crate) struct Assembler<'a> {
    ctx: LayoutContext<'a>,
    photos: &'a [ResolvedPhoto],
    generated_at: OffsetDateTime,
    state: AssemblerState,
    canvas: Canvas,
    cursor: LayoutCursor,
}

impl<'a> Assembler<'a> {
    pub(crate) fn new(
        ctx: LayoutContext<'a>,
        photos: &'a [ResolvedPhoto],
        generated_at: OffsetDateTime,
    ) -> Self {
        let canvas = Canvas::new(ctx.geometry.page_size);
        let cursor = LayoutCursor::first_page(ctx.geometry.margins.top);
        Self {
            ctx,
            photos,
            generated_at,
            state: AssemblerState::NotStarted,
            canvas,
            cursor,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> AssemblerState {
        self.state
    }

    fn expect_state(&self, expected: AssemblerState, action: &str) -> Result<(), ReportError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ReportError::InvalidState(format!(
                "cannot {} while {:?}",
                action, self.state
            )))
        }
    }

    /// Opens page 1 and paints its header.
    pub(crate) fn start(&mut self) -> Result<(), ReportError> {
        self.expect_state(AssemblerState::NotStarted, "start")?;
        let body_top = header::draw_header(&self.ctx, &mut self.canvas, self.ctx.geometry.margins.top);
        self.ctx.body_top = body_top;
        self.cursor = LayoutCursor::first_page(body_top);
        self.state = AssemblerState::Paginating;
        Ok(())
    }

    /// Emits every section in document order, then the footer.
    pub(crate) fn paginate(&mut self) -> Result<(), ReportError> {
        self.expect_state(AssemblerState::Paginating, "paginate")?;
        let ctx = &self.ctx;
        let doc = ctx.document;
        let labels = ctx.labels;
        let canvas = &mut self.canvas;

        let mut cursor = self.cursor;
        cursor = sections::draw_text_section(
            ctx,
            canvas,
            cursor,
            &labels.description_title,
            doc.description.as_deref(),
            "section.description",
        );
        cursor = checklist::draw_checklist(ctx, canvas, cursor);
        cursor = photo_grid::draw_photo_grid(ctx, canvas, cursor, self.photos);
        if non_blank(doc.general_notes.as_deref()).is_some() {
            cursor = cursor.down(Pt::from_f32(GENERAL_NOTES_GAP));
        }
        cursor = sections::draw_text_section(
            ctx,
            canvas,
            cursor,
            &labels.general_notes_title,
            doc.general_notes.as_deref(),
            "section.general_notes",
        );
        cursor = sections::draw_text_section(
            ctx,
            canvas,
            cursor,
            &labels.conclusion_title,
            doc.conclusion.as_deref(),
            "section.conclusion",
        );
        cursor = sections::draw_text_section(
            ctx,
            canvas,
            cursor,
            &labels.recommendations_title,
            doc.recommendations.as_deref(),
            "section.recommendations",
        );
        self.cursor = cursor;
        self.state = AssemblerState::Finalizing;

        if footer::should_draw_footer(ctx, cursor) {
            let pages = canvas.page_number();
            footer::draw_footer(ctx, canvas, self.generated_at, pages, pages);
        }
        Ok(())
    }

    /// Closes the last page and hands over the recorded pages.
    pub(crate) fn finish(&mut self) -> Result<Document, ReportError> {
        self.expect_state(AssemblerState::Finalizing, "finish")?;
        self.state = AssemblerState::Done;
        let canvas = std::mem::replace(&mut self.canvas, Canvas::new(self.ctx.geometry.page_size));
        Ok(canvas.finish())
    }

    pub(crate) fn run(mut self) -> Result<Document, ReportError> {
        self.start()?;
        self.paginate()?;
        self.finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Labels;
    use crate::cursor::tests::{a4_geometry, sample_document};
    use crate::font::{FontPair, FontRegistry};
    use crate::model::{ChecklistItem, ReportDocument};
    use time::macros::datetime;

    pub(crate) fn compose(document: &ReportDocument, photos: &[ResolvedPhoto]) -> Document {
        let fonts = FontRegistry::load(&FontPair::standard()).unwrap();
        let labels = Labels::default();
        let ctx = LayoutContext {
            document,
            fonts: &fonts,
            labels: &labels,
            geometry: a4_geometry(),
            debug: None,
            body_top: Pt::ZERO,
        };
        Assembler::new(ctx, photos, datetime!(2024-01-01 12:00 UTC))
            .run()
            .unwrap()
    }

    fn section_order(doc: &Document) -> Vec<String> {
        let titles = [
            "Descrição do Relatório",
            "Itens do Relatório",
            "Fotos do Relatório",
            "Observações Gerais",
            "Conclusão / Parecer Técnico",
            "Recomendações Finais",
        ];
        doc.pages
            .iter()
            .flat_map(|page| page.texts())
            .filter(|text| titles.contains(text))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn transitions_are_ordered_and_single_use() {
        let document = sample_document();
        let fonts = FontRegistry::load(&FontPair::standard()).unwrap();
        let labels = Labels::default();
        let ctx = LayoutContext {
            document: &document,
            fonts: &fonts,
            labels: &labels,
            geometry: a4_geometry(),
            debug: None,
            body_top: Pt::ZERO,
        };
        let mut assembler = Assembler::new(ctx, &[], datetime!(2024-01-01 12:00 UTC));
        assert_eq!(assembler.state(), AssemblerState::NotStarted);
        assert!(matches!(assembler.paginate(), Err(ReportError::InvalidState(_))));
        assert!(matches!(assembler.finish(), Err(ReportError::InvalidState(_))));
        assembler.start().unwrap();
        assert_eq!(assembler.state(), AssemblerState::Paginating);
        assert!(matches!(assembler.start(), Err(ReportError::InvalidState(_))));
        assembler.paginate().unwrap();
        assert_eq!(assembler.state(), AssemblerState::Finalizing);
        let doc = assembler.finish().unwrap();
        assert_eq!(assembler.state(), AssemblerState::Done);
        assert_eq!(doc.pages.len(), 1);
        assert!(matches!(assembler.finish(), Err(ReportError::InvalidState(_))));
    }

    #[test]
    fn sections_follow_fixed_order() {
        let mut document = sample_document();
        document.recommendations = Some("Trocar lâmpadas.".to_string());
        document.conclusion = Some("Apto.".to_string());
        document.general_notes = Some("Sem ocorrências.".to_string());
        document.description = Some("Vistoria anual.".to_string());
        document.items = vec![ChecklistItem::new("Extintores", true)];
        let photos = vec![ResolvedPhoto {
            name: "Fachada".to_string(),
            data: crate::images::PhotoData::Missing,
        }];
        let doc = compose(&document, &photos);
        assert_eq!(
            section_order(&doc),
            vec![
                "Descrição do Relatório",
                "Itens do Relatório",
                "Fotos do Relatório",
                "Observações Gerais",
                "Conclusão / Parecer Técnico",
                "Recomendações Finais",
            ]
        );
    }

    #[test]
    fn footer_is_painted_once_on_the_last_page() {
        let mut document = sample_document();
        document.items = (0..25)
            .map(|i| ChecklistItem::new(format!("Verificação {}", i + 1), true))
            .collect();
        let doc = compose(&document, &[]);
        let n = doc.pages.len();
        assert!(n > 1);
        let footers: Vec<usize> = doc
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.contains_text("Gerado em"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(footers, vec![n - 1]);
        assert!(doc.pages[n - 1].contains_text(&format!("Página {} de {}", n, n)));
    }
}
