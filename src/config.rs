/// Every user-visible string painted into a report. Defaults to pt-BR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub number_prefix: String,
    pub date: String,
    pub status: String,
    pub status_draft: String,
    pub status_final: String,
    pub description_title: String,
    pub checklist_title: String,
    pub photos_title: String,
    pub photos_continued_title: String,
    pub general_notes_title: String,
    pub conclusion_title: String,
    pub recommendations_title: String,
    pub note_prefix: String,
    pub photo: String,
    pub image_unavailable: String,
    pub image_error: String,
    pub generated_at: String,
    pub time_separator: String,
    pub page: String,
    pub page_of: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            number_prefix: "Nº:".to_string(),
            date: "Data:".to_string(),
            status: "Status:".to_string(),
            status_draft: "Pendente".to_string(),
            status_final: "Finalizado".to_string(),
            description_title: "Descrição do Relatório".to_string(),
            checklist_title: "Itens do Relatório".to_string(),
            photos_title: "Fotos do Relatório".to_string(),
            photos_continued_title: "Fotos do Relatório (continuação)".to_string(),
            general_notes_title: "Observações Gerais".to_string(),
            conclusion_title: "Conclusão / Parecer Técnico".to_string(),
            recommendations_title: "Recomendações Finais".to_string(),
            note_prefix: "Obs:".to_string(),
            photo: "Foto".to_string(),
            image_unavailable: "[Imagem indisponível]".to_string(),
            image_error: "[Erro ao carregar imagem]".to_string(),
            generated_at: "Gerado em".to_string(),
            time_separator: "às".to_string(),
            page: "Página".to_string(),
            page_of: "de".to_string(),
        }
    }
}

impl Labels {
    pub fn portuguese() -> Self {
        Self::default()
    }

    pub fn english() -> Self {
        Self {
            number_prefix: "No.:".to_string(),
            date: "Date:".to_string(),
            status: "Status:".to_string(),
            status_draft: "Draft".to_string(),
            status_final: "Final".to_string(),
            description_title: "Report Description".to_string(),
            checklist_title: "Report Items".to_string(),
            photos_title: "Report Photos".to_string(),
            photos_continued_title: "Report Photos (continued)".to_string(),
            general_notes_title: "General Notes".to_string(),
            conclusion_title: "Conclusion / Technical Opinion".to_string(),
            recommendations_title: "Final Recommendations".to_string(),
            note_prefix: "Note:".to_string(),
            photo: "Photo".to_string(),
            image_unavailable: "(image unavailable)".to_string(),
            image_error: "(image could not be loaded)".to_string(),
            generated_at: "Generated on".to_string(),
            time_separator: "at".to_string(),
            page: "Page".to_string(),
            page_of: "of".to_string(),
        }
    }

    pub(crate) fn photo_legend(&self, index: usize, name: &str) -> String {
        format!("{} {} \u{2014} {}", self.photo, index + 1, name)
    }

    pub(crate) fn footer_line(&self, date: &str, time: &str, page: usize, pages: usize) -> String {
        format!(
            "{} {} {} {} - {} {} {} {}",
            self.generated_at, date, self.time_separator, time, self.page, page, self.page_of, pages
        )
    }
}
