use crate::error::ReportError;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStatus {
    #[default]
    Draft,
    Final,
}

/// The report being rendered. Nothing here is mutated during generation.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub id: String,
    pub title: String,
    pub report_number: Option<String>,
    pub date: OffsetDateTime,
    pub status: ReportStatus,
    pub description: Option<String>,
    pub general_notes: Option<String>,
    pub conclusion: Option<String>,
    pub recommendations: Option<String>,
    pub items: Vec<ChecklistItem>,
    pub photos: Vec<Photo>,
}

impl ReportDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            report_number: None,
            date,
            status: ReportStatus::Draft,
            description: None,
            general_notes: None,
            conclusion: None,
            recommendations: None,
            items: Vec::new(),
            photos: Vec::new(),
        }
    }

    /// Rejects documents the layout cannot render: a blank title, an item
    /// without description, or items/photos owned by a different report.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.title.trim().is_empty() {
            return Err(ReportError::InvalidDocument(
                "report title must not be blank".to_string(),
            ));
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                return Err(ReportError::InvalidDocument(format!(
                    "checklist item #{} has an empty description",
                    index + 1
                )));
            }
            check_owner("checklist item", index, &self.id, item.report_id.as_deref())?;
        }
        for (index, photo) in self.photos.iter().enumerate() {
            check_owner("photo", index, &self.id, photo.report_id.as_deref())?;
        }
        Ok(())
    }
}

fn check_owner(
    entity: &'static str,
    index: usize,
    expected: &str,
    found: Option<&str>,
) -> Result<(), ReportError> {
    match found {
        Some(found) if found != expected => Err(ReportError::IntegrityViolation {
            entity,
            index,
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    pub description: String,
    pub completed: bool,
    pub note: Option<String>,
    /// Parent report reference, checked against [`ReportDocument::id`].
    pub report_id: Option<String>,
}

impl ChecklistItem {
    pub fn new(description: impl Into<String>, completed: bool) -> Self {
        Self {
            description: description.into(),
            completed,
            note: None,
            report_id: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn for_report(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhotoSource {
    Bytes(Vec<u8>),
    /// `http(s)://` URL, `data:` URI or local file path.
    Url(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub name: String,
    pub source: PhotoSource,
    pub report_id: Option<String>,
}

impl Photo {
    pub fn new(name: impl Into<String>, source: PhotoSource) -> Self {
        Self {
            name: name.into(),
            source,
            report_id: None,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, PhotoSource::Bytes(bytes))
    }

    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, PhotoSource::Url(url.into()))
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self::new(name, PhotoSource::Missing)
    }

    pub fn for_report(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }
}

/// Returns the trimmed text when it has any visible content.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

/// File name for downloads: `relatorio-{title}.pdf` with every character
/// outside `[A-Za-z0-9]` replaced by `_`.
pub fn suggested_file_name(document: &ReportDocument) -> String {
    let stem: String = document
        .title
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    format!("relatorio-{}.pdf", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn document() -> ReportDocument {
        ReportDocument::new("rel-1", "Inspeção Predial", datetime!(2024-01-01 0:00 UTC))
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut doc = document();
        doc.title = "   ".to_string();
        assert!(matches!(
            doc.validate(),
            Err(ReportError::InvalidDocument(_))
        ));
    }

    #[test]
    fn empty_item_description_is_rejected() {
        let mut doc = document();
        doc.items.push(ChecklistItem::new("Quadro", true));
        doc.items.push(ChecklistItem::new(" ", false));
        let err = doc.validate().unwrap_err();
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn foreign_items_violate_integrity() {
        let mut doc = document();
        doc.items
            .push(ChecklistItem::new("Quadro", true).for_report("rel-1"));
        doc.photos
            .push(Photo::missing("fachada").for_report("rel-2"));
        match doc.validate() {
            Err(ReportError::IntegrityViolation {
                entity,
                index,
                expected,
                found,
            }) => {
                assert_eq!(entity, "photo");
                assert_eq!(index, 0);
                assert_eq!(expected, "rel-1");
                assert_eq!(found, "rel-2");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unowned_entries_are_accepted() {
        let mut doc = document();
        doc.items.push(ChecklistItem::new("Quadro", false));
        doc.photos.push(Photo::missing("fachada"));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn file_name_replaces_non_alphanumerics() {
        assert_eq!(
            suggested_file_name(&document()),
            "relatorio-Inspe__o_Predial.pdf"
        );
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  texto \n")), Some("texto"));
        assert_eq!(non_blank(Some(" \t ")), None);
        assert_eq!(non_blank(None), None);
    }
}
