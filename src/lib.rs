mod assembler;
mod canvas;
mod checklist;
mod config;
mod cursor;
mod debug;
mod draw;
mod error;
mod font;
mod footer;
mod header;
mod images;
mod metrics;
mod model;
mod pdf;
mod photo_grid;
mod sections;
mod text;
mod types;

use assembler::Assembler;
pub use canvas::{Command, Document, Page};
pub use config::Labels;
use cursor::{LayoutContext, PageGeometry};
pub use cursor::LayoutCursor;
use debug::{DebugLogger, DebugRun};
pub use error::ReportError;
pub use font::{FontId, FontPair, FontSource, StandardFont};
use font::FontRegistry;
pub use images::{DefaultPhotoFetcher, PhotoFetcher};
use images::{ImageData, PhotoData, ResolvedPhoto};
pub use metrics::{PhotoMetrics, ReportMetrics};
pub use model::{
    ChecklistItem, Photo, PhotoSource, ReportDocument, ReportStatus, suggested_file_name,
};
use pdf::PdfInfo;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
pub use types::{Color, Margins, Pt, Rect, Size};

const DEFAULT_FETCH_CONCURRENCY: usize = 4;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_FOOTER_RESERVE: f32 = 50.0;

/// A configured report generator. One instance may serve many threads.
pub struct ReportPdf {
    geometry: PageGeometry,
    fonts: Arc<FontRegistry>,
    labels: Labels,
    fetcher: Arc<dyn PhotoFetcher>,
    pool: rayon::ThreadPool,
    generated_at: Option<OffsetDateTime>,
    debug: Option<Arc<DebugLogger>>,
}

pub struct ReportPdfBuilder {
    fonts: FontPair,
    page_size: Size,
    margins: Margins,
    footer_reserve: Pt,
    fetch_concurrency: usize,
    fetch_timeout: Duration,
    fetcher: Option<Arc<dyn PhotoFetcher>>,
    photo_root: Option<std::path::PathBuf>,
    labels: Labels,
    generated_at: Option<OffsetDateTime>,
    debug_path: Option<std::path::PathBuf>,
}

impl Default for ReportPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPdfBuilder {
    pub fn new() -> Self {
        Self {
            fonts: FontPair::standard(),
            page_size: Size::a4(),
            margins: Margins::all(50.0),
            footer_reserve: Pt::from_f32(DEFAULT_FOOTER_RESERVE),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fetcher: None,
            photo_root: None,
            labels: Labels::default(),
            generated_at: None,
            debug_path: None,
        }
    }

    pub fn fonts(mut self, fonts: FontPair) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn footer_reserve(mut self, reserve: Pt) -> Self {
        self.footer_reserve = reserve;
        self
    }

    pub fn fetch_concurrency(mut self, workers: usize) -> Self {
        self.fetch_concurrency = workers;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn PhotoFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Lets the default fetcher read photo paths inside `dir`. Without it
    /// only `http(s)://` and `data:` locations are fetched.
    pub fn photo_root(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.photo_root = Some(dir.into());
        self
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Pins the footer timestamp. Without it the current UTC time is used.
    pub fn generated_at(mut self, at: OffsetDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn debug_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ReportPdf, ReportError> {
        if self.fetch_concurrency == 0 {
            return Err(ReportError::InvalidConfiguration(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        if self.footer_reserve < Pt::ZERO {
            return Err(ReportError::InvalidConfiguration(
                "footer_reserve must not be negative".to_string(),
            ));
        }
        let geometry = PageGeometry {
            page_size: self.page_size,
            margins: self.margins,
            footer_reserve: self.footer_reserve,
        };
        if geometry.content_width() <= Pt::ZERO {
            return Err(ReportError::InvalidConfiguration(
                "horizontal margins leave no content width".to_string(),
            ));
        }
        if geometry.available_below(self.margins.top) <= Pt::ZERO {
            return Err(ReportError::InvalidConfiguration(
                "vertical margins and footer reserve leave no content height".to_string(),
            ));
        }
        let fonts = FontRegistry::load(&self.fonts)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.fetch_concurrency)
            .thread_name(|index| format!("relatorio-fetch-{}", index))
            .build()
            .map_err(|err| ReportError::InvalidConfiguration(err.to_string()))?;
        let fetcher: Arc<dyn PhotoFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let mut default = DefaultPhotoFetcher::new(self.fetch_timeout);
                if let Some(root) = &self.photo_root {
                    default = default.with_root(root)?;
                }
                Arc::new(default)
            }
        };
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        Ok(ReportPdf {
            geometry,
            fonts: Arc::new(fonts),
            labels: self.labels,
            fetcher,
            pool,
            generated_at: self.generated_at,
            debug,
        })
    }
}

impl ReportPdf {
    pub fn builder() -> ReportPdfBuilder {
        ReportPdfBuilder::new()
    }

    pub fn generate(&self, document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
        self.generate_with_metrics(document).map(|(bytes, _)| bytes)
    }

    pub fn generate_with_metrics(
        &self,
        document: &ReportDocument,
    ) -> Result<(Vec<u8>, ReportMetrics), ReportError> {
        document.validate()?;
        let generated_at = self.timestamp();
        let run = self.debug.as_deref().map(|logger| logger.run(&document.id));
        let mut metrics = ReportMetrics::default();

        let fetch_start = Instant::now();
        let photos = self.resolve(document, run.as_ref());
        metrics.photos.fetch_ms = fetch_start.elapsed().as_secs_f64() * 1000.0;
        for photo in &photos {
            match photo.data {
                PhotoData::Ready { .. } => metrics.photos.resolved += 1,
                PhotoData::Missing => metrics.photos.missing += 1,
                PhotoData::Undecodable => metrics.photos.undecodable += 1,
            }
        }

        let layout_start = Instant::now();
        let layout = self.layout_resolved(document, &photos, generated_at, run.as_ref())?;
        metrics.layout_ms = layout_start.elapsed().as_secs_f64() * 1000.0;
        metrics.pages = layout.pages.len();
        metrics.page_breaks = layout.pages.len().saturating_sub(1);

        let pdf_start = Instant::now();
        let images: BTreeMap<&str, &ImageData> = photos
            .iter()
            .filter_map(|photo| match &photo.data {
                PhotoData::Ready { resource_id, image } => Some((resource_id.as_str(), image)),
                _ => None,
            })
            .collect();
        let info = PdfInfo {
            title: document.title.trim(),
            created_at: generated_at,
        };
        let bytes = pdf::document_to_pdf(&layout, &self.fonts, &images, &info);
        metrics.pdf_ms = pdf_start.elapsed().as_secs_f64() * 1000.0;
        metrics.total_bytes = bytes.len();

        log::info!(
            "report {} rendered: {} page(s), {} bytes",
            document.id,
            metrics.pages,
            metrics.total_bytes
        );
        if let Some(run) = run {
            run.log_json(&metrics.to_json());
            run.finish();
        }
        Ok((bytes, metrics))
    }

    /// Runs the layout pass only and returns the recorded pages.
    pub fn layout(&self, document: &ReportDocument) -> Result<Document, ReportError> {
        document.validate()?;
        let run = self.debug.as_deref().map(|logger| logger.run(&document.id));
        let photos = self.resolve(document, run.as_ref());
        let layout = self.layout_resolved(document, &photos, self.timestamp(), run.as_ref())?;
        if let Some(run) = run {
            run.finish();
        }
        Ok(layout)
    }

    fn timestamp(&self) -> OffsetDateTime {
        self.generated_at.unwrap_or_else(OffsetDateTime::now_utc)
    }

    fn resolve(
        &self,
        document: &ReportDocument,
        run: Option<&DebugRun<'_>>,
    ) -> Vec<ResolvedPhoto> {
        images::resolve_photos(&document.photos, self.fetcher.as_ref(), &self.pool, run)
    }

    fn layout_resolved(
        &self,
        document: &ReportDocument,
        photos: &[ResolvedPhoto],
        generated_at: OffsetDateTime,
        run: Option<&DebugRun<'_>>,
    ) -> Result<Document, ReportError> {
        let ctx = LayoutContext {
            document,
            fonts: &self.fonts,
            labels: &self.labels,
            geometry: self.geometry,
            debug: run,
            body_top: self.geometry.margins.top,
        };
        Assembler::new(ctx, photos, generated_at).run()
    }
}

pub fn generate(document: &ReportDocument, fonts: FontPair) -> Result<Vec<u8>, ReportError> {
    ReportPdf::builder().fonts(fonts).build()?.generate(document)
}
