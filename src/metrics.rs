#[derive(Debug, Clone, Default)]
pub struct PhotoMetrics {
    pub resolved: usize,
    pub missing: usize,
    pub undecodable: usize,
    pub fetch_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReportMetrics {
    pub pages: usize,
    pub page_breaks: usize,
    pub photos: PhotoMetrics,
    pub layout_ms: f64,
    pub pdf_ms: f64,
    pub total_bytes: usize,
}

impl ReportMetrics {
    pub(crate) fn to_json(&self) -> String {
        format!(
            "{{\"type\":\"report.metrics\",\"pages\":{},\"page_breaks\":{},\"photos_resolved\":{},\"photos_missing\":{},\"photos_undecodable\":{},\"fetch_ms\":{:.3},\"layout_ms\":{:.3},\"pdf_ms\":{:.3},\"total_bytes\":{}}}",
            self.pages,
            self.page_breaks,
            self.photos.resolved,
            self.photos.missing,
            self.photos.undecodable,
            self.photos.fetch_ms,
            self.layout_ms,
            self.pdf_ms,
            self.total_bytes
        )
    }
}
