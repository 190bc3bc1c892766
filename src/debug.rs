use crate::types::Pt;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSONL sink shared by every generation of one `ReportPdf`. Lines from
/// concurrent runs interleave but never tear; counters live in [`DebugRun`].
#[derive(Clone)]
pub(crate) struct DebugLogger {
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn log_json(&self, json: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{json}");
        }
    }

    pub fn run(&self, context: &str) -> DebugRun<'_> {
        DebugRun {
            logger: self,
            context: context.to_string(),
            counters: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

// Events and counters of one generation. Never shared between runs.
pub(crate) struct DebugRun<'a> {
    logger: &'a DebugLogger,
    context: String,
    counters: Mutex<BTreeMap<String, u64>>,
}

impl DebugRun<'_> {
    pub fn log_json(&self, json: &str) {
        self.logger.log_json(json);
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut counters) = self.counters.lock() {
            let entry = counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    pub fn page_break(&self, block: &str, from_page: usize, needed: Pt, available: Pt) {
        self.log_json(&format!(
            "{{\"type\":\"report.page_break\",\"context\":\"{}\",\"block\":\"{}\",\"from\":{},\"to\":{},\"needed\":{},\"available\":{}}}",
            json_escape(&self.context),
            json_escape(block),
            from_page,
            from_page + 1,
            needed.to_milli_i64(),
            available.to_milli_i64()
        ));
        self.increment("report.page_break", 1);
    }

    pub fn photo_unavailable(&self, index: usize, name: &str, reason: &str) {
        self.log_json(&format!(
            "{{\"type\":\"report.photo_unavailable\",\"context\":\"{}\",\"index\":{},\"name\":\"{}\",\"reason\":\"{}\"}}",
            json_escape(&self.context),
            index,
            json_escape(name),
            json_escape(reason)
        ));
        self.increment("report.photo_unavailable", 1);
    }

    /// Writes the counters of this run and flushes the sink.
    pub fn finish(self) {
        let counters = self.counters.into_inner().unwrap_or_default();
        let mut counts_json = String::from("{");
        for (idx, (key, value)) in counters.iter().enumerate() {
            if idx > 0 {
                counts_json.push(',');
            }
            counts_json.push_str(&format!("\"{}\":{}", json_escape(key), value));
        }
        counts_json.push('}');
        self.logger.log_json(&format!(
            "{{\"type\":\"debug.summary\",\"context\":\"{}\",\"counts\":{}}}",
            json_escape(&self.context),
            counts_json
        ));
        self.logger.flush();
    }
}

pub(crate) fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("relatorio_{}_{}.jsonl", name, std::process::id()))
    }

    #[test]
    fn summary_counts_only_its_own_run() {
        let path = temp_log_path("debug_summary");
        let logger = DebugLogger::new(&path).unwrap();
        let first = logger.run("rel-1");
        let second = logger.run("rel-2");
        first.page_break("checklist.item", 1, Pt::from_f32(80.0), Pt::from_f32(12.5));
        first.photo_unavailable(2, "telhado \"norte\"", "timeout");
        second.finish();
        first.finish();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("\"type\":\"report.page_break\",\"context\":\"rel-1\""));
        assert!(lines[0].contains("\"needed\":80000"));
        assert!(lines[1].contains("telhado \\\"norte\\\""));
        assert!(lines[2].contains("\"context\":\"rel-2\",\"counts\":{}"));
        assert!(lines[3].contains(
            "\"context\":\"rel-1\",\"counts\":{\"report.page_break\":1,\"report.photo_unavailable\":1}"
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(json_escape("a\u{1}b\n"), "a\\u0001b\\n");
    }
}
