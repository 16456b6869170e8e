//! Minimal PDF 1.4 writer for activity reports.
//!
//! Text uses the standard Helvetica faces with WinAnsiEncoding, so no font
//! embedding is needed. The chart is embedded as a DeviceRGB image XObject.
//! Every stream is Flate-compressed.

use super::{
    CHART_FAILED_NOTICE, ChartImage, ChartSection, DocumentRenderer, NO_EVENTS_NOTICE,
    ReportBody, ReportDocument, ReportSummary,
};
use crate::error::RenderError;
use crate::models::LogEntry;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::fmt::Write as _;
use std::io::Write as _;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const IMAGE_NAME: &str = "Im1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Page-by-page content stream builder with a top-down cursor.
struct Layout {
    pages: Vec<String>,
    current: String,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, font: Font, size: f32, text: &str) {
        let leading = size * 1.4;
        self.ensure(leading);
        self.y -= leading;
        let line = fit(text, size);
        // Writing into a String cannot fail.
        let _ = writeln!(
            self.current,
            "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            size,
            MARGIN,
            self.y,
            escape(&line)
        );
    }

    fn heading(&mut self, text: &str) {
        self.gap(8.0);
        // Keep a heading on the same page as at least one following line.
        self.ensure(14.0 * 1.4 + 10.0 * 1.4);
        self.text(Font::Bold, 14.0, text);
    }

    fn image(&mut self, width: f32, height: f32) {
        self.ensure(height);
        self.y -= height;
        let _ = writeln!(
            self.current,
            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{} Do Q",
            width, height, MARGIN, self.y, IMAGE_NAME
        );
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Truncate to what fits on one line; Helvetica averages about half an em.
fn fit(text: &str, size: f32) -> String {
    let max_chars = (CONTENT_WIDTH / (size * 0.5)) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// WinAnsiEncoding code for `c`, when the standard fonts can draw it.
fn win_ansi(c: char) -> Option<u8> {
    let code = match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '\u{20ac}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        _ => return None,
    };
    Some(code)
}

/// PDF literal string escaping. Codes above ASCII are written as octal
/// escapes; characters outside WinAnsi become `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match (c, win_ansi(c)) {
            ('\\' | '(' | ')', _) => {
                out.push('\\');
                out.push(c);
            }
            (_, Some(code)) if code.is_ascii() => out.push(c),
            (_, Some(code)) => {
                let _ = write!(out, "\\{:03o}", code);
            }
            (_, None) => out.push('?'),
        }
    }
    out
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_entry(entry: &LogEntry) -> String {
    let payload = serde_json::to_string(&entry.payload).unwrap_or_default();
    format!(
        "{}  {}  [{}]  {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.event_type,
        entry.service,
        payload
    )
}

/// Object store that tracks byte offsets for the xref table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, id: usize, body: &str) {
        self.begin(id);
        self.buf.extend_from_slice(body.as_bytes());
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    /// Writes `data` deflated, with `/Filter /FlateDecode` appended to `dict`.
    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) -> Result<(), RenderError> {
        let compressed = deflate(data)?;
        self.begin(id);
        let dict = if dict.is_empty() {
            "/Filter /FlateDecode".to_string()
        } else {
            format!("{} /Filter /FlateDecode", dict)
        };
        self.buf.extend_from_slice(
            format!("<< {} /Length {} >>\nstream\n", dict, compressed.len()).as_bytes(),
        );
        self.buf.extend_from_slice(&compressed);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        Ok(())
    }

    fn begin(&mut self, id: usize) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.buf.len());
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref = self.buf.len();
        let size = self.offsets.len() + 1;
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for offset in &self.offsets {
            let _ = writeln!(table, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, root, info, xref
        );
        self.buf.extend_from_slice(table.as_bytes());
        self.buf
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RenderError::Document(format!("deflate: {e}")))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Document(format!("deflate: {e}")))
}

/// Built-in [`DocumentRenderer`] producing `application/pdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentRenderer;

impl PdfDocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    fn layout(&self, document: &ReportDocument) -> Vec<String> {
        let mut layout = Layout::new();

        layout.text(Font::Bold, 20.0, "Events Report");
        layout.text(
            Font::Regular,
            10.0,
            &format!("Generated: {}", format_instant(&document.generated_at)),
        );

        layout.heading("Date Range");
        let from = document
            .range
            .from
            .as_ref()
            .map(format_instant)
            .unwrap_or_else(|| "Beginning".to_string());
        let to = document
            .range
            .to
            .as_ref()
            .map(format_instant)
            .unwrap_or_else(|| "Now".to_string());
        layout.text(Font::Regular, 10.0, &format!("From: {}", from));
        layout.text(Font::Regular, 10.0, &format!("To: {}", to));

        match &document.body {
            ReportBody::Empty => {
                layout.gap(12.0);
                layout.text(Font::Regular, 12.0, NO_EVENTS_NOTICE);
            }
            ReportBody::Summary(summary) => self.layout_summary(&mut layout, summary),
        }

        layout.finish()
    }

    fn layout_summary(&self, layout: &mut Layout, summary: &ReportSummary) {
        match &summary.chart {
            ChartSection::Rendered(chart) => {
                layout.heading(&chart.title);
                let height = CONTENT_WIDTH * chart.height as f32 / chart.width.max(1) as f32;
                layout.image(CONTENT_WIDTH, height);
                layout.text(
                    Font::Regular,
                    8.0,
                    &format!(
                        "{} to {}, peak {} events per bucket",
                        chart.first_label, chart.last_label, chart.peak
                    ),
                );
            }
            ChartSection::Failed(reason) => {
                layout.heading("Events Over Time");
                layout.text(Font::Regular, 10.0, CHART_FAILED_NOTICE);
                if !reason.is_empty() {
                    layout.text(Font::Regular, 8.0, reason);
                }
            }
        }

        layout.heading("Summary Statistics");
        layout.text(Font::Regular, 10.0, &format!("Total Events: {}", summary.total));
        layout.text(
            Font::Regular,
            10.0,
            &format!("Event Types: {}", summary.by_type.len()),
        );

        layout.heading("Events by Type");
        for type_count in &summary.by_type {
            layout.text(
                Font::Regular,
                10.0,
                &format!("{}: {}", type_count.event_type, type_count.count),
            );
        }

        layout.heading("Recent Events");
        for entry in &summary.recent {
            layout.text(Font::Regular, 8.0, &format_entry(entry));
        }
        if summary.omitted > 0 {
            layout.text(
                Font::Regular,
                9.0,
                &format!("... and {} more events", summary.omitted),
            );
        }
    }
}

fn chart_image(document: &ReportDocument) -> Option<&ChartImage> {
    match &document.body {
        ReportBody::Summary(ReportSummary {
            chart: ChartSection::Rendered(image),
            ..
        }) => Some(image),
        _ => None,
    }
}

impl DocumentRenderer for PdfDocumentRenderer {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
        let image = chart_image(document);
        if let Some(image) = image {
            let expected = image.width as usize * image.height as usize * 3;
            if image.pixels.len() != expected {
                return Err(RenderError::Document(format!(
                    "chart has {} bytes, expected {} for {}x{} RGB",
                    image.pixels.len(),
                    expected,
                    image.width,
                    image.height
                )));
            }
        }

        let pages = self.layout(document);

        // 1 catalog, 2 page tree, 3-4 fonts, 5 info, 6 image (optional), then
        // a page object and its content stream per page.
        let image_id = image.map(|_| 6);
        let first_page = if image_id.is_some() { 7 } else { 6 };
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page + i * 2).collect();

        let mut pdf = PdfWriter::new();
        pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        pdf.object(
            2,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                page_ids.len()
            ),
        );
        pdf.object(
            3,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        pdf.object(
            4,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );
        pdf.object(
            5,
            &format!(
                "<< /Title (Events Report) /Producer (journal) /CreationDate (D:{}Z) >>",
                document.generated_at.format("%Y%m%d%H%M%S")
            ),
        );

        if let (Some(id), Some(image)) = (image_id, image) {
            pdf.stream(
                id,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8",
                    image.width, image.height
                ),
                &image.pixels,
            )?;
        }

        let xobjects = image_id
            .map(|id| format!(" /XObject << /{} {} 0 R >>", IMAGE_NAME, id))
            .unwrap_or_default();
        for (content, page_id) in pages.iter().zip(&page_ids) {
            pdf.object(
                *page_id,
                &format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >>{} >> /Contents {} 0 R >>",
                    PAGE_WIDTH,
                    PAGE_HEIGHT,
                    xobjects,
                    page_id + 1
                ),
            );
            pdf.stream(page_id + 1, "", content.as_bytes())?;
        }

        Ok(pdf.finish(1, 5))
    }
}

/// The document as text with every Flate stream inflated in place, for
/// asserting on rendered strings.
#[cfg(test)]
pub(crate) fn decoded_text(bytes: &[u8]) -> String {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    const OPEN: &[u8] = b">>\nstream\n";
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while let Some(found) = find(&bytes[pos..], OPEN) {
        let data_at = pos + found + OPEN.len();
        let header = String::from_utf8_lossy(&bytes[pos..pos + found]);
        let length: usize = header
            .rsplit("/Length ")
            .next()
            .and_then(|tail| tail.split_whitespace().next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        out.extend_from_slice(&bytes[pos..data_at]);
        let data = &bytes[data_at..data_at + length];
        let mut inflated = Vec::new();
        match ZlibDecoder::new(data).read_to_end(&mut inflated) {
            Ok(_) => out.extend_from_slice(&inflated),
            Err(_) => out.extend_from_slice(data),
        }
        pos = data_at + length;
    }
    out.extend_from_slice(&bytes[pos..]);
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
