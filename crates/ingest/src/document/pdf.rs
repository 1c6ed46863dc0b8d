use super::strategy::{guarded, ExtractionStrategy, StrategyError};
use super::FileKind;

/// Primary PDF parser. Pages come back separated by form feeds; those become
/// paragraph breaks so page boundaries survive into the chunker.
pub struct PdfExtractStrategy;

impl ExtractionStrategy for PdfExtractStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn supports(&self, kind: FileKind) -> bool {
        kind == FileKind::Pdf
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError> {
        // pdf-extract panics on some malformed font tables.
        let text = guarded(|| {
            pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| StrategyError::Parse(e.to_string()))
        })?;

        let pages: Vec<&str> = text
            .split('\x0C')
            .map(str::trim)
            .filter(|page| !page.is_empty())
            .collect();
        Ok(pages.join("\n\n"))
    }
}

/// Secondary PDF parser working page by page, so one broken page does not
/// lose the whole document.
pub struct LopdfStrategy;

impl ExtractionStrategy for LopdfStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn supports(&self, kind: FileKind) -> bool {
        kind == FileKind::Pdf
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError> {
        guarded(|| {
            let doc = lopdf::Document::load_mem(bytes)
                .map_err(|e| StrategyError::Parse(format!("failed to load PDF: {e}")))?;

            let mut pages = Vec::new();
            for page_number in doc.get_pages().keys() {
                match doc.extract_text(&[*page_number]) {
                    Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
                    Ok(_) => {}
                    Err(e) => tracing::debug!(page = page_number, error = %e, "lopdf page skipped"),
                }
            }
            Ok(pages.join("\n\n"))
        })
    }
}
