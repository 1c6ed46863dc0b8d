//! Extraction strategy contract and the priority-ordered registry.

use std::any::Any;
use std::panic::{self, UnwindSafe};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::docx::{DocxRsStrategy, DocxXmlStrategy};
use super::encoding::{PlainTextStrategy, RawBytesStrategy};
use super::pdf::{LopdfStrategy, PdfExtractStrategy};
use super::FileKind;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("parser panicked: {0}")]
    Panicked(String),
}

/// One way of turning file bytes into text.
pub trait ExtractionStrategy: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    fn supports(&self, kind: FileKind) -> bool;

    /// Attempt extraction. Blank output counts as a miss.
    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError>;
}

/// Strategies in priority order (registration order).
pub struct ExtractorRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ExtractorRegistry {
    /// An empty registry. Every extraction returns `""` until strategies are added.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// The built-in chains: pdf-extract → lopdf → raw bytes for PDF,
    /// docx-rs → document.xml → raw bytes for Word, encoding cascade for text.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(PdfExtractStrategy)
            .register(LopdfStrategy)
            .register(DocxRsStrategy)
            .register(DocxXmlStrategy)
            .register(PlainTextStrategy)
            .register(RawBytesStrategy);
        registry
    }

    pub fn register(&mut self, strategy: impl ExtractionStrategy + 'static) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategies_for(&self, kind: FileKind) -> impl Iterator<Item = &dyn ExtractionStrategy> {
        self.strategies
            .iter()
            .map(|s| s.as_ref())
            .filter(move |s| s.supports(kind))
    }

    /// Run the chain for `kind`; `""` when every strategy misses.
    pub fn extract(&self, bytes: &[u8], kind: FileKind) -> String {
        for strategy in self.strategies_for(kind) {
            match strategy.try_extract(bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        kind = kind.as_str(),
                        chars = text.len(),
                        "extraction strategy succeeded"
                    );
                    return text;
                }
                Ok(_) => debug!(strategy = strategy.name(), "strategy produced no text"),
                Err(e) => warn!(strategy = strategy.name(), error = %e, "extraction strategy failed"),
            }
        }
        warn!(kind = kind.as_str(), bytes = bytes.len(), "no strategy could extract text");
        String::new()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run a third-party parser, turning a panic into a strategy error.
pub(crate) fn guarded<F>(f: F) -> Result<String, StrategyError>
where
    F: FnOnce() -> Result<String, StrategyError> + UnwindSafe,
{
    panic::catch_unwind(f).unwrap_or_else(|payload| Err(StrategyError::Panicked(panic_message(&payload))))
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Fixed {
        name: &'static str,
        output: Result<&'static str, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supports(&self, kind: FileKind) -> bool {
            kind == FileKind::Pdf
        }

        fn try_extract(&self, _bytes: &[u8]) -> Result<String, StrategyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
                .map(str::to_string)
                .map_err(|e| StrategyError::Parse(e.to_string()))
        }
    }

    fn fixed(name: &'static str, output: Result<&'static str, &'static str>) -> (Fixed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Fixed {
                name,
                output,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[test]
    fn first_non_blank_strategy_wins() {
        let (broken, broken_calls) = fixed("broken", Err("bad xref"));
        let (blank, blank_calls) = fixed("blank", Ok("   "));
        let (good, good_calls) = fixed("good", Ok("hello"));
        let (never, never_calls) = fixed("never", Ok("unused"));

        let mut registry = ExtractorRegistry::new();
        registry.register(broken).register(blank).register(good).register(never);

        assert_eq!(registry.extract(b"%PDF", FileKind::Pdf), "hello");
        assert_eq!(broken_calls.load(Ordering::SeqCst), 1);
        assert_eq!(blank_calls.load(Ordering::SeqCst), 1);
        assert_eq!(good_calls.load(Ordering::SeqCst), 1);
        assert_eq!(never_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsupported_kind_skips_strategy() {
        let (good, calls) = fixed("good", Ok("hello"));
        let mut registry = ExtractorRegistry::new();
        registry.register(good);
        assert_eq!(registry.extract(b"x", FileKind::Text), "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_failures_yield_empty_text() {
        let (a, _) = fixed("a", Err("boom"));
        let mut registry = ExtractorRegistry::new();
        registry.register(a);
        assert_eq!(registry.extract(b"x", FileKind::Pdf), "");
    }

    #[test]
    fn guarded_converts_panics() {
        let result = guarded(|| panic!("font table exploded"));
        match result {
            Err(StrategyError::Panicked(msg)) => assert!(msg.contains("font table")),
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[test]
    fn default_chain_order() {
        let registry = ExtractorRegistry::with_defaults();
        let pdf: Vec<_> = registry.strategies_for(FileKind::Pdf).map(|s| s.name()).collect();
        assert_eq!(pdf, vec!["pdf-extract", "lopdf", "raw-bytes"]);
        let docx: Vec<_> = registry.strategies_for(FileKind::Docx).map(|s| s.name()).collect();
        assert_eq!(docx, vec!["docx-rs", "docx-xml", "raw-bytes"]);
        let md: Vec<_> = registry.strategies_for(FileKind::Markdown).map(|s| s.name()).collect();
        assert_eq!(md, vec!["plain-text"]);
    }
}
