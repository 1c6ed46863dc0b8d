use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::strategy::{guarded, ExtractionStrategy, StrategyError};
use super::FileKind;

/// Word documents through the docx-rs object model.
pub struct DocxRsStrategy;

impl ExtractionStrategy for DocxRsStrategy {
    fn name(&self) -> &'static str {
        "docx-rs"
    }

    fn supports(&self, kind: FileKind) -> bool {
        matches!(kind, FileKind::Docx | FileKind::Doc)
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError> {
        guarded(|| {
            let doc = docx_rs::read_docx(bytes).map_err(|e| StrategyError::Parse(e.to_string()))?;

            let mut paragraphs = Vec::new();
            for child in doc.document.children {
                if let docx_rs::DocumentChild::Paragraph(p) = child {
                    let mut text = String::new();
                    for child in p.children {
                        if let docx_rs::ParagraphChild::Run(run) = child {
                            for child in run.children {
                                if let docx_rs::RunChild::Text(t) = child {
                                    text.push_str(&t.text);
                                }
                            }
                        }
                    }
                    if !text.trim().is_empty() {
                        paragraphs.push(text);
                    }
                }
            }
            Ok(paragraphs.join("\n\n"))
        })
    }
}

/// Reads `word/document.xml` straight out of the zip container. Tolerates
/// documents the object model rejects.
pub struct DocxXmlStrategy;

impl ExtractionStrategy for DocxXmlStrategy {
    fn name(&self) -> &'static str {
        "docx-xml"
    }

    fn supports(&self, kind: FileKind) -> bool {
        matches!(kind, FileKind::Docx | FileKind::Doc)
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| StrategyError::Parse(format!("not a zip container: {e}")))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| StrategyError::Parse(format!("missing word/document.xml: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| StrategyError::Parse(e.to_string()))?;
        document_xml_text(&xml)
    }
}

/// Text of every `w:t` element; each closed `w:p` ends a paragraph.
fn document_xml_text(xml: &str) -> Result<String, StrategyError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| StrategyError::Parse(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(StrategyError::Parse(format!("document.xml: {e}"))),
            _ => {}
        }
    }
    if !current.trim().is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_paragraphs_become_blank_line_separated() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>Primer</w:t></w:r><w:r><w:t xml:space="preserve"> párrafo</w:t></w:r></w:p>
            <w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p>
            <w:p></w:p>
        </w:body></w:document>"#;
        assert_eq!(
            document_xml_text(xml).unwrap(),
            "Primer párrafo\n\nFish & chips"
        );
    }

    #[test]
    fn non_zip_bytes_fail() {
        assert!(DocxXmlStrategy.try_extract(b"plain bytes").is_err());
        assert!(DocxRsStrategy.try_extract(b"plain bytes").is_err());
    }
}
