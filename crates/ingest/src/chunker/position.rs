use noa_core::{ChunkMetadata, ChunkPosition, DocumentLocation, DocumentStructure, Section};

/// Positional metadata for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionInfo {
    pub location: DocumentLocation,
    pub document_percentage: u8,
    pub estimated_page: usize,
    pub section: Option<String>,
    pub parent_section: Option<String>,
}

impl PositionInfo {
    /// Overwrite the positional fields of `metadata`. Absent section data
    /// leaves the optional keys unset.
    pub fn apply(self, metadata: &mut ChunkMetadata) {
        metadata.position_in_document = self.location;
        metadata.document_percentage = self.document_percentage;
        metadata.estimated_page = self.estimated_page;
        metadata.section = self.section;
        metadata.parent_section = self.parent_section;
    }
}

/// Derives location, percentage, page and enclosing sections from a chunk's
/// [`ChunkPosition`] among the coarse blocks.
pub struct PositionAnnotator<'a> {
    structure: Option<&'a DocumentStructure>,
    total_blocks: usize,
}

impl<'a> PositionAnnotator<'a> {
    pub fn new(structure: Option<&'a DocumentStructure>, total_blocks: usize) -> Self {
        Self {
            structure,
            total_blocks,
        }
    }

    pub fn annotate(&self, position: ChunkPosition) -> PositionInfo {
        let document_percentage = position.percentage(self.total_blocks);
        let estimated_page = self
            .structure
            .map(|s| position.estimated_page(self.total_blocks, s.total_pages))
            .unwrap_or(1);

        let sections = self.structure.map(|s| s.sections.as_slice()).unwrap_or_default();
        let (section, parent_section) = section_at(sections, document_percentage);

        PositionInfo {
            location: position.location(self.total_blocks),
            document_percentage,
            estimated_page,
            section,
            parent_section,
        }
    }
}

/// Latest section starting at or before `percentage`; when it is nested,
/// also the latest top-level section under the same bound.
fn section_at(sections: &[Section], percentage: u8) -> (Option<String>, Option<String>) {
    let bound = f64::from(percentage);
    let Some(current) = latest_before(sections, bound, |_| true) else {
        return (None, None);
    };
    let parent = if current.level > 1 {
        latest_before(sections, bound, |s| s.level == 1).map(|s| s.title.clone())
    } else {
        None
    };
    let section = (!current.title.is_empty()).then(|| current.title.clone());
    (section, parent.filter(|t| !t.is_empty()))
}

/// Largest `position_percentage` not above `bound`; the first one wins ties.
fn latest_before(
    sections: &[Section],
    bound: f64,
    keep: impl Fn(&Section) -> bool,
) -> Option<&Section> {
    sections
        .iter()
        .filter(|s| s.position_percentage <= bound && keep(s))
        .fold(None, |best: Option<&Section>, s| match best {
            Some(b) if b.position_percentage >= s.position_percentage => Some(b),
            _ => Some(s),
        })
}
