use crate::page_range::PageSpan;
use crate::range_set::RangeSet;

/// One sub-document to extract from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Zero-based page indices, in output order
    pub page_indices: Vec<u32>,
    pub file_name: String,
    /// `start-end`, 1-based
    pub source_range: String,
}

impl From<&PageSpan> for ExtractionRequest {
    fn from(span: &PageSpan) -> Self {
        ExtractionRequest {
            page_indices: span.page_indices(),
            file_name: span.file_name(),
            source_range: span.label(),
        }
    }
}

/// One extraction request per range, in range order.
///
/// Ranges are planned in their finalized form. File name collisions are left
/// alone.
pub fn plan(ranges: &RangeSet) -> Vec<ExtractionRequest> {
    ranges.spans().iter().map(ExtractionRequest::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_range::RangeField;

    #[test]
    fn test_plan_two_ranges() {
        let mut set = RangeSet::new();
        set.seed(5);
        set.update(0, RangeField::End, "3");
        set.finalize(0, RangeField::End);
        assert!(set.add());
        set.update(1, RangeField::Name, "cover");

        let requests = plan(&set);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].page_indices, vec![0, 1, 2]);
        assert_eq!(requests[0].file_name, "rango_1-3.pdf");
        assert_eq!(requests[0].source_range, "1-3");
        assert_eq!(requests[1].page_indices, vec![3]);
        assert_eq!(requests[1].file_name, "cover.pdf");
    }

    #[test]
    fn test_plan_clamps_pending_edits() {
        let mut set = RangeSet::new();
        set.seed(4);
        set.update(0, RangeField::Start, "3");
        set.update(0, RangeField::End, "40");

        let requests = plan(&set);
        assert_eq!(requests[0].page_indices, vec![2, 3]);
        assert_eq!(requests[0].file_name, "rango_3-4.pdf");
    }

    #[test]
    fn test_plan_keeps_colliding_names() {
        let mut set = RangeSet::new();
        set.seed(3);
        set.update(0, RangeField::Name, "part");
        assert!(set.add());
        set.update(1, RangeField::Name, "part");

        let names: Vec<_> = plan(&set).into_iter().map(|r| r.file_name).collect();
        assert_eq!(names, vec!["part.pdf", "part.pdf"]);
    }
}
