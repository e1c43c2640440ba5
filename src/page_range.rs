use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::LazyLock;

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid regex"));

/// An editable page range row.
///
/// `start` and `end` are `None` while the field is empty and may hold any
/// integer until the row is finalized by [`crate::range_set::RangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub name: String,
}

impl PageRange {
    pub fn new(start: i64, end: i64) -> Self {
        PageRange {
            start: Some(start),
            end: Some(end),
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Start,
    End,
    Name,
}

/// A finalized range: `1 <= start <= end <= total pages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
    pub name: String,
}

impl PageSpan {
    /// Output file name: `{name}.pdf`, or `rango_{start}-{end}.pdf` when unnamed
    pub fn file_name(&self) -> String {
        if self.name.is_empty() {
            format!("rango_{}-{}.pdf", self.start, self.end)
        } else {
            format!("{}.pdf", self.name)
        }
    }

    /// The `start-end` label recorded on extracted documents
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// Zero-based page indices covered by this span, in order
    pub fn page_indices(&self) -> Vec<u32> {
        (self.start - 1..self.end).collect()
    }
}

/// Parse the leading integer of `s` the way a lenient number field does:
/// `"12abc"` is 12, `"abc"` is nothing. Numbers too large for `i64`
/// saturate, so they still clamp to the last page.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let caps = LEADING_INT.captures(s)?;
    let digits = &caps[1];
    Some(digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Number(i64),
    End,
}

impl PageRef {
    /// Raw field text for this reference, with `end` resolved to the page count
    pub fn to_field(&self, total_pages: u32) -> String {
        match self {
            PageRef::Number(n) => n.to_string(),
            PageRef::End => total_pages.to_string(),
        }
    }
}

/// A range typed on the command line: `START[-END][:NAME]`, e.g. `1-5:intro`,
/// `6-end` or `9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: PageRef,
    pub end: Option<PageRef>,
    pub name: Option<String>,
}

impl RangeSpec {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        let (range_part, name) = match s.split_once(':') {
            Some((range, name)) => (range.trim(), Some(name.trim().to_string())),
            None => (s, None),
        };

        if let Some(dash_pos) = range_part.find('-') {
            // "-5" is not a range
            if dash_pos == 0 {
                return Err(anyhow!("Invalid page range: {}", s));
            }

            let start = parse_page_ref(&range_part[..dash_pos])?;
            let end = parse_page_ref(&range_part[dash_pos + 1..])?;

            Ok(RangeSpec {
                start,
                end: Some(end),
                name,
            })
        } else {
            let page = parse_page_ref(range_part)?;
            Ok(RangeSpec {
                start: page,
                end: None,
                name,
            })
        }
    }

    /// Raw `(start, end)` field text; a single page uses the same value twice
    pub fn fields(&self, total_pages: u32) -> (String, String) {
        let start = self.start.to_field(total_pages);
        let end = match &self.end {
            Some(end) => end.to_field(total_pages),
            None => start.clone(),
        };
        (start, end)
    }
}

fn parse_page_ref(s: &str) -> Result<PageRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(PageRef::End)
    } else {
        s.parse::<i64>()
            .map(PageRef::Number)
            .map_err(|_| anyhow!("Invalid page number: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32, name: &str) -> PageSpan {
        PageSpan {
            start,
            end,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_unnamed_file_name() {
        assert_eq!(span(1, 3, "").file_name(), "rango_1-3.pdf");
    }

    #[test]
    fn test_named_file_name() {
        assert_eq!(span(4, 4, "cover").file_name(), "cover.pdf");
        assert_eq!(span(4, 4, "cover").label(), "4-4");
    }

    #[test]
    fn test_page_indices_are_zero_based() {
        assert_eq!(span(1, 3, "").page_indices(), vec![0, 1, 2]);
        assert_eq!(span(4, 4, "").page_indices(), vec![3]);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(parse_leading_int("12"), Some(12));
        assert_eq!(parse_leading_int(" 7 pages"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("-99999999999999999999x"), Some(i64::MIN));
    }

    #[test]
    fn test_single_page_spec() {
        let spec = RangeSpec::parse("5").unwrap();
        assert_eq!(spec.start, PageRef::Number(5));
        assert_eq!(spec.end, None);
        assert_eq!(spec.fields(10), ("5".to_string(), "5".to_string()));
    }

    #[test]
    fn test_named_range_spec() {
        let spec = RangeSpec::parse("1-5:part_a").unwrap();
        assert_eq!(spec.name.as_deref(), Some("part_a"));
        assert_eq!(spec.fields(10), ("1".to_string(), "5".to_string()));
    }

    #[test]
    fn test_end_keyword() {
        let spec = RangeSpec::parse("6-end").unwrap();
        assert_eq!(spec.end, Some(PageRef::End));
        assert_eq!(spec.fields(10), ("6".to_string(), "10".to_string()));
    }

    #[test]
    fn test_invalid_specs() {
        assert!(RangeSpec::parse("").is_err());
        assert!(RangeSpec::parse("-5").is_err());
        assert!(RangeSpec::parse("a-b").is_err());
    }
}
