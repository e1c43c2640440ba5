use crate::page_range::{parse_leading_int, PageRange, PageSpan, RangeField};

/// The ordered list of requested page ranges.
///
/// There is always at least one range, and insertion order is output order.
/// Nothing here fails: out-of-bounds input is clamped to the nearest valid
/// value when a field is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<PageRange>,
    total_pages: u32,
}

impl Default for RangeSet {
    fn default() -> Self {
        RangeSet {
            ranges: vec![PageRange::new(1, 1)],
            total_pages: 0,
        }
    }
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all ranges with a single range covering page 1.
    pub fn seed(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
        self.ranges = vec![PageRange::new(1, i64::from(total_pages.min(1)))];
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Interactive edit of one field.
    ///
    /// Page fields take an empty string or any integer, unclamped, so that
    /// multi-digit numbers can be typed. Non-numeric text leaves the field
    /// untouched and returns `false`.
    pub fn update(&mut self, index: usize, field: RangeField, raw: &str) -> bool {
        let Some(range) = self.ranges.get_mut(index) else {
            return false;
        };

        match field {
            RangeField::Name => {
                range.name = raw.to_string();
                true
            }
            RangeField::Start | RangeField::End => {
                let value = if raw.is_empty() {
                    None
                } else {
                    match parse_leading_int(raw) {
                        Some(n) => Some(n),
                        None => return false,
                    }
                };
                if field == RangeField::Start {
                    range.start = value;
                } else {
                    range.end = value;
                }
                true
            }
        }
    }

    /// Normalize one field after editing has finished.
    pub fn finalize(&mut self, index: usize, field: RangeField) -> bool {
        let total = self.page_limit();
        let Some(range) = self.ranges.get_mut(index) else {
            return false;
        };

        match field {
            RangeField::Start => finalize_start(range, total),
            RangeField::End => finalize_end(range, total),
            RangeField::Name => {}
        }
        true
    }

    /// Finalize both page fields of one range, start first.
    pub fn finalize_range(&mut self, index: usize) -> bool {
        self.finalize(index, RangeField::Start) && self.finalize(index, RangeField::End)
    }

    pub fn finalize_all(&mut self) {
        for index in 0..self.ranges.len() {
            self.finalize_range(index);
        }
    }

    /// Append a range starting right after the last one.
    ///
    /// Returns `false` when the last range already reaches the final page.
    pub fn add(&mut self) -> bool {
        let Some(last) = self.ranges.last() else {
            return false;
        };
        let next_start = resolve(last, self.page_limit()).end + 1;
        if next_start > self.total_pages {
            return false;
        }

        self.ranges.push(PageRange::new(
            i64::from(next_start),
            i64::from(next_start.min(self.total_pages)),
        ));
        true
    }

    /// Remove a range. The last remaining range cannot be removed.
    pub fn remove(&mut self, index: usize) -> bool {
        if self.ranges.len() <= 1 || index >= self.ranges.len() {
            return false;
        }
        self.ranges.remove(index);
        true
    }

    /// The finalized form of every range, without modifying the set
    pub fn spans(&self) -> Vec<PageSpan> {
        let total = self.page_limit();
        self.ranges.iter().map(|range| resolve(range, total)).collect()
    }

    // Clamping needs a non-empty interval even before a document is loaded.
    fn page_limit(&self) -> i64 {
        i64::from(self.total_pages.max(1))
    }
}

fn finalize_start(range: &mut PageRange, total: i64) {
    let start = range.start.map_or(1, |value| value.clamp(1, total));
    range.start = Some(start);
    // An empty end compares as zero.
    if start > range.end.unwrap_or(0) {
        range.end = Some(start);
    }
}

fn finalize_end(range: &mut PageRange, total: i64) {
    let floor = match range.start {
        Some(start) if start != 0 => start.clamp(1, total),
        _ => 1,
    };
    range.end = Some(range.end.map_or(floor, |value| value.clamp(floor, total)));
}

fn resolve(range: &PageRange, total: i64) -> PageSpan {
    let mut range = range.clone();
    finalize_start(&mut range, total);
    finalize_end(&mut range, total);
    PageSpan {
        // Both fields now lie in 1..=total.
        start: range.start.unwrap_or(1) as u32,
        end: range.end.unwrap_or(1) as u32,
        name: range.name,
    }
}
