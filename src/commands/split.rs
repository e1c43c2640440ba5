use crate::delivery::{Delivery, DirectoryDelivery};
use crate::page_range::{RangeField, RangeSpec};
use crate::progress::{LogProgress, Pacing};
use crate::range_set::RangeSet;
use crate::session::Session;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct SplitOptions {
    pub ranges: Vec<String>,
    pub output_dir: PathBuf,
    pub merge: bool,
    /// 1-based positions
    pub order: Vec<usize>,
}

pub async fn run<P: AsRef<Path>>(input: P, options: &SplitOptions, pacing: Pacing) -> Result<()> {
    let input = input.as_ref();
    let specs = options
        .ranges
        .iter()
        .map(|s| RangeSpec::parse(s))
        .collect::<Result<Vec<_>>>()?;
    let order = zero_based_order(&options.order, specs.len().max(1))?;

    let reporter = LogProgress;
    let mut session = Session::new(pacing);
    session.load_file(input, &reporter).await?;

    apply_ranges(session.ranges_mut(), &specs)?;
    let parts = session.split(&reporter).await?;

    if let Some(order) = &order {
        // validated above, so this cannot fail
        session.arrange(order);
    }

    let mut delivery = DirectoryDelivery::new(&options.output_dir);
    session
        .deliver_all(&mut delivery)
        .await
        .with_context(|| format!("Failed to write to {}", options.output_dir.display()))?;

    println!(
        "Split {} into {} file(s) in {}",
        input.display(),
        parts,
        options.output_dir.display()
    );

    if options.merge {
        let merged = session.merge(&reporter).await?;
        delivery
            .deliver(&merged.bytes, &merged.file_name)
            .with_context(|| format!("Failed to save merged PDF: {}", merged.file_name))?;
        println!(
            "Merged {} pages into {}",
            merged.page_count,
            options.output_dir.join(&merged.file_name).display()
        );
    }

    Ok(())
}

/// Enter command-line ranges the way a user fills in the range rows: add a
/// row per range, then type each row's fields and leave them.
pub fn apply_ranges(ranges: &mut RangeSet, specs: &[RangeSpec]) -> Result<()> {
    let total = ranges.total_pages();

    for i in 1..specs.len() {
        if !ranges.add() {
            bail!(
                "Cannot add range {}: the document has only {} page(s)",
                i + 1,
                total
            );
        }
    }

    for (index, spec) in specs.iter().enumerate() {
        let (start, end) = spec.fields(total);
        ranges.update(index, RangeField::Start, &start);
        ranges.update(index, RangeField::End, &end);
        if let Some(name) = &spec.name {
            ranges.update(index, RangeField::Name, name);
        }
        ranges.finalize_range(index);

        let range = &ranges.ranges()[index];
        let requested = (start.parse::<i64>().ok(), end.parse::<i64>().ok());
        if requested != (range.start, range.end) {
            warn!(
                "Range {}-{} adjusted to {}-{}",
                start,
                end,
                range.start.unwrap_or_default(),
                range.end.unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn zero_based_order(order: &[usize], parts: usize) -> Result<Option<Vec<usize>>> {
    if order.is_empty() {
        return Ok(None);
    }

    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    if sorted != (1..=parts).collect::<Vec<_>>() {
        bail!("--order must list each of the positions 1..={} once", parts);
    }
    Ok(Some(order.iter().map(|position| position - 1).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_range::PageRange;
    use crate::pdf::testing::{create_test_pdf, labels, page_labels};

    fn seeded(total: u32) -> RangeSet {
        let mut ranges = RangeSet::new();
        ranges.seed(total);
        ranges
    }

    fn specs(items: &[&str]) -> Vec<RangeSpec> {
        items.iter().map(|s| RangeSpec::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_apply_ranges() {
        let mut ranges = seeded(10);
        apply_ranges(&mut ranges, &specs(&["1-5:part_a", "6-end"])).unwrap();

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.ranges()[0].name, "part_a");
        assert_eq!(ranges.ranges()[0].end, Some(5));
        assert_eq!(ranges.ranges()[1], PageRange::new(6, 10));
    }

    #[test]
    fn test_apply_ranges_allows_overlap() {
        let mut ranges = seeded(10);
        apply_ranges(&mut ranges, &specs(&["1-10", "3-4"])).unwrap();
        assert_eq!(ranges.ranges()[1], PageRange::new(3, 4));
    }

    #[test]
    fn test_apply_ranges_clamps() {
        let mut ranges = seeded(4);
        apply_ranges(&mut ranges, &specs(&["0-99"])).unwrap();
        assert_eq!(ranges.ranges()[0], PageRange::new(1, 4));
    }

    #[test]
    fn test_apply_ranges_needs_a_page_per_range() {
        let mut ranges = seeded(2);
        assert!(apply_ranges(&mut ranges, &specs(&["1", "2", "2"])).is_err());
    }

    #[test]
    fn test_order_validation() {
        assert_eq!(zero_based_order(&[], 3).unwrap(), None);
        assert_eq!(zero_based_order(&[2, 1], 2).unwrap(), Some(vec![1, 0]));
        assert!(zero_based_order(&[1, 1], 2).is_err());
        assert!(zero_based_order(&[1, 2, 3], 2).is_err());
        assert!(zero_based_order(&[0, 1], 2).is_err());
    }

    #[tokio::test]
    async fn test_split_and_merge_to_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("libro.pdf");
        std::fs::write(&input, create_test_pdf(6)).unwrap();
        let out = tmp.path().join("out");

        let options = SplitOptions {
            ranges: vec!["1-2:intro".to_string(), "3-end".to_string()],
            output_dir: out.clone(),
            merge: true,
            order: vec![2, 1],
        };
        run(&input, &options, Pacing::none()).await.unwrap();

        let intro = std::fs::read(out.join("intro.pdf")).unwrap();
        assert_eq!(page_labels(&intro), labels(1..=2));
        let rest = std::fs::read(out.join("rango_3-6.pdf")).unwrap();
        assert_eq!(page_labels(&rest), labels(3..=6));

        let merged = std::fs::read(out.join("libro_unido.pdf")).unwrap();
        let mut expected = labels(3..=6);
        expected.extend(labels(1..=2));
        assert_eq!(page_labels(&merged), expected);
    }
}
