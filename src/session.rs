use crate::assembly::{AssemblyOrder, ExtractedDocument};
use crate::delivery::Delivery;
use crate::error::{LoadError, SessionError};
use crate::pdf::{DocumentEngine, LopdfEngine};
use crate::planner::{plan, ExtractionRequest};
use crate::progress::{Pacing, ProgressReporter};
use crate::range_set::RangeSet;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// How far into a file the `%PDF-` header may appear.
const HEADER_WINDOW: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Loaded,
    /// At least one extracted document exists
    Planned,
    /// A merge finished; the extracted documents are still there
    Merged,
}

struct SourceDocument {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub file_name: String,
    pub page_count: u32,
    pub bytes: Vec<u8>,
}

/// Everything between loading a document and resetting.
///
/// Runs take `&mut self`, so one session never has two runs in flight.
pub struct Session<E = LopdfEngine> {
    engine: E,
    pacing: Pacing,
    source: Option<SourceDocument>,
    ranges: RangeSet,
    assembly: AssemblyOrder,
    state: SessionState,
}

impl Session {
    pub fn new(pacing: Pacing) -> Self {
        Self::with_engine(LopdfEngine, pacing)
    }
}

impl<E: DocumentEngine> Session<E> {
    pub fn with_engine(engine: E, pacing: Pacing) -> Self {
        Session {
            engine,
            pacing,
            source: None,
            ranges: RangeSet::new(),
            assembly: AssemblyOrder::new(),
            state: SessionState::Empty,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_pages(&self) -> u32 {
        self.ranges.total_pages()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.file_name.as_deref())
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    pub fn ranges_mut(&mut self) -> &mut RangeSet {
        &mut self.ranges
    }

    pub fn assembly(&self) -> &AssemblyOrder {
        &self.assembly
    }

    /// Move an extracted document within the assembly order.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let moved = self.assembly.reorder(from, to);
        if moved && self.state == SessionState::Merged {
            self.state = SessionState::Planned;
        }
        moved
    }

    pub fn arrange(&mut self, order: &[usize]) -> bool {
        let arranged = self.assembly.arrange(order);
        if arranged && self.state == SessionState::Merged {
            self.state = SessionState::Planned;
        }
        arranged
    }

    /// Read and load a PDF from disk.
    pub async fn load_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        reporter: &dyn ProgressReporter,
    ) -> Result<u32, SessionError> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                reporter.failed(&format!("Failed to load the PDF: {}", err));
                return Err(err.into());
            }
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.load(bytes, file_name, reporter).await
    }

    /// Load a document, replacing the current one.
    ///
    /// Ranges are reseeded and previous results dropped. On failure the
    /// session is left exactly as it was.
    pub async fn load(
        &mut self,
        bytes: Vec<u8>,
        file_name: Option<String>,
        reporter: &dyn ProgressReporter,
    ) -> Result<u32, SessionError> {
        let total_pages = match self.inspect(&bytes, file_name.as_deref(), reporter).await {
            Ok(total_pages) => total_pages,
            Err(err) => {
                debug!(error = ?err, "load failed");
                reporter.failed(&format!("Failed to load the PDF: {}", err));
                return Err(err.into());
            }
        };

        info!(
            "Loaded {} ({} pages)",
            file_name.as_deref().unwrap_or("document"),
            total_pages
        );
        self.source = Some(SourceDocument { bytes, file_name });
        self.ranges.seed(total_pages);
        self.assembly.clear();
        self.state = SessionState::Loaded;
        reporter.progress(100, 100, "Completed");
        Ok(total_pages)
    }

    async fn inspect(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
        reporter: &dyn ProgressReporter,
    ) -> Result<u32, LoadError> {
        if !has_pdf_header(bytes) {
            return Err(LoadError::NotPdf {
                name: file_name.unwrap_or("input").to_string(),
            });
        }

        reporter.progress(0, 100, "Loading file");
        reporter.progress(50, 100, "Analyzing PDF");
        self.pacing.yield_now().await;

        let doc = self.engine.load(bytes)?;
        match self.engine.page_count(&doc) {
            0 => Err(LoadError::NoPages),
            total_pages => Ok(total_pages),
        }
    }

    /// Extract one document per range, in range order.
    ///
    /// Ranges are finalized first. A failure stops the run; documents
    /// extracted before it replace the previous results. A run that fails
    /// before its first document leaves the previous results in place.
    pub async fn split(&mut self, reporter: &dyn ProgressReporter) -> Result<usize, SessionError> {
        let Some(source) = &self.source else {
            return Err(SessionError::NotLoaded);
        };

        self.ranges.finalize_all();
        let requests = plan(&self.ranges);
        let total = requests.len();

        reporter.progress(0, total, "Loading source PDF");

        let mut assembly = AssemblyOrder::new();
        let result = extract_all(
            &self.engine,
            &source.bytes,
            &requests,
            &mut assembly,
            reporter,
            self.pacing,
        )
        .await;

        if !assembly.is_empty() {
            self.assembly = assembly;
            self.state = SessionState::Planned;
        }

        match result {
            Ok(()) => {
                info!("Split into {} document(s)", total);
                reporter.progress(total, total, "Completed");
                Ok(total)
            }
            Err(err) => {
                debug!(error = ?err, kept = self.assembly.len(), "split failed");
                reporter.failed(&format!("Failed to split the PDF: {}", err));
                Err(err)
            }
        }
    }

    /// Concatenate every extracted document in the current order.
    pub async fn merge(
        &mut self,
        reporter: &dyn ProgressReporter,
    ) -> Result<MergedDocument, SessionError> {
        if self.assembly.is_empty() {
            return Err(SessionError::NothingToMerge);
        }

        let result = merge_documents(
            &self.engine,
            self.assembly.merge_order(),
            reporter,
            self.pacing,
        )
        .await;

        match result {
            Ok((bytes, page_count)) => {
                let file_name = self.merged_file_name();
                info!("Merged {} page(s) into {}", page_count, file_name);
                self.state = SessionState::Merged;
                Ok(MergedDocument {
                    file_name,
                    page_count,
                    bytes,
                })
            }
            Err(err) => {
                debug!(error = ?err, "merge failed");
                reporter.failed(&format!("Failed to merge the PDFs: {}", err));
                Err(err)
            }
        }
    }

    /// `{name}_unido.pdf` after the loaded file, `pdf_unido.pdf` without one
    pub fn merged_file_name(&self) -> String {
        match self.file_name() {
            Some(name) => format!("{}_unido.pdf", name.replacen(".pdf", "", 1)),
            None => "pdf_unido.pdf".to_string(),
        }
    }

    /// Deliver one extracted document. Returns `false` if there is none at
    /// `index`.
    pub fn deliver(&self, index: usize, delivery: &mut dyn Delivery) -> Result<bool, SessionError> {
        match self.assembly.get(index) {
            Some(entry) => {
                deliver_entry(entry, delivery)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deliver every extracted document in assembly order.
    pub async fn deliver_all(&self, delivery: &mut dyn Delivery) -> Result<usize, SessionError> {
        for (i, entry) in self.assembly.merge_order().iter().enumerate() {
            if i > 0 {
                self.pacing.pause().await;
            }
            deliver_entry(entry, delivery)?;
        }
        Ok(self.assembly.len())
    }

    /// Forget the document, its ranges and every extracted document.
    pub fn reset(&mut self) {
        self.source = None;
        self.ranges = RangeSet::new();
        self.assembly.clear();
        self.state = SessionState::Empty;
        debug!("Session reset");
    }
}

async fn extract_all<E: DocumentEngine>(
    engine: &E,
    source_bytes: &[u8],
    requests: &[ExtractionRequest],
    assembly: &mut AssemblyOrder,
    reporter: &dyn ProgressReporter,
    pacing: Pacing,
) -> Result<(), SessionError> {
    let source = engine.load(source_bytes).map_err(LoadError::from)?;
    pacing.yield_now().await;

    let total = requests.len();
    for (i, request) in requests.iter().enumerate() {
        reporter.progress(
            i + 1,
            total,
            &format!("Processing range {} of {}", i + 1, total),
        );
        let extraction_error = |source| SessionError::Extraction {
            range: request.source_range.clone(),
            source,
        };

        let mut part = engine.create();
        let pages = engine
            .copy_pages(&mut part, &source, &request.page_indices)
            .map_err(extraction_error)?;
        engine
            .append_pages(&mut part, pages)
            .map_err(extraction_error)?;
        pacing.yield_now().await;

        let bytes = engine.serialize(&mut part).map_err(extraction_error)?;
        let entry = assembly.push(
            request.source_range.clone(),
            request.file_name.clone(),
            engine.page_count(&part),
            bytes,
        );
        debug!(
            "Extracted pages {} into {} ({} bytes)",
            entry.source_range,
            entry.file_name,
            entry.bytes.len()
        );

        pacing.pause().await;
    }

    Ok(())
}

/// Concatenate whole documents, in order, into one serialized PDF.
///
/// Returns the bytes and the page count of the result.
pub async fn merge_documents<E: DocumentEngine>(
    engine: &E,
    entries: &[ExtractedDocument],
    reporter: &dyn ProgressReporter,
    pacing: Pacing,
) -> Result<(Vec<u8>, u32), SessionError> {
    let total = entries.len();
    let mut merged = engine.create();

    for (i, entry) in entries.iter().enumerate() {
        reporter.progress(i + 1, total, &format!("Merging file {} of {}", i + 1, total));
        let merge_error = |source| SessionError::Merge {
            file_name: entry.file_name.clone(),
            source,
        };

        let doc = engine.load(&entry.bytes).map_err(merge_error)?;
        let indices: Vec<u32> = (0..engine.page_count(&doc)).collect();
        let pages = engine
            .copy_pages(&mut merged, &doc, &indices)
            .map_err(merge_error)?;
        engine
            .append_pages(&mut merged, pages)
            .map_err(merge_error)?;
        drop(doc);
        pacing.yield_now().await;
    }

    reporter.progress(total, total, "Saving merged PDF");
    pacing.yield_now().await;

    let page_count = engine.page_count(&merged);
    let bytes = engine
        .serialize(&mut merged)
        .map_err(|source| SessionError::Merge {
            file_name: "merged document".to_string(),
            source,
        })?;
    Ok((bytes, page_count))
}

fn deliver_entry(entry: &ExtractedDocument, delivery: &mut dyn Delivery) -> Result<(), SessionError> {
    delivery
        .deliver(&entry.bytes, &entry.file_name)
        .map_err(|source| SessionError::Delivery {
            file_name: entry.file_name.clone(),
            source,
        })
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
