use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::delivery::{Delivery, DirectoryDelivery};
use crate::error::SessionError;
use crate::page_range::RangeField;
use crate::pdf::PdfDocument;
use crate::progress::{LogProgress, Pacing};
use crate::session::{Session, SessionState};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetRangeRequest {
    #[schemars(description = "Zero-based position of the range")]
    pub index: usize,
    #[schemars(description = "First page, 1-based (as typed, e.g. '3')")]
    pub start: Option<String>,
    #[schemars(description = "Last page, 1-based (as typed, e.g. '7')")]
    pub end: Option<String>,
    #[schemars(description = "Output name without the .pdf extension (empty for the default)")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IndexRequest {
    #[schemars(description = "Zero-based position")]
    pub index: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReorderRequest {
    #[schemars(description = "Current zero-based position of the document to move")]
    pub from: usize,
    #[schemars(description = "Zero-based position to move it to")]
    pub to: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveRequest {
    #[schemars(description = "Directory to write the files into")]
    pub output_dir: String,
    #[schemars(description = "Zero-based position of a single document to save (default: all)")]
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OutputDirRequest {
    #[schemars(description = "Directory to write the merged file into")]
    pub output_dir: String,
}

#[derive(Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    session: Arc<Mutex<Session>>,
}

impl PdfServer {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            tool_router: Self::tool_router(),
            session: Arc::new(Mutex::new(Session::new(pacing))),
        }
    }

    /// Runs never queue: a busy session is an error.
    fn lock(&self) -> Result<MutexGuard<'_, Session>, String> {
        self.session
            .try_lock()
            .map_err(|_| format!("Error: {}", SessionError::Busy))
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match PdfDocument::open(&path) {
            Ok(doc) => {
                let info = doc.get_info();
                let result = PdfInfoResult {
                    path,
                    page_count: info.page_count,
                    title: info.title,
                    author: info.author,
                    subject: info.subject,
                    creator: info.creator,
                    producer: info.producer,
                };
                to_json(&result)
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Load a PDF into the session. Resets the ranges to a single range covering page 1 and drops earlier results.")]
    async fn pdf_load(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        match session.load_file(&path, &LogProgress).await {
            Ok(_) => to_json(&snapshot(&session)),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Show the session: loaded file, page count, page ranges and split results")]
    async fn pdf_status(&self) -> String {
        match self.lock() {
            Ok(session) => to_json(&snapshot(&session)),
            Err(e) => e,
        }
    }

    #[tool(description = "Edit a page range. Out-of-bounds pages are clamped to the document; text that is not a number is ignored.")]
    async fn pdf_set_range(&self, Parameters(req): Parameters<SetRangeRequest>) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        if session.state() == SessionState::Empty {
            return format!("Error: {}", SessionError::NotLoaded);
        }

        let ranges = session.ranges_mut();
        if req.index >= ranges.len() {
            return format!("Error: no range at index {}", req.index);
        }
        for (field, value) in [
            (RangeField::Start, req.start),
            (RangeField::End, req.end),
            (RangeField::Name, req.name),
        ] {
            if let Some(value) = value {
                ranges.update(req.index, field, &value);
                ranges.finalize(req.index, field);
            }
        }
        to_json(&snapshot(&session))
    }

    #[tool(description = "Add a page range starting right after the last one")]
    async fn pdf_add_range(&self) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        if session.state() == SessionState::Empty {
            return format!("Error: {}", SessionError::NotLoaded);
        }
        if !session.ranges_mut().add() {
            return "Error: the last range already ends at the final page".to_string();
        }
        to_json(&snapshot(&session))
    }

    #[tool(description = "Remove a page range. The last remaining range cannot be removed.")]
    async fn pdf_remove_range(&self, Parameters(req): Parameters<IndexRequest>) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        if !session.ranges_mut().remove(req.index) {
            return format!("Error: cannot remove range {}", req.index);
        }
        to_json(&snapshot(&session))
    }

    #[tool(description = "Split the loaded PDF into one document per page range, in range order")]
    async fn pdf_split(&self) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        match session.split(&LogProgress).await {
            Ok(_) => to_json(&snapshot(&session)),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Move a split document to another position in the merge order")]
    async fn pdf_reorder(&self, Parameters(req): Parameters<ReorderRequest>) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        if !session.reorder(req.from, req.to) {
            return format!("Error: cannot move document {} to {}", req.from, req.to);
        }
        to_json(&snapshot(&session))
    }

    #[tool(description = "Save split documents to a directory, all of them in merge order or a single one")]
    async fn pdf_save(&self, Parameters(req): Parameters<SaveRequest>) -> String {
        let session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        let mut delivery = DirectoryDelivery::new(&req.output_dir);
        let result = match req.index {
            Some(index) => match session.deliver(index, &mut delivery) {
                Ok(false) => return format!("Error: no document at index {}", index),
                other => other.map(|_| 1),
            },
            None => session.deliver_all(&mut delivery).await,
        };
        match result {
            Ok(_) => to_json(&SaveResult {
                saved: delivery.delivered().to_vec(),
            }),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Merge all split documents, in the current order, into {name}_unido.pdf")]
    async fn pdf_merge(&self, Parameters(req): Parameters<OutputDirRequest>) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        let merged = match session.merge(&LogProgress).await {
            Ok(merged) => merged,
            Err(e) => return format!("Error: {}", e),
        };

        let mut delivery = DirectoryDelivery::new(&req.output_dir);
        if let Err(e) = delivery.deliver(&merged.bytes, &merged.file_name) {
            return format!("Error: failed to save {}: {}", merged.file_name, e);
        }
        to_json(&MergeResult {
            output_path: req.output_dir_path().join(&merged.file_name),
            page_count: merged.page_count,
        })
    }

    #[tool(description = "Close the document and discard all ranges and results")]
    async fn pdf_reset(&self) -> String {
        let mut session = match self.lock() {
            Ok(s) => s,
            Err(e) => return e,
        };
        session.reset();
        to_json(&snapshot(&session))
    }
}

impl OutputDirRequest {
    fn output_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub file_name: Option<String>,
    pub total_pages: u32,
    pub ranges: Vec<RangeResult>,
    pub documents: Vec<DocumentResult>,
}

#[derive(Debug, Serialize)]
pub struct RangeResult {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub name: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentResult {
    pub id: usize,
    pub source_range: String,
    pub file_name: String,
    pub page_count: u32,
    pub size_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct SaveResult {
    pub saved: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct MergeResult {
    pub output_path: PathBuf,
    pub page_count: u32,
}

fn snapshot(session: &Session) -> SessionSnapshot {
    let spans = session.ranges().spans();
    SessionSnapshot {
        state: session.state(),
        file_name: session.file_name().map(str::to_string),
        total_pages: session.total_pages(),
        ranges: session
            .ranges()
            .ranges()
            .iter()
            .zip(spans)
            .map(|(range, span)| RangeResult {
                start: range.start,
                end: range.end,
                name: range.name.clone(),
                file_name: span.file_name(),
            })
            .collect(),
        documents: session
            .assembly()
            .merge_order()
            .iter()
            .map(|doc| DocumentResult {
                id: doc.id,
                source_range: doc.source_range.clone(),
                file_name: doc.file_name.clone(),
                page_count: doc.page_count,
                size_bytes: doc.bytes.len(),
            })
            .collect(),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Split a PDF by page ranges and merge the parts back. Use pdf_load to open a file, \
                 pdf_set_range / pdf_add_range / pdf_remove_range to define ranges, pdf_split to \
                 cut the document, pdf_reorder to change the merge order, pdf_save to write the \
                 parts and pdf_merge to join them into one file."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(pacing: Pacing) -> Result<()> {
    let server = PdfServer::new(pacing);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
