use anyhow::{Context, Result};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::split::write_results;
use crate::pdf::PdfDocument;
use crate::plan::SplitModeKind;
use crate::session::Session;
use crate::split::Progress;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Clone, Copy, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SplitModeParam {
    Range,
    EveryPage,
    CustomRanges,
    Reorder,
}

impl From<SplitModeParam> for SplitModeKind {
    fn from(mode: SplitModeParam) -> Self {
        match mode {
            SplitModeParam::Range => SplitModeKind::Range,
            SplitModeParam::EveryPage => SplitModeKind::EveryPage,
            SplitModeParam::CustomRanges => SplitModeKind::CustomRanges,
            SplitModeParam::Reorder => SplitModeKind::Reorder,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PageMove {
    #[schemars(description = "0-based position of the page to move")]
    pub from: usize,
    #[schemars(description = "0-based position to move it to")]
    pub to: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Split mode: range, every-page, custom-ranges or reorder")]
    pub mode: SplitModeParam,
    #[schemars(description = "First page for range mode (1-based, default: 1)")]
    pub start: Option<u32>,
    #[schemars(description = "Last page for range mode (1-based, default: last page)")]
    pub end: Option<u32>,
    #[schemars(description = "Range expressions for custom-ranges mode, one output file each (e.g., '1-5, 8, 10-12')")]
    #[serde(default)]
    pub ranges: Vec<String>,
    #[schemars(description = "Full 1-based page order for reorder mode (e.g., [3, 1, 2])")]
    pub order: Option<Vec<u32>>,
    #[schemars(description = "Page moves applied in sequence for reorder mode")]
    #[serde(default)]
    pub moves: Vec<PageMove>,
    #[schemars(description = "Directory to write the output files to")]
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get the page count and metadata (title, author, creator, producer, dates) of a PDF")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match PdfDocument::open(&path) {
            Ok(doc) => {
                let info = doc.get_info();
                let result = PdfInfoResult {
                    path,
                    version: info.version,
                    page_count: info.page_count,
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    creation_date: info.creation_date,
                    subject: info.subject,
                    keywords: info.keywords,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Split a PDF into new files: one page range (range), one file per page (every-page), one file per range expression (custom-ranges), or all pages in a new order (reorder)")]
    async fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        match split_to_dir(req).await {
            Ok(result) => {
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }
}

async fn split_to_dir(req: PdfSplitRequest) -> Result<SplitToolResult> {
    let mut session = Session::new();
    let page_count = session
        .open(&req.path)
        .with_context(|| format!("Failed to open PDF: {}", req.path))?;
    session.set_mode(req.mode.into());

    match req.mode {
        SplitModeParam::Range => {
            session.set_range_params(req.start.unwrap_or(1), req.end.unwrap_or(page_count))?;
        }
        SplitModeParam::EveryPage => {}
        SplitModeParam::CustomRanges => {
            for range in req.ranges {
                session.add_custom_range(range);
            }
        }
        SplitModeParam::Reorder => {
            if let Some(order) = req.order {
                session.set_page_order(order)?;
            }
            for PageMove { from, to } in req.moves {
                session.move_page(from, to)?;
            }
        }
    }

    let mut progress = Vec::new();
    let results = session
        .split(|p: Progress| {
            debug!(percentage = p.percentage, "{}", p.message);
            progress.push(p);
        })
        .await?;

    let written = write_results(&results, &req.output_dir)?;
    info!(files = written.len(), output_dir = %req.output_dir, "wrote split output");

    let files = results
        .iter()
        .zip(written)
        .map(|(result, path)| SplitFileResult {
            name: result.name.clone(),
            output_path: path.display().to_string(),
            page_count: result.page_count,
        })
        .collect();

    Ok(SplitToolResult {
        source_page_count: page_count,
        files,
        progress,
    })
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    pub version: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SplitFileResult {
    pub name: String,
    pub output_path: String,
    pub page_count: u32,
}

#[derive(Debug, Serialize)]
pub struct SplitToolResult {
    pub source_page_count: u32,
    pub files: Vec<SplitFileResult>,
    pub progress: Vec<Progress>,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF splitting tools. Use pdf_info to get the page count and metadata, and \
                 pdf_split to write new PDFs from a page range, every page, custom range \
                 expressions like '1-5, 8, 10-12', or a reordered page sequence."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();
    info!("serving MCP on stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
