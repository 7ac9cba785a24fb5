pub mod analyzer;
pub mod document;

pub use analyzer::{AnalysisRequest, Analyzer, select_analyzer};
pub use document::Document;

/// Outcome of analysing one document
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub file_name: String,
    pub body: std::result::Result<String, String>,
    pub simulated: bool,
}

/// Analyse documents one after another; a failure on one does not stop the rest
pub async fn run_batch(
    analyzer: &dyn Analyzer,
    documents: &[Document],
    request: &AnalysisRequest,
) -> Vec<AnalysisReport> {
    let mut reports = Vec::with_capacity(documents.len());

    for document in documents {
        let body = match analyzer.analyze(document, request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!("Analysis of {} failed: {:#}", document.name, e);
                Err(format!("{:#}", e))
            }
        };

        reports.push(AnalysisReport {
            file_name: document.name.clone(),
            body,
            simulated: analyzer.is_simulated(),
        });
    }

    reports
}
