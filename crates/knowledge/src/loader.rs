//! PDF directory loading.
//!
//! Every `*.pdf` file directly inside the data directory becomes one
//! [`Document`] per page, tagged with `source`, `page` (0-based) and
//! `total_pages`.

use crate::types::{Document, SOURCE_KEY};
use lopdf::Document as PdfDocument;
use medbot_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load every PDF in `dir` as page-level documents.
///
/// Files are visited in file-name order and pages in page order. Text
/// extraction is CPU-bound and runs on the blocking thread pool.
pub async fn load_pdf_directory(dir: &Path) -> AppResult<Vec<Document>> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || load_pdf_directory_blocking(&dir))
        .await
        .map_err(|e| AppError::Ingestion(format!("PDF loading task failed: {}", e)))?
}

/// Synchronous variant of [`load_pdf_directory`].
pub fn load_pdf_directory_blocking(dir: &Path) -> AppResult<Vec<Document>> {
    let files = list_pdf_files(dir)?;

    tracing::info!("Found {} PDF file(s) in {:?}", files.len(), dir);

    let mut documents = Vec::new();
    for path in &files {
        let pages = load_pdf(path)?;
        tracing::debug!("Loaded {:?}: {} page(s)", path, pages.len());
        documents.extend(pages);
    }

    Ok(documents)
}

/// List the PDF files directly inside `dir`, sorted by file name.
pub fn list_pdf_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::Ingestion(format!(
            "Data directory does not exist or is not a directory: {:?}",
            dir
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", dir, e)))?;

        if entry.file_type().is_file() && is_pdf(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Load a single PDF file, one document per page.
///
/// Text extraction is all-or-nothing: if `lopdf` cannot decode any page (for
/// example a font encoding it does not support), the whole file fails and so
/// does the directory load. No partially ingested corpus is ever indexed.
pub fn load_pdf(path: &Path) -> AppResult<Vec<Document>> {
    let pdf = PdfDocument::load(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to parse PDF {:?}: {}", path, e)))?;

    let source = path.to_string_lossy().into_owned();
    let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
    let total_pages = page_numbers.len();

    page_numbers
        .iter()
        .enumerate()
        .map(|(index, page_number)| {
            let text = pdf.extract_text(&[*page_number]).map_err(|e| {
                AppError::Ingestion(format!(
                    "Failed to extract text from page {} of {:?}: {}",
                    page_number, path, e
                ))
            })?;

            Ok(Document::new(text)
                .with_metadata(SOURCE_KEY, source.clone())
                .with_metadata("page", index)
                .with_metadata("total_pages", total_pages))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::write_pdf;
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_directory_pages_and_metadata() {
        let temp = TempDir::new().unwrap();
        write_pdf(
            &temp.path().join("b_book.pdf"),
            &["Acne is a skin condition.", "It affects hair follicles."],
        );
        write_pdf(&temp.path().join("a_notes.PDF"), &["Asthma notes."]);
        std::fs::write(temp.path().join("readme.txt"), "not a pdf").unwrap();

        let docs = load_pdf_directory(temp.path()).await.unwrap();
        assert_eq!(docs.len(), 3);

        // Sorted by file name, pages in order
        assert!(docs[0].source().unwrap().ends_with("a_notes.PDF"));
        assert!(docs[1].source().unwrap().ends_with("b_book.pdf"));
        assert_eq!(docs[1].metadata["page"], 0);
        assert_eq!(docs[2].metadata["page"], 1);
        assert_eq!(docs[2].metadata["total_pages"], 2);
    }

    #[test]
    fn test_non_recursive() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        write_pdf(&nested.join("deep.pdf"), &["hidden"]);

        let files = list_pdf_files(temp.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = load_pdf_directory_blocking(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_malformed_pdf() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.pdf"), "definitely not a pdf").unwrap();

        let err = load_pdf_directory_blocking(temp.path()).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_one_unreadable_file_fails_whole_load() {
        let temp = TempDir::new().unwrap();
        write_pdf(&temp.path().join("a_good.pdf"), &["Gout causes joint pain."]);
        std::fs::write(temp.path().join("b_bad.pdf"), "%PDF-1.5 truncated").unwrap();

        let err = load_pdf_directory_blocking(temp.path()).unwrap_err();
        match err {
            AppError::Ingestion(message) => assert!(message.contains("b_bad.pdf")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
