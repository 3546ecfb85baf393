//! Content extraction for classification.
//!
//! Every supported file kind has an [`Extractor`] implementation. The
//! [`ExtractorRegistry`] maps a [`FileKind`] to its extractor so new formats
//! are added by registering another entry.
//!
//! Extraction failures are not retried here; the caller decides what a failed
//! file means for the run.

use crate::config::{OcrConfig, OrganizerConfig, PdfConfig, PdfPolicy};
use crate::file_kind::FileKind;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while turning a file into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unreadable or corrupt file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("No text could be extracted from {}", .0.display())]
    NoText(PathBuf),

    #[error("No extractor registered for {}", .0.display())]
    Unsupported(PathBuf),

    #[error("OCR failed for {}: {reason}", .path.display())]
    Ocr { path: PathBuf, reason: String },
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Text pulled out of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// The whole file as one string.
    Text(String),
    /// Independently classified slices, e.g. PDF pages.
    Chunks(Vec<String>),
}

impl Extracted {
    /// Returns the non-blank pieces of text in order.
    pub fn into_chunks(self) -> Vec<String> {
        let chunks = match self {
            Extracted::Text(text) => vec![text],
            Extracted::Chunks(chunks) => chunks,
        };
        chunks
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }

    fn is_blank(&self) -> bool {
        match self {
            Extracted::Text(text) => text.trim().is_empty(),
            Extracted::Chunks(chunks) => chunks.iter().all(|c| c.trim().is_empty()),
        }
    }
}

/// A format-specific text extractor.
pub trait Extractor {
    /// Extracts text from the file at `path`.
    fn extract(&self, path: &Path) -> ExtractResult<Extracted>;

    /// Human-readable name for log lines.
    fn name(&self) -> &str;
}

/// Reads UTF-8 text files whole.
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<Extracted> {
        let bytes = read_bytes(path)?;
        let text = String::from_utf8(bytes).map_err(|e| ExtractError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("not valid UTF-8: {}", e),
        })?;
        Ok(Extracted::Text(text))
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Extracts PDF text page by page with `pdf-extract`.
pub struct PdfExtractor {
    config: PdfConfig,
}

impl PdfExtractor {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    fn read_pages(&self, path: &Path) -> ExtractResult<Vec<String>> {
        let bytes = read_bytes(path)?;

        // pdf-extract can panic on malformed fonts
        let pages = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })) {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                return Err(ExtractError::Corrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                tracing::error!("PDF extraction panicked for {}", path.display());
                return Err(ExtractError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "PDF parser panicked".to_string(),
                });
            }
        };

        tracing::debug!(
            "Read {} page(s) from {}, keeping at most {}",
            pages.len(),
            path.display(),
            self.config.max_pages
        );

        Ok(pages
            .into_iter()
            .take(self.config.max_pages)
            .map(|page| clean_text(&page))
            .filter(|page| !page.is_empty())
            .collect())
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<Extracted> {
        let pages = self.read_pages(path)?;

        match self.config.policy {
            PdfPolicy::Pages => Ok(Extracted::Chunks(pages)),
            PdfPolicy::Truncate => {
                let joined = pages.join("\n");
                let capped = truncate_chars(&joined, self.config.max_chars);
                Ok(Extracted::Chunks(split_chars(capped, self.config.chunk_chars)))
            }
        }
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// Joins the paragraphs of a DOCX body with newlines.
pub struct DocxExtractor;

impl DocxExtractor {
    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut output = String::new();
        for child in &paragraph.children {
            match child {
                docx_rs::ParagraphChild::Run(run) => Self::push_run(run, &mut output),
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    for link_child in &link.children {
                        if let docx_rs::ParagraphChild::Run(run) = link_child {
                            Self::push_run(run, &mut output);
                        }
                    }
                }
                _ => {}
            }
        }
        output
    }

    fn push_run(run: &docx_rs::Run, output: &mut String) {
        for run_child in &run.children {
            if let docx_rs::RunChild::Text(text) = run_child {
                output.push_str(&text.text);
            }
        }
    }
}

impl Extractor for DocxExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<Extracted> {
        let bytes = read_bytes(path)?;
        let doc = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let paragraphs: Vec<String> = doc
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                docx_rs::DocumentChild::Paragraph(paragraph) => {
                    Some(Self::paragraph_text(paragraph))
                }
                _ => None,
            })
            .collect();

        Ok(Extracted::Text(paragraphs.join("\n")))
    }

    fn name(&self) -> &str {
        "docx"
    }
}

/// Runs an external OCR command over an image and captures stdout.
pub struct ImageExtractor {
    command: String,
}

impl ImageExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            command: config.command,
        }
    }
}

impl Extractor for ImageExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<Extracted> {
        let sniffed = infer::get_from_path(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match sniffed {
            Some(kind) if matches!(kind.matcher_type(), infer::MatcherType::Image) => {}
            _ => {
                return Err(ExtractError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "content is not a recognized image format".to_string(),
                });
            }
        }

        let args = vec![path.as_os_str().to_os_string(), OsString::from("stdout")];
        let output = duct::cmd(self.command.as_str(), args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| ExtractError::Ocr {
                path: path.to_path_buf(),
                reason: format!("could not run '{}': {}", self.command, e),
            })?;

        if !output.status.success() {
            return Err(ExtractError::Ocr {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Extracted::Text(
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }

    fn name(&self) -> &str {
        "ocr"
    }
}

/// Maps file kinds to extractors.
pub struct ExtractorRegistry {
    extractors: HashMap<FileKind, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Creates a registry with an extractor for every built-in kind.
    pub fn from_config(config: &OrganizerConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(FileKind::PlainText, Box::new(PlainTextExtractor));
        registry.register(FileKind::Pdf, Box::new(PdfExtractor::new(config.pdf.clone())));
        registry.register(FileKind::Word, Box::new(DocxExtractor));
        registry.register(
            FileKind::Image,
            Box::new(ImageExtractor::new(config.ocr.clone())),
        );
        registry
    }

    /// Adds or replaces the extractor for a kind.
    pub fn register(&mut self, kind: FileKind, extractor: Box<dyn Extractor>) {
        self.extractors.insert(kind, extractor);
    }

    pub fn supports(&self, kind: FileKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Extracts a file with the extractor registered for `kind`.
    ///
    /// # Errors
    ///
    /// `Unsupported` if nothing is registered for `kind`, `NoText` if the
    /// file yields only whitespace, otherwise whatever the extractor reports.
    pub fn extract(&self, kind: FileKind, path: &Path) -> ExtractResult<Extracted> {
        let extractor = self
            .extractors
            .get(&kind)
            .ok_or_else(|| ExtractError::Unsupported(path.to_path_buf()))?;

        tracing::debug!("Extracting {} with {}", path.display(), extractor.name());
        let extracted = extractor.extract(path)?;
        if extracted.is_blank() {
            return Err(ExtractError::NoText(path.to_path_buf()));
        }
        Ok(extracted)
    }
}

fn read_bytes(path: &Path) -> ExtractResult<Vec<u8>> {
    fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Trims every line and drops empty ones.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the longest prefix of `text` holding at most `max_chars` chars.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cuts `text` into pieces of at most `chunk_chars` chars.
pub fn split_chars(text: &str, chunk_chars: usize) -> Vec<String> {
    if chunk_chars == 0 {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_split_chars() {
        assert_eq!(split_chars("abcdefg", 3), vec!["abc", "def", "g"]);
        assert!(split_chars("", 3).is_empty());
    }

    #[test]
    fn test_into_chunks_drops_blank_pages() {
        let extracted = Extracted::Chunks(vec![
            "page one".to_string(),
            "   ".to_string(),
            "page three".to_string(),
        ]);
        assert_eq!(extracted.into_chunks(), vec!["page one", "page three"]);
    }

    #[test]
    fn test_plain_text_extractor() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, "Quarterly revenue grew").unwrap();

        let extracted = PlainTextExtractor.extract(&path).unwrap();
        assert_eq!(
            extracted,
            Extracted::Text("Quarterly revenue grew".to_string())
        );
    }

    #[test]
    fn test_plain_text_invalid_utf8_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.txt");
        fs::write(&path, [0xC3, 0x28, 0xFF]).unwrap();

        let result = PlainTextExtractor.extract(&path);
        assert!(matches!(result, Err(ExtractError::Corrupt { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PlainTextExtractor.extract(Path::new("/non/existent/file.txt"));
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }

    #[test]
    fn test_registry_rejects_blank_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.txt");
        fs::write(&path, "  \n\t").unwrap();

        let registry = ExtractorRegistry::from_config(&OrganizerConfig::default());
        let result = registry.extract(FileKind::PlainText, &path);
        assert!(matches!(result, Err(ExtractError::NoText(_))));
    }

    #[test]
    fn test_registry_unsupported_kind() {
        let registry = ExtractorRegistry::empty();
        assert!(!registry.supports(FileKind::Pdf));
        let result = registry.extract(FileKind::Pdf, Path::new("report.pdf"));
        assert!(matches!(result, Err(ExtractError::Unsupported(_))));
    }

    #[test]
    fn test_pdf_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\nthis is not really a pdf").unwrap();

        let extractor = PdfExtractor::new(PdfConfig::default());
        assert!(matches!(
            extractor.extract(&path),
            Err(ExtractError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_docx_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.docx");
        fs::write(&path, b"PK\x03\x04 definitely not a document").unwrap();

        assert!(matches!(
            DocxExtractor.extract(&path),
            Err(ExtractError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_image_extractor_rejects_non_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.png");
        fs::write(&path, "plain text pretending to be a png").unwrap();

        let extractor = ImageExtractor::new(OcrConfig::default());
        assert!(matches!(
            extractor.extract(&path),
            Err(ExtractError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_image_extractor_missing_command() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.png");
        fs::write(&path, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

        let extractor = ImageExtractor::new(OcrConfig {
            command: "desksort-no-such-ocr-binary".to_string(),
        });
        assert!(matches!(
            extractor.extract(&path),
            Err(ExtractError::Ocr { .. })
        ));
    }
}
