/// File kind detection for routing files to a content extractor.
///
/// Kinds are derived from the file extension first. When a file has no
/// extension, or one the mapper does not know, the content is sniffed with
/// `infer` and the detected MIME type is mapped instead.
///
/// # Examples
///
/// ```
/// use desksort::file_kind::{FileKind, KindMapper};
///
/// let mapper = KindMapper::default();
/// assert_eq!(mapper.extension_to_kind("pdf"), Some(FileKind::Pdf));
/// assert_eq!(mapper.extension_to_kind("DOCX"), Some(FileKind::Word));
/// assert_eq!(mapper.mime_to_kind("image/png"), Some(FileKind::Image));
/// ```
use std::collections::HashMap;
use std::path::Path;

/// A file format with its own extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// UTF-8 text files (TXT, MD, CSV, ...)
    PlainText,
    /// PDF documents
    Pdf,
    /// Word documents (DOCX)
    Word,
    /// Raster images, read through OCR
    Image,
}

impl FileKind {
    /// Short tag used in log lines and dry-run output.
    ///
    /// ```
    /// use desksort::file_kind::FileKind;
    ///
    /// assert_eq!(FileKind::Pdf.tag(), "pdf");
    /// assert_eq!(FileKind::Image.tag(), "image");
    /// ```
    pub fn tag(&self) -> &'static str {
        match self {
            FileKind::PlainText => "text",
            FileKind::Pdf => "pdf",
            FileKind::Word => "word",
            FileKind::Image => "image",
        }
    }
}

/// Maps file extensions and sniffed MIME types to file kinds.
#[derive(Debug, Clone)]
pub struct KindMapper {
    extension_map: HashMap<String, FileKind>,
    mime_map: HashMap<String, FileKind>,
}

impl KindMapper {
    /// Creates a mapper with the standard extension and MIME mappings.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
            mime_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        for ext in ["txt", "md", "markdown", "csv", "log", "json", "xml", "rst", "org"] {
            self.add_extension_mapping(ext, FileKind::PlainText);
        }
        self.add_extension_mapping("pdf", FileKind::Pdf);
        self.add_extension_mapping("docx", FileKind::Word);
        for ext in ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"] {
            self.add_extension_mapping(ext, FileKind::Image);
        }

        self.add_mime_mapping("text/plain", FileKind::PlainText);
        self.add_mime_mapping("application/pdf", FileKind::Pdf);
        self.add_mime_mapping(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            FileKind::Word,
        );
        for mime in [
            "image/png",
            "image/jpeg",
            "image/gif",
            "image/bmp",
            "image/tiff",
            "image/webp",
        ] {
            self.add_mime_mapping(mime, FileKind::Image);
        }
    }

    /// Registers an extension (without the leading dot).
    pub fn add_extension_mapping(&mut self, extension: &str, kind: FileKind) {
        self.extension_map.insert(extension.to_lowercase(), kind);
    }

    /// Registers a MIME type reported by content sniffing.
    pub fn add_mime_mapping(&mut self, mime: &str, kind: FileKind) {
        self.mime_map.insert(mime.to_lowercase(), kind);
    }

    /// Case-insensitive extension lookup.
    pub fn extension_to_kind(&self, extension: &str) -> Option<FileKind> {
        self.extension_map.get(&extension.to_lowercase()).copied()
    }

    /// Case-insensitive MIME lookup.
    pub fn mime_to_kind(&self, mime: &str) -> Option<FileKind> {
        self.mime_map.get(&mime.to_lowercase()).copied()
    }

    /// Detects the kind of a file on disk.
    ///
    /// Returns `None` for unsupported files, which callers skip.
    pub fn detect(&self, path: &Path) -> Option<FileKind> {
        if let Some(kind) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.extension_to_kind(ext))
        {
            return Some(kind);
        }

        match infer::get_from_path(path) {
            Ok(Some(sniffed)) => self.mime_to_kind(sniffed.mime_type()),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Could not sniff {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl Default for KindMapper {
    fn default() -> Self {
        Self::new()
    }
}
