//! Client-side upload contract, enforced server-side: single files, several
//! files, or one zip bundle; each file is checked against extension,
//! declared content type, sniffed magic bytes, and a size ceiling before it
//! is handed to the resume intake.

use regex::Regex;
use std::io::{Cursor, Read};
use thiserror::Error;

pub const MAX_FILE_SIZE_MB: u64 = 10;
pub const MAX_FILES_PER_UPLOAD: usize = 20;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "zip"];
const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/zip",
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("'{0}' exceeds the {1} MB file size limit")]
    FileTooLarge(String, u64),
    #[error("unsupported file type for '{0}'")]
    UnsupportedType(String),
    #[error("upload of {0} files exceeds the limit of {1}")]
    TooManyFiles(usize, usize),
    #[error("'{0}' has no usable file name")]
    BadFileName(String),
    #[error("archive could not be read: {0}")]
    BadArchive(String),
    #[error("archives inside archives are not accepted")]
    NestedArchive,
}

/// A file that passed every policy check, ready for intake.
#[derive(Debug)]
pub struct AcceptedFile {
    pub original_name: String,
    pub extension: String,
    pub data: Vec<u8>,
}

impl AcceptedFile {
    pub fn is_archive(&self) -> bool {
        self.extension == "zip"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE_MB * 1024 * 1024,
            max_files: MAX_FILES_PER_UPLOAD,
        }
    }
}

impl UploadPolicy {
    /// Validate one incoming file. The sniffed magic bytes win over the
    /// declared content type; the declared type is only consulted for
    /// formats with no magic (plain text).
    pub fn validate(
        &self,
        filename: &str,
        declared_type: Option<&str>,
        data: &[u8],
    ) -> Result<AcceptedFile, UploadError> {
        let extension = file_extension(filename)
            .ok_or_else(|| UploadError::BadFileName(filename.to_string()))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::UnsupportedType(filename.to_string()));
        }

        if data.len() as u64 > self.max_file_size {
            return Err(UploadError::FileTooLarge(
                filename.to_string(),
                self.max_file_size / (1024 * 1024),
            ));
        }

        if let Some(kind) = infer::get(data) {
            let sniffed = kind.mime_type();
            // docx is a zip container; a zip sniff with a docx extension
            // is the format behaving normally.
            let sniff_ok = ALLOWED_MIME_TYPES.contains(&sniffed)
                || (sniffed == "application/zip"
                    && matches!(extension.as_str(), "docx" | "zip"));
            if !sniff_ok {
                return Err(UploadError::UnsupportedType(filename.to_string()));
            }
        } else if let Some(declared) = declared_type {
            let essence = declared
                .parse::<mime::Mime>()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default();
            if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
                return Err(UploadError::UnsupportedType(filename.to_string()));
            }
        }

        Ok(AcceptedFile {
            original_name: filename.to_string(),
            extension,
            data: data.to_vec(),
        })
    }

    /// Open a zip bundle and validate every entry against the same policy.
    /// Entries that are themselves archives are rejected outright.
    pub fn expand_archive(&self, archive: &AcceptedFile) -> Result<Vec<AcceptedFile>, UploadError> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive.data.as_slice()))
            .map_err(|e| UploadError::BadArchive(e.to_string()))?;

        if zip.len() > self.max_files {
            return Err(UploadError::TooManyFiles(zip.len(), self.max_files));
        }

        let mut files = Vec::new();
        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| UploadError::BadArchive(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            if file_extension(&name).as_deref() == Some("zip") {
                return Err(UploadError::NestedArchive);
            }

            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| UploadError::BadArchive(e.to_string()))?;

            files.push(self.validate(&name, None, &data)?);
        }

        Ok(files)
    }

    pub fn check_file_count(&self, count: usize) -> Result<(), UploadError> {
        if count > self.max_files {
            return Err(UploadError::TooManyFiles(count, self.max_files));
        }
        Ok(())
    }
}

/// Lowercased extension with everything but letters and digits stripped,
/// so it is safe to embed in a stored file name.
pub fn file_extension(filename: &str) -> Option<String> {
    let raw = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_lowercase();
    let cleaned = Regex::new(r"[^a-z0-9]")
        .expect("static pattern")
        .replace_all(&raw, "")
        .to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF".to_vec()
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, data) in entries {
                writer
                    .start_file(*name, FileOptions::default())
                    .unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn accepts_a_pdf_resume() {
        let policy = UploadPolicy::default();
        let accepted = policy
            .validate("elena-petrova.pdf", Some("application/pdf"), &pdf_bytes())
            .unwrap();
        assert_eq!(accepted.extension, "pdf");
        assert!(!accepted.is_archive());
    }

    #[test]
    fn accepts_plain_text_by_declared_type() {
        let policy = UploadPolicy::default();
        let accepted = policy
            .validate("notes.txt", Some("text/plain; charset=utf-8"), b"summary")
            .unwrap();
        assert_eq!(accepted.extension, "txt");
    }

    #[test]
    fn rejects_disallowed_extension() {
        let policy = UploadPolicy::default();
        let err = policy.validate("malware.exe", None, b"MZ\x90\x00").unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }

    #[test]
    fn sniffed_type_wins_over_declared_type() {
        // PNG bytes smuggled in under a pdf name and declaration.
        let policy = UploadPolicy::default();
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];
        let err = policy
            .validate("resume.pdf", Some("application/pdf"), &png)
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }

    #[test]
    fn rejects_oversized_file() {
        let policy = UploadPolicy {
            max_file_size: 16,
            max_files: 5,
        };
        let err = policy
            .validate("big.pdf", None, &pdf_bytes())
            .unwrap_err();
        assert!(matches!(err, UploadError::FileTooLarge(_, _)));
    }

    #[test]
    fn rejects_nameless_file() {
        let policy = UploadPolicy::default();
        let err = policy.validate("noext", None, b"data").unwrap_err();
        assert!(matches!(err, UploadError::BadFileName(_)));
    }

    #[test]
    fn expands_a_bundle_and_validates_each_entry() {
        let policy = UploadPolicy::default();
        let bundle = zip_with(&[
            ("cv-one.pdf", &pdf_bytes()[..]),
            ("cv-two.txt", b"plain text resume"),
        ]);
        let archive = policy
            .validate("bundle.zip", Some("application/zip"), &bundle)
            .unwrap();
        assert!(archive.is_archive());

        let files = policy.expand_archive(&archive).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].original_name, "cv-one.pdf");
    }

    #[test]
    fn rejects_archive_inside_archive() {
        let policy = UploadPolicy::default();
        let inner = zip_with(&[("cv.pdf", &pdf_bytes()[..])]);
        let outer = zip_with(&[("nested.zip", inner.as_slice())]);
        let archive = policy.validate("outer.zip", None, &outer).unwrap();
        let err = policy.expand_archive(&archive).unwrap_err();
        assert!(matches!(err, UploadError::NestedArchive));
    }

    #[test]
    fn rejects_bundle_with_a_bad_entry() {
        let policy = UploadPolicy::default();
        let bundle = zip_with(&[("cv.pdf", &pdf_bytes()[..]), ("tool.exe", b"MZ")]);
        let archive = policy.validate("mixed.zip", None, &bundle).unwrap();
        assert!(policy.expand_archive(&archive).is_err());
    }

    #[test]
    fn enforces_file_count_limit() {
        let policy = UploadPolicy {
            max_file_size: 1024,
            max_files: 2,
        };
        assert!(policy.check_file_count(2).is_ok());
        assert!(matches!(
            policy.check_file_count(3).unwrap_err(),
            UploadError::TooManyFiles(3, 2)
        ));
    }

    #[test]
    fn extension_is_lowercased_and_sanitized() {
        assert_eq!(file_extension("Resume.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("weird.p d!f").as_deref(), Some("pdf"));
        assert_eq!(file_extension("none"), None);
    }
}
