/// Product image uploads
///
/// Multipart bodies are read into a [`MultipartForm`]: text parts are kept
/// as name/value pairs, file parts (field `files`) are buffered with size
/// and count limits and checked against the image allowlist.
///
/// Accepted files are written to `{UPLOADS_DIR}/products/` under a
/// randomized name `{stem}-{32 hex chars}{.ext}` and served back from
/// `/uploads/products/...`.
///
/// # Example
///
/// ```no_run
/// use axum::extract::Multipart;
/// use northbridge_api::{config::UploadConfig, storage};
///
/// # async fn example(multipart: Multipart, uploads: UploadConfig) -> Result<(), storage::StorageError> {
/// let form = storage::read_multipart(multipart, &uploads).await?;
/// for file in &form.files {
///     let stored = storage::store(&uploads.dir, file).await?;
///     println!("{} -> {}", file.original_name, stored.path);
/// }
/// # Ok(())
/// # }
/// ```

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Multipart, MultipartError};
use bytes::{Bytes, BytesMut};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::UploadConfig;

/// Multipart field that carries images
pub const FILES_FIELD: &str = "files";

/// Sub directory of the upload root used for product images
pub const PRODUCTS_DIR: &str = "products";

pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not supported")]
    UnsupportedType(String),

    #[error("File too large, the limit is {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Too many files, at most {limit} are allowed")]
    TooManyFiles { limit: usize },

    #[error("Unexpected file field '{0}'")]
    UnexpectedField(String),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file part read from a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// A file written to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated file name
    pub name: String,
    /// Path relative to the upload root, e.g. `products/mug-3f...e1.png`
    pub path: String,
    pub size: i64,
    pub mime_type: String,
    /// Hex SHA-256 of the content
    pub checksum: String,
}

/// Text fields and files of a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// First value of a text field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value sent as `name` or `name[]`
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        let bracketed = format!("{}[]", name);
        self.fields
            .iter()
            .filter(|(key, _)| key == name || *key == bracketed)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

pub fn is_supported_mime(mime_type: &str) -> bool {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&mime_type.as_str())
}

/// Reads a whole multipart body, enforcing the upload limits
///
/// # Errors
///
/// - `StorageError::TooManyFiles` past `max_files` file parts
/// - `StorageError::TooLarge` when one file exceeds `max_file_size`
/// - `StorageError::UnsupportedType` for anything but JPEG/PNG
/// - `StorageError::UnexpectedField` for a file part not named `files`
pub async fn read_multipart(
    mut multipart: Multipart,
    limits: &UploadConfig,
) -> Result<MultipartForm, StorageError> {
    let mut form = MultipartForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await?;
            form.fields.push((name, value));
            continue;
        };

        if name != FILES_FIELD {
            return Err(StorageError::UnexpectedField(name));
        }
        if form.files.len() >= limits.max_files {
            return Err(StorageError::TooManyFiles {
                limit: limits.max_files,
            });
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_ascii_lowercase();
        if !is_supported_mime(&mime_type) {
            warn!(file = %original_name, mime_type = %mime_type, "Rejected upload");
            return Err(StorageError::UnsupportedType(mime_type));
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if buffer.len() + chunk.len() > limits.max_file_size {
                return Err(StorageError::TooLarge {
                    limit: limits.max_file_size,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        form.files.push(UploadedFile {
            original_name,
            mime_type,
            bytes: buffer.freeze(),
        });
    }

    Ok(form)
}

/// Builds `{stem}-{32 hex chars}{.ext}` for an uploaded file
///
/// The stem keeps ASCII letters, digits, `-` and `_` of the original name.
pub fn stored_file_name(original_name: &str, mime_type: &str) -> String {
    let file_name = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let path = Path::new(file_name);

    let stem: String = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let stem = if stem.is_empty() { "file".to_string() } else { stem };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .or_else(|| extension_for(mime_type).map(str::to_string));

    let mut suffix = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut suffix);

    match extension {
        Some(ext) => format!("{}-{}.{}", stem, hex::encode(suffix), ext),
        None => format!("{}-{}", stem, hex::encode(suffix)),
    }
}

fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Writes a file under `{root}/products/`, creating the directory on demand
pub async fn store(root: &Path, file: &UploadedFile) -> Result<StoredFile, StorageError> {
    let dir = root.join(PRODUCTS_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let name = stored_file_name(&file.original_name, &file.mime_type);
    tokio::fs::write(dir.join(&name), &file.bytes).await?;

    debug!(file = %name, size = file.bytes.len(), "Stored upload");

    Ok(StoredFile {
        path: format!("{}/{}", PRODUCTS_DIR, name),
        name,
        size: file.bytes.len() as i64,
        mime_type: file.mime_type.clone(),
        checksum: checksum(&file.bytes),
    })
}

/// Resolves a stored relative path under `root`, refusing anything that
/// would leave the upload directory
pub fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative.trim_start_matches('/'));
    let safe = relative
        .components()
        .all(|c| matches!(c, std::path::Component::Normal(_)));

    safe.then(|| root.join(relative))
}

/// Removes a stored file; a file that is already gone is not an error
pub async fn remove(root: &Path, relative: &str) -> Result<(), StorageError> {
    let Some(path) = resolve(root, relative) else {
        warn!(path = %relative, "Refusing to remove path outside the upload directory");
        return Ok(());
    };

    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str, content: &'static [u8]) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            mime_type: mime.to_string(),
            bytes: Bytes::from_static(content),
        }
    }

    #[test]
    fn test_mime_allowlist() {
        assert!(is_supported_mime("image/png"));
        assert!(is_supported_mime("IMAGE/JPEG"));
        assert!(is_supported_mime("image/jpg"));
        assert!(!is_supported_mime("image/gif"));
        assert!(!is_supported_mime("application/pdf"));
    }

    #[test]
    fn test_stored_file_name_format() {
        let name = stored_file_name("Blue Mug.PNG", "image/png");
        let (stem, rest) = name.split_once('-').unwrap();
        let (suffix, ext) = rest.split_once('.').unwrap();

        assert_eq!(stem, "BlueMug");
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "png");
    }

    #[test]
    fn test_stored_file_name_strips_directories_and_falls_back() {
        let name = stored_file_name("../../etc/passwd", "image/jpeg");
        assert!(name.starts_with("passwd-"));
        assert!(name.ends_with(".jpg"));

        let name = stored_file_name("", "image/png");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_names_are_unique() {
        assert_ne!(
            stored_file_name("a.png", "image/png"),
            stored_file_name("a.png", "image/png")
        );
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/uploads");
        assert_eq!(
            resolve(root, "products/a.png"),
            Some(PathBuf::from("/srv/uploads/products/a.png"))
        );
        assert_eq!(resolve(root, "../secret"), None);
        assert_eq!(resolve(root, "products/../../secret"), None);
    }

    #[test]
    fn test_form_lookup() {
        let form = MultipartForm {
            fields: vec![
                ("name".to_string(), "Mug".to_string()),
                ("categories".to_string(), "a".to_string()),
                ("categories[]".to_string(), "b".to_string()),
            ],
            files: Vec::new(),
        };

        assert_eq!(form.get("name"), Some("Mug"));
        assert_eq!(form.get("missing"), None);
        assert_eq!(form.get_all("categories"), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let root = std::env::temp_dir().join(format!("northbridge-storage-{}", uuid::Uuid::new_v4()));

        let stored = store(&root, &upload("mug.png", "image/png", b"png-bytes"))
            .await
            .unwrap();

        assert!(stored.path.starts_with("products/mug-"));
        assert_eq!(stored.size, 9);
        assert_eq!(stored.checksum, checksum(b"png-bytes"));

        let on_disk = root.join(&stored.path);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png-bytes");

        remove(&root, &stored.path).await.unwrap();
        assert!(!on_disk.exists());

        // Removing twice is fine
        remove(&root, &stored.path).await.unwrap();

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
