use actix_multipart::Multipart;
use futures_util::StreamExt;

/// A file received through a multipart form
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: String, data: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            file_name,
            data,
            content_type,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// File validation configuration
#[derive(Debug, Clone)]
pub struct FileValidator {
    /// Allowed file extensions (e.g., ["xlsx", "xls"]), compared case-sensitively
    pub allowed_extensions: Vec<String>,
}

impl FileValidator {
    /// Create validator for spreadsheet workbooks
    pub fn spreadsheets() -> Self {
        Self {
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string()],
        }
    }

    /// Validate a file: emptiness first, then the extension
    pub fn validate(&self, file_name: &str, data: &[u8]) -> Result<(), String> {
        if data.is_empty() {
            return Err("file is empty".to_string());
        }

        let allowed = self
            .allowed_extensions
            .iter()
            .any(|ext| file_name.ends_with(&format!(".{}", ext)));
        if !allowed {
            return Err("unsupported file type".to_string());
        }

        Ok(())
    }
}

/// Read the named file field out of a multipart form.
///
/// Other fields are drained and ignored. Empty files are returned as-is so
/// the caller can reject them with a proper message.
pub async fn extract_file_field(
    mut payload: Multipart,
    field_name: &str,
) -> Result<Option<FileUpload>, String> {
    let mut found = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("Error reading multipart field: {}", e))?;

        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or("").to_string(),
                cd.get_filename().map(|f| f.to_string()),
            ),
            None => (String::new(), None),
        };
        let content_type = field.content_type().map(|ct| ct.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| format!("Error reading file chunk: {}", e))?;
            data.extend_from_slice(&chunk);
        }

        if name == field_name && found.is_none() {
            let file_name = file_name.unwrap_or_default();
            found = Some(FileUpload::new(file_name, data, content_type));
        }
    }

    Ok(found)
}
