use serde::{Deserialize, Serialize};

/// An uploaded lecture file, owned by the upload service and read here for its text.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceFile {
    pub id: i64,
    pub lecture_id: i64,
    pub filename: String,
    pub filepath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl SourceFile {
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filepath)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}
