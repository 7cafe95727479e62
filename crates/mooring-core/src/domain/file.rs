//! File payload inserted by the author.

use bytes::Bytes;

/// Raw file handed to the registry on insertion.
///
/// `bytes` is reference-counted, so handing a clone to an upload future does
/// not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileData {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
