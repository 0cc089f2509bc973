use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generate_doc_id;
use model::Part;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Upload cap applied by the upload surface (20 MB).
pub const MAX_DECK_BYTES: usize = 20 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeckError {
    #[error("Pitch deck is empty")]
    Empty,

    #[error("Pitch deck is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Unsupported file format: {0} (only PDF decks are accepted)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchDeck {
    pub doc_id: String,
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl PitchDeck {
    /// Validate raw upload bytes and wrap them as a deck.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DeckError> {
        let file_name = file_name.into();

        if bytes.is_empty() {
            return Err(DeckError::Empty);
        }
        if bytes.len() > MAX_DECK_BYTES {
            return Err(DeckError::TooLarge {
                size: bytes.len(),
                limit: MAX_DECK_BYTES,
            });
        }
        if !has_pdf_extension(&file_name) && !bytes.starts_with(b"%PDF") {
            return Err(DeckError::UnsupportedFormat(file_name));
        }

        Ok(Self {
            doc_id: generate_doc_id(&bytes),
            file_name,
            mime_type: PDF_MIME_TYPE.to_string(),
            bytes,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The deck as a base64 `inlineData` request part.
    pub fn inline_part(&self) -> Part {
        Part::inline_data(self.mime_type.clone(), STANDARD.encode(&self.bytes))
    }
}

fn has_pdf_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
