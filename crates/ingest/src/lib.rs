pub mod deck;
pub mod reader;

pub use deck::{DeckError, MAX_DECK_BYTES, PDF_MIME_TYPE, PitchDeck};
pub use reader::DeckReader;

use sha2::{Digest, Sha256};

/// Generate a stable document ID from deck content
pub fn generate_doc_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(&result[..16])
}
