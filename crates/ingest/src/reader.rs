use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::deck::PitchDeck;

pub struct DeckReader;

impl DeckReader {
    pub async fn read_file(path: &Path) -> Result<PitchDeck> {
        let bytes = fs::read(path)
            .await
            .context(format!("Failed to read file: {:?}", path))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let deck = PitchDeck::from_bytes(file_name, bytes)
            .context(format!("Invalid pitch deck: {:?}", path))?;

        tracing::debug!(
            file = %deck.file_name,
            doc_id = %deck.doc_id,
            bytes = deck.size(),
            "Loaded pitch deck"
        );
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.pdf");
        std::fs::write(&path, b"%PDF-1.7\n2 pages").unwrap();

        let deck = DeckReader::read_file(&path).await.unwrap();
        assert_eq!(deck.file_name, "acme.pdf");
        assert_eq!(deck.size(), 16);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = DeckReader::read_file(Path::new("/nonexistent/deck.pdf")).await;
        assert!(result.is_err());
    }
}
