use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

pub const MEMO_MIME_TYPE: &str = "text/markdown";

/// Lowercase, hyphen-separated form of a company name.
pub fn slugify(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "company".to_string()
    } else {
        slug
    }
}

/// `investment-memo-<slug>-<YYYY-MM-DD>.md`
pub fn memo_file_name(company_name: &str, date: NaiveDate) -> String {
    format!(
        "investment-memo-{}-{}.md",
        slugify(company_name),
        date.format("%Y-%m-%d")
    )
}

/// Write the memo under `dir` using today's (UTC) date in the file name.
pub async fn export_memo(dir: &Path, company_name: &str, memo: &str) -> Result<PathBuf> {
    let today = chrono::Utc::now().date_naive();
    let path = dir.join(memo_file_name(company_name, today));

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create export directory {:?}", dir))?;
    tokio::fs::write(&path, memo)
        .await
        .with_context(|| format!("Failed to write memo to {:?}", path))?;

    tracing::info!(path = ?path, bytes = memo.len(), "Memo exported");
    Ok(path)
}
