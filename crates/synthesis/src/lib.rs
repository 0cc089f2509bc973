pub mod chat;
pub mod export;
pub mod memo;
pub mod prompt;

pub use chat::{
    CHAT_APOLOGY, ChatMessage, ChatRole, ChatSendError, ChatSession, ChatTurn, extract_sources,
};
pub use export::{MEMO_MIME_TYPE, export_memo, memo_file_name, slugify};
pub use memo::{MemoSynthesizer, missing_sections};
pub use prompt::MEMO_SECTIONS;
