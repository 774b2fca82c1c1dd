use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::models::message::{
    ErrorRow, InformationRow, MessageCategory, MessageDetail, MessageRecord, MessageSource,
    MessageTables, ResolvedMessage, ValidationRow,
};
use crate::services::message_constants;

pub const CODE_NOT_PROVIDED: &str = "GEN000";
pub const CODE_NOT_FOUND: &str = "GEN001";
pub const CODE_STORAGE_FAULT: &str = "GEN002";

/// Primary tier of the catalog. The compiled-in constants are the second tier.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find(
        &self,
        category: MessageCategory,
        code: &str,
    ) -> Result<Option<MessageRecord>, sqlx::Error>;

    async fn all(&self, category: MessageCategory) -> Result<Vec<MessageRecord>, sqlx::Error>;

    async fn upsert(
        &self,
        category: MessageCategory,
        code: &str,
        text: &str,
    ) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct SqlMessageStore {
    pool: SqlitePool,
}

impl SqlMessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for SqlMessageStore {
    async fn find(
        &self,
        category: MessageCategory,
        code: &str,
    ) -> Result<Option<MessageRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT code, text FROM {} WHERE code = ? COLLATE NOCASE LIMIT 1",
            category.table()
        );

        sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
    }

    async fn all(&self, category: MessageCategory) -> Result<Vec<MessageRecord>, sqlx::Error> {
        let sql = format!("SELECT code, text FROM {} ORDER BY code", category.table());

        sqlx::query_as::<_, MessageRecord>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    async fn upsert(
        &self,
        category: MessageCategory,
        code: &str,
        text: &str,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} (code, text) VALUES (?, ?) \
             ON CONFLICT(code) DO UPDATE SET text = excluded.text",
            category.table()
        );

        sqlx::query(&sql)
            .bind(code)
            .bind(text)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct MessageResolver {
    store: Arc<dyn MessageStore>,
}

impl MessageResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_store(Arc::new(SqlMessageStore::new(pool)))
    }

    pub fn with_store(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Resolves a code whose first letter names its category. Never fails:
    /// every problem is folded into a generic `GEN00x` error record.
    pub async fn resolve(&self, code: &str) -> ResolvedMessage {
        let code = normalize_code(code);
        if code.is_empty() {
            return ResolvedMessage::error(CODE_NOT_PROVIDED, "Code not provided.");
        }

        let Some(category) = MessageCategory::from_code(&code) else {
            return ResolvedMessage::error(
                CODE_NOT_FOUND,
                "Something went wrong. Please try again.",
            );
        };

        match self.store.find(category, &code).await {
            Ok(Some(record)) if !record.text.is_empty() => ResolvedMessage {
                category,
                code: record.code,
                message: record.text,
            },
            Ok(_) => ResolvedMessage {
                category,
                message: message_constants::lookup(category, &code)
                    .unwrap_or_default()
                    .to_string(),
                code,
            },
            Err(e) => {
                tracing::error!("Message lookup failed for code {}: {}", code, e);
                ResolvedMessage::error(CODE_STORAGE_FAULT, "Unexpected server error.")
            }
        }
    }

    /// Explicit `(type, code)` lookup reporting which tier answered.
    pub async fn resolve_by_type(&self, type_name: &str, code: &str) -> MessageDetail {
        let code = normalize_code(code);

        let Some(category) = MessageCategory::from_type_name(type_name) else {
            return MessageDetail {
                code,
                message: String::new(),
                source: MessageSource::Constants,
            };
        };

        match self.store.find(category, &code).await {
            Ok(Some(record)) if !record.text.is_empty() => {
                return MessageDetail {
                    code,
                    message: record.text,
                    source: MessageSource::Db,
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Message store unavailable for {}/{}: {}", type_name, code, e);
            }
        }

        let message = message_constants::lookup(category, &code)
            .unwrap_or_default()
            .to_string();
        tracing::debug!("Message {} served from constants", code);

        MessageDetail {
            code,
            message,
            source: MessageSource::Constants,
        }
    }

    /// Shortcut for handlers that only need the text.
    pub async fn text(&self, code: &str) -> String {
        self.resolve(code).await.message
    }

    /// Raw database contents of the three tables.
    pub async fn tables(&self) -> Result<MessageTables, sqlx::Error> {
        let errors = self.store.all(MessageCategory::Error).await?;
        let validations = self.store.all(MessageCategory::Validation).await?;
        let information = self.store.all(MessageCategory::Info).await?;

        Ok(MessageTables {
            user_error: errors.into_iter().map(error_row).collect(),
            user_validation: validations.into_iter().map(validation_row).collect(),
            user_information: information.into_iter().map(information_row).collect(),
        })
    }

    /// Database rows plus every constant the database does not override.
    /// An unreachable store degrades to the constants alone.
    pub async fn merged_tables(&self) -> MessageTables {
        let mut merged = MessageTables::default();

        for category in [
            MessageCategory::Error,
            MessageCategory::Validation,
            MessageCategory::Info,
        ] {
            let mut records = self.store.all(category).await.unwrap_or_else(|e| {
                tracing::warn!("Falling back to constants for {}: {}", category.table(), e);
                Vec::new()
            });

            let known: HashSet<String> = records.iter().map(|r| r.code.to_uppercase()).collect();
            records.extend(
                message_constants::entries(category)
                    .iter()
                    .filter(|(code, _)| !known.contains(*code))
                    .map(|(code, text)| MessageRecord {
                        code: code.to_string(),
                        text: text.to_string(),
                    }),
            );

            match category {
                MessageCategory::Error => {
                    merged.user_error = records.into_iter().map(error_row).collect()
                }
                MessageCategory::Validation => {
                    merged.user_validation = records.into_iter().map(validation_row).collect()
                }
                MessageCategory::Info => {
                    merged.user_information = records.into_iter().map(information_row).collect()
                }
            }
        }

        merged
    }

    pub async fn upsert(
        &self,
        category: MessageCategory,
        code: &str,
        text: &str,
    ) -> Result<MessageRecord, sqlx::Error> {
        let code = normalize_code(code);
        self.store.upsert(category, &code, text).await?;

        Ok(MessageRecord {
            code,
            text: text.to_string(),
        })
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn error_row(record: MessageRecord) -> ErrorRow {
    ErrorRow {
        error_code: record.code,
        error_message: record.text,
    }
}

fn validation_row(record: MessageRecord) -> ValidationRow {
    ValidationRow {
        validation_code: record.code,
        validation_message: record.text,
    }
}

fn information_row(record: MessageRecord) -> InformationRow {
    InformationRow {
        information_code: record.code,
        information_text: record.text,
    }
}
