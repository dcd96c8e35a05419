//! Document models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::common::{option_timestamp, timestamp, ValuesWrapper};

/// A stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub file_size: u64,
    /// Human-readable size, e.g. `1.2 MB`
    pub size: String,
    pub storage_path: String,
    pub hash: String,
    pub storage_provider_id: String,
    pub storage_provider_name: String,
    pub bucket_id: String,
    pub bucket_path: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub tags: ValuesWrapper<String>,
    #[serde(with = "option_timestamp")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub created_by_name: String,
    pub modified_by: Option<String>,
    pub is_deleted: bool,
    #[serde(with = "option_timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub current_version_id: String,
    pub metadata: Option<serde_json::Value>,
    pub share_ids: Option<Vec<String>>,
    pub file_extension: String,
}

/// A share link created together with a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentShare {
    pub id: String,
    pub share_code: String,
    pub document_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "option_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    pub max_view_count: Option<u32>,
    pub view_count: u32,
    pub has_password: bool,
    pub watermark_text: Option<String>,
    pub allow_download: bool,
    pub allow_print: bool,
    pub custom_message: Option<String>,
    pub notify_on_access: bool,
    pub notification_emails: Option<Vec<String>>,
    pub is_direct_share: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Default for DocumentShare {
    fn default() -> Self {
        Self {
            id: String::new(),
            share_code: String::new(),
            document_id: String::new(),
            name: String::new(),
            description: None,
            expires_at: None,
            max_view_count: None,
            view_count: 0,
            has_password: false,
            watermark_text: None,
            allow_download: true,
            allow_print: true,
            custom_message: None,
            notify_on_access: false,
            notification_emails: None,
            is_direct_share: false,
            created_at: DateTime::<Utc>::default(),
            created_by: String::new(),
        }
    }
}

impl DocumentShare {
    /// Relative URL at which the share can be opened.
    pub fn share_url(&self) -> String {
        format!("/document/{}", self.share_code)
    }
}

/// Response of a document upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentCreateResponse {
    pub document: Document,
    pub share: Option<DocumentShare>,
}

/// A stored revision of a document's content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentVersion {
    pub id: String,
    pub document_id: String,
    pub document_name: String,
    pub version_number: u32,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub content_type: String,
    pub size: String,
    pub storage_path: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub created_by_name: String,
    pub change_description: String,
    pub is_current: bool,
    pub is_active: bool,
    pub note: String,
}

/// Options of a document upload. Only `name` is required.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub category_id: Option<String>,
    pub provider_id: Option<String>,
    pub bucket_id: Option<String>,
    pub metadata_json: Option<String>,
    pub metadata_schema_id: Option<String>,
    pub create_share: bool,
    pub expires_after_days: Option<u32>,
    pub max_view_count: Option<u32>,
    pub password: Option<String>,
    pub watermark_text: Option<String>,
    pub allow_download: bool,
    pub allow_print: bool,
    pub custom_message: Option<String>,
    pub notify_on_access: bool,
    pub notification_emails: Option<String>,
    pub is_direct_share: bool,
}

impl CreateDocumentRequest {
    /// Upload options with the given display name and defaults elsewhere.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Places the document in `bucket_id`.
    pub fn with_bucket(mut self, bucket_id: impl Into<String>) -> Self {
        self.bucket_id = Some(bucket_id.into());
        self
    }

    /// Files the document under `category_id`.
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Multipart text fields, in the order the API documents them.
    ///
    /// Optional fields are sent only when set; flags only when true, except
    /// `allowDownload` and `allowPrint` which are always sent.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("name", self.name.clone())];

        push_text(&mut fields, "categoryId", &self.category_id);
        push_text(&mut fields, "metadataJson", &self.metadata_json);
        push_text(&mut fields, "metadataSchemaId", &self.metadata_schema_id);
        if self.create_share {
            fields.push(("createShare", "true".to_string()));
        }
        if let Some(days) = self.expires_after_days {
            fields.push(("expiresAfterDays", days.to_string()));
        }
        if let Some(count) = self.max_view_count {
            fields.push(("maxViewCount", count.to_string()));
        }
        push_text(&mut fields, "password", &self.password);
        push_text(&mut fields, "watermarkText", &self.watermark_text);
        fields.push(("allowDownload", self.allow_download.to_string()));
        fields.push(("allowPrint", self.allow_print.to_string()));
        push_text(&mut fields, "customMessage", &self.custom_message);
        if self.notify_on_access {
            fields.push(("notifyOnAccess", "true".to_string()));
        }
        push_text(&mut fields, "notificationEmails", &self.notification_emails);
        if self.is_direct_share {
            fields.push(("isDirectShare", "true".to_string()));
        }

        fields
    }

    /// Query parameters selecting the storage target.
    pub fn query_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(provider_id) = non_empty(&self.provider_id) {
            params.push(("providerId", provider_id));
        }
        if let Some(bucket_id) = non_empty(&self.bucket_id) {
            params.push(("bucketId", bucket_id));
        }
        params
    }
}

impl Default for CreateDocumentRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            category_id: None,
            provider_id: None,
            bucket_id: None,
            metadata_json: None,
            metadata_schema_id: None,
            create_share: false,
            expires_after_days: None,
            max_view_count: None,
            password: None,
            watermark_text: None,
            allow_download: true,
            allow_print: true,
            custom_message: None,
            notify_on_access: false,
            notification_emails: None,
            is_direct_share: false,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn push_text(fields: &mut Vec<(&'static str, String)>, name: &'static str, value: &Option<String>) {
    if let Some(value) = non_empty(value) {
        fields.push((name, value.to_string()));
    }
}

/// Body of a document update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    /// Overwritten with the path id before sending
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub bucket_id: Option<String>,
}
