//! Appwrite-compatible REST client.
//!
//! Admin-scoped calls (document CRUD, OTP issuance, session creation)
//! carry the server API key; session-scoped calls (account fetch, session
//! deletion) carry the session secret header instead, so they act on
//! behalf of the signed-in user.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use stratus_core::{AccountId, BucketFileId, DocumentId, Email, SessionId};

use super::types::{Account, DocumentList, FileDocument, Session, StorageFile, Token, UserDocument};
use super::{Platform, PlatformError};
use crate::config::PlatformConfig;
use crate::models::{AccountIdentity, EstablishedSession, NewFileRecord, NewUserRecord, UserRecord};

/// Header carrying the server API key (admin scope).
const API_KEY_HEADER: &str = "X-Appwrite-Key";

/// Header carrying a session secret (user scope).
const SESSION_HEADER: &str = "X-Appwrite-Session";

/// Sentinel document/user id asking the platform to generate one.
const UNIQUE_ID: &str = "unique()";

/// Client for the storage platform REST API.
#[derive(Clone)]
pub struct AppwriteClient {
    inner: Arc<AppwriteClientInner>,
}

struct AppwriteClientInner {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: secrecy::SecretString,
    database_id: String,
    users_collection_id: String,
    files_collection_id: String,
    bucket_id: String,
}

impl AppwriteClient {
    /// Create a new platform client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&config.project_id)
                .map_err(|e| PlatformError::Parse(format!("Invalid project id: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AppwriteClientInner {
                client,
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                project_id: config.project_id.clone(),
                api_key: config.api_key.clone(),
                database_id: config.database_id.clone(),
                users_collection_id: config.users_collection_id.clone(),
                files_collection_id: config.files_collection_id.clone(),
                bucket_id: config.bucket_id.clone(),
            }),
        })
    }

    /// Ping the platform health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), PlatformError> {
        let url = format!("{}/health", self.inner.endpoint);
        let response = self.admin(self.inner.client.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // File records & blobs
    // ─────────────────────────────────────────────────────────────────────────

    /// Upload a blob to the storage bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is rejected or the transport fails.
    pub async fn upload_blob(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StorageFile, PlatformError> {
        let url = format!(
            "{}/storage/buckets/{}/files",
            self.inner.endpoint, self.inner.bucket_id
        );

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(mime_type)?;
        let form = multipart::Form::new()
            .text("fileId", UNIQUE_ID)
            .part("file", part);

        let response = self
            .admin(self.inner.client.post(&url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response.json().await?)
    }

    /// Delete a blob from the storage bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion is rejected or the transport fails.
    pub async fn delete_blob(&self, blob_id: &BucketFileId) -> Result<(), PlatformError> {
        let url = format!(
            "{}/storage/buckets/{}/files/{}",
            self.inner.endpoint, self.inner.bucket_id, blob_id
        );

        let response = self.admin(self.inner.client.delete(&url)).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }

    /// Public view URL for a blob.
    #[must_use]
    pub fn blob_view_url(&self, blob_id: &BucketFileId) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.inner.endpoint,
            self.inner.bucket_id,
            blob_id,
            urlencoding::encode(&self.inner.project_id)
        )
    }

    /// Public download URL for a blob.
    #[must_use]
    pub fn blob_download_url(&self, blob_id: &BucketFileId) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/download?project={}",
            self.inner.endpoint,
            self.inner.bucket_id,
            blob_id,
            urlencoding::encode(&self.inner.project_id)
        )
    }

    /// Create a file record document.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the document.
    pub async fn create_file_record(
        &self,
        record: NewFileRecord,
    ) -> Result<FileDocument, PlatformError> {
        self.create_document(&self.inner.files_collection_id, &record)
            .await
    }

    /// Fetch a file record by document id.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; an unknown id is `None`.
    pub async fn get_file_record(
        &self,
        file_id: &DocumentId,
    ) -> Result<Option<FileDocument>, PlatformError> {
        let url = self.document_url(&self.inner.files_collection_id, file_id.as_str());
        let response = self.admin(self.inner.client.get(&url)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(Some(response.json().await?))
    }

    /// List file records owned by or shared with a user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    pub async fn list_file_records(
        &self,
        owner: &DocumentId,
        email: &Email,
    ) -> Result<Vec<FileDocument>, PlatformError> {
        let queries = vec![query::any_of(vec![
            query::equal("owner", owner.as_str()),
            query::contains("users", email.as_str()),
        ])];

        let list: DocumentList<FileDocument> = self
            .list_documents(&self.inner.files_collection_id, &queries)
            .await?;

        Ok(list.documents)
    }

    /// Patch attributes of a file record.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the update.
    pub async fn update_file_record(
        &self,
        file_id: &DocumentId,
        data: &serde_json::Value,
    ) -> Result<FileDocument, PlatformError> {
        let url = self.document_url(&self.inner.files_collection_id, file_id.as_str());
        let body = serde_json::json!({ "data": data });

        let response = self
            .admin(self.inner.client.patch(&url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response.json().await?)
    }

    /// Delete a file record document.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion is rejected or the transport fails.
    pub async fn delete_file_record(&self, file_id: &DocumentId) -> Result<(), PlatformError> {
        let url = self.document_url(&self.inner.files_collection_id, file_id.as_str());
        let response = self.admin(self.inner.client.delete(&url)).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request plumbing
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach the server API key (admin scope).
    fn admin(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(API_KEY_HEADER, self.inner.api_key.expose_secret())
    }

    /// Attach a session secret (user scope) instead of the API key.
    fn scoped(&self, request: reqwest::RequestBuilder, secret: &str) -> reqwest::RequestBuilder {
        request.header(SESSION_HEADER, secret)
    }

    fn collection_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.inner.endpoint, self.inner.database_id, collection_id
        )
    }

    fn document_url(&self, collection_id: &str, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection_id),
            urlencoding::encode(document_id)
        )
    }

    /// Read a failed response into an API error.
    async fn api_error(response: reqwest::Response) -> PlatformError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        PlatformError::Api { status, message }
    }

    async fn list_documents<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        queries: &[String],
    ) -> Result<DocumentList<T>, PlatformError> {
        let url = self.collection_url(collection_id);
        let params: Vec<(&str, &str)> = queries.iter().map(|q| ("queries[]", q.as_str())).collect();

        let response = self
            .admin(self.inner.client.get(&url))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn create_document<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        data: &impl serde::Serialize,
    ) -> Result<T, PlatformError> {
        let url = self.collection_url(collection_id);
        let body = serde_json::json!({
            "documentId": UNIQUE_ID,
            "data": data,
        });

        let response = self
            .admin(self.inner.client.post(&url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn find_user_document(
        &self,
        attribute: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, PlatformError> {
        let queries = vec![query::equal(attribute, value)];
        let list: DocumentList<UserDocument> = self
            .list_documents(&self.inner.users_collection_id, &queries)
            .await?;

        // Multiple matches resolve to the first, silently
        list.documents
            .into_iter()
            .next()
            .map(UserRecord::try_from)
            .transpose()
    }
}

#[async_trait::async_trait]
impl Platform for AppwriteClient {
    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, PlatformError> {
        self.find_user_document("email", email.as_str()).await
    }

    async fn find_user_by_account_id(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<UserRecord>, PlatformError> {
        self.find_user_document("accountId", account_id.as_str())
            .await
    }

    async fn create_user_record(&self, user: NewUserRecord) -> Result<UserRecord, PlatformError> {
        let doc: UserDocument = self
            .create_document(&self.inner.users_collection_id, &user)
            .await?;
        UserRecord::try_from(doc)
    }

    async fn create_email_token(&self, email: &Email) -> Result<AccountId, PlatformError> {
        let url = format!("{}/account/tokens/email", self.inner.endpoint);
        let body = serde_json::json!({
            "userId": UNIQUE_ID,
            "email": email.as_str(),
        });

        let response = self
            .admin(self.inner.client.post(&url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let token: Token = response.json().await?;
        Ok(AccountId::new(token.user_id))
    }

    async fn create_session(
        &self,
        account_id: &AccountId,
        secret: &str,
    ) -> Result<EstablishedSession, PlatformError> {
        let url = format!("{}/account/sessions/token", self.inner.endpoint);
        let body = serde_json::json!({
            "userId": account_id.as_str(),
            "secret": secret,
        });

        let response = self
            .admin(self.inner.client.post(&url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let session: Session = response.json().await?;
        Ok(EstablishedSession {
            session_id: SessionId::new(session.id),
            secret: secrecy::SecretString::from(session.secret),
        })
    }

    async fn get_account(&self, session_secret: &str) -> Result<AccountIdentity, PlatformError> {
        let url = format!("{}/account", self.inner.endpoint);
        let response = self
            .scoped(self.inner.client.get(&url), session_secret)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let account: Account = response.json().await?;
        Ok(AccountIdentity::from(account))
    }

    async fn delete_current_session(&self, session_secret: &str) -> Result<(), PlatformError> {
        let url = format!("{}/account/sessions/current", self.inner.endpoint);
        let response = self
            .scoped(self.inner.client.delete(&url), session_secret)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }
}

/// Builders for the platform's JSON query language.
mod query {
    /// Equality filter on a single attribute.
    pub fn equal(attribute: &str, value: &str) -> String {
        serde_json::json!({
            "method": "equal",
            "attribute": attribute,
            "values": [value],
        })
        .to_string()
    }

    /// Membership filter on an array attribute.
    pub fn contains(attribute: &str, value: &str) -> String {
        serde_json::json!({
            "method": "contains",
            "attribute": attribute,
            "values": [value],
        })
        .to_string()
    }

    /// Disjunction of nested queries.
    pub fn any_of(queries: Vec<String>) -> String {
        let nested: Vec<serde_json::Value> = queries
            .iter()
            .filter_map(|q| serde_json::from_str(q).ok())
            .collect();

        serde_json::json!({
            "method": "or",
            "values": nested,
        })
        .to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config() -> PlatformConfig {
        PlatformConfig {
            endpoint: "https://cloud.appwrite.io/v1/".to_string(),
            project_id: "stratus-test".to_string(),
            api_key: SecretString::from("k3y"),
            database_id: "main".to_string(),
            users_collection_id: "users".to_string(),
            files_collection_id: "files".to_string(),
            bucket_id: "uploads".to_string(),
        }
    }

    #[test]
    fn test_query_equal() {
        let q: serde_json::Value = serde_json::from_str(&query::equal("email", "a@b.c")).unwrap();
        assert_eq!(q["method"], "equal");
        assert_eq!(q["attribute"], "email");
        assert_eq!(q["values"][0], "a@b.c");
    }

    #[test]
    fn test_query_any_of_nests_queries() {
        let q: serde_json::Value = serde_json::from_str(&query::any_of(vec![
            query::equal("owner", "doc-1"),
            query::contains("users", "a@b.c"),
        ]))
        .unwrap();

        assert_eq!(q["method"], "or");
        assert_eq!(q["values"][0]["method"], "equal");
        assert_eq!(q["values"][1]["method"], "contains");
    }

    #[test]
    fn test_blob_urls_trim_trailing_slash() {
        let client = AppwriteClient::new(&test_config()).unwrap();
        let url = client.blob_view_url(&BucketFileId::new("blob-1"));
        assert_eq!(
            url,
            "https://cloud.appwrite.io/v1/storage/buckets/uploads/files/blob-1/view?project=stratus-test"
        );
    }

    #[test]
    fn test_document_url_encodes_id() {
        let client = AppwriteClient::new(&test_config()).unwrap();
        let url = client.document_url("files", "has space");
        assert!(url.ends_with("/databases/main/collections/files/documents/has%20space"));
    }
}
