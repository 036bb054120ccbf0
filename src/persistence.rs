use crate::config::AppConfig;
use crate::model::session::QuizSession;
use crate::model::types::UserAnswer;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

pub const RESULT_SCHEMA_VERSION: &str = "1";

/// Results store: a key/value service with expiring entries and listing by
/// key prefix.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;
}

/// The record written once per completed quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedResult {
    pub version: String,
    pub name: String,
    pub email: String,
    pub score: i64,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub total_questions: usize,
    pub time_remaining: u32,
    /// ISO-8601, UTC, millisecond precision.
    pub completed_at: String,
    pub answers: Vec<UserAnswer>,
}

impl PersistedResult {
    pub fn from_session(
        session: &QuizSession,
        score: i64,
        time_remaining: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let tally = session.tally();
        Self {
            version: RESULT_SCHEMA_VERSION.to_string(),
            name: session.user_name().to_string(),
            email: session.user_email().to_string(),
            score,
            correct_answers: tally.correct,
            incorrect_answers: tally.incorrect,
            total_questions: session.total_questions(),
            time_remaining,
            completed_at: completed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            answers: session.answers().to_vec(),
        }
    }
}

/// `<prefix>-<unix millis>`
pub fn build_key(prefix: &str, completed_at: DateTime<Utc>) -> String {
    format!("{prefix}-{}", completed_at.timestamp_millis())
}

/// Serialize and write one result. Returns the key it was stored under.
pub async fn save_result(
    store: &dyn ResultsStore,
    prefix: &str,
    ttl: Duration,
    result: &PersistedResult,
    completed_at: DateTime<Utc>,
) -> Result<String> {
    let key = build_key(prefix, completed_at);
    let value = serde_json::to_string(result)?;
    store.put(&key, value, ttl).await?;
    info!("Saved quiz result for '{}' under {key}", result.name);
    Ok(key)
}

/// S3 if a bucket is configured, otherwise an in-memory store.
pub async fn store_from_config(config: &AppConfig) -> Arc<dyn ResultsStore> {
    match &config.s3_bucket_name {
        Some(bucket_name) => Arc::new(S3ResultsStore::new(bucket_name.clone()).await),
        None => {
            warn!("S3_BUCKET_NAME not set, quiz results are kept in memory only");
            Arc::new(MemoryResultsStore::new())
        }
    }
}

fn expiry_after(ttl: Duration) -> Result<SystemTime> {
    SystemTime::now()
        .checked_add(ttl)
        .ok_or_else(|| anyhow!("TTL of {ttl:?} is out of range"))
}

// === S3 ===
// Expiry is attached as the object's Expires header; deleting expired objects
// is left to the bucket's lifecycle rules.

pub struct S3ResultsStore {
    s3_client: S3Client,
    bucket_name: String,
}

impl S3ResultsStore {
    pub async fn new(bucket_name: String) -> Self {
        let region_provider = RegionProviderChain::default_provider();
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        info!("S3 persistence enabled with bucket: {bucket_name}");
        Self {
            s3_client: S3Client::new(&config),
            bucket_name,
        }
    }

    async fn get_value(&self, key: &str) -> Result<String> {
        let output = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;
        let bytes = output.body.collect().await?.into_bytes();
        String::from_utf8(bytes.to_vec()).map_err(|e| anyhow!("Object {key} is not UTF-8: {e}"))
    }
}

#[async_trait]
impl ResultsStore for S3ResultsStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let expires = S3DateTime::from(expiry_after(ttl)?);
        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(value.into_bytes()))
            .content_type("application/json")
            .expires(expires)
            .send()
            .await?;
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut keys = Vec::new();
        let mut continuation_token = None;
        loop {
            let output = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await?;
            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
            match output.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get_value(&key).await {
                Ok(value) => entries.push((key, value)),
                Err(e) => warn!("Skipping result {key}, failed to fetch it: {e}"),
            }
        }
        Ok(entries)
    }
}

// === In Memory ===

#[derive(Default)]
pub struct MemoryResultsStore {
    entries: Mutex<HashMap<String, (String, SystemTime)>>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = SystemTime::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResultsStore for MemoryResultsStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = SystemTime::now();
        let expires_at = expiry_after(ttl)?;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, expiry)| *expiry > now);
        entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let now = SystemTime::now();
        let mut entries: Vec<(String, String)> = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(key, (_, expires_at))| key.starts_with(prefix) && *expires_at > now)
            .map(|(key, (value, _))| (key.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
