//! Object storage backend (S3, R2, GCS, Azure, local, in-memory)

use super::glob::GlobPattern;
use super::types::{RecordStore, WriteSummary};
use crate::config::Credentials;
use crate::decode::DecoderFormat;
use crate::error::{Error, Result};
use crate::output::{
    data_schema, encode_parquet, json_to_arrow, split_by_columns, ParquetWriterConfig,
    PartitionChunk,
};
use crate::types::{RecordSet, WriteMode};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Marker object written after a table's data files
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Data file name inside each partition directory
const PART_FILE: &str = "part-00000.parquet";

/// `RecordStore` over an object store rooted at a URL
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
    /// How input objects are decoded
    decoder_format: DecoderFormat,
    /// Parquet settings for written tables
    parquet: ParquetWriterConfig,
}

impl ObjectStorage {
    /// Parse a storage URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://` - process-local in-memory store
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem,
    ///   which must already exist (see `parse_output`)
    ///
    /// Credentials, when given, are used for the S3-compatible schemes; the
    /// other backends read their usual environment variables.
    pub fn parse(url: &str, credentials: Option<&Credentials>) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            Self::parse_s3(rest, "s3", credentials)
        } else if let Some(rest) = url.strip_prefix("s3a://") {
            Self::parse_s3(rest, "s3", credentials)
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::parse_s3(rest, "r2", credentials)
        } else if let Some(rest) = url.strip_prefix("gs://") {
            Self::parse_gcs(rest)
        } else if let Some(rest) = url.strip_prefix("az://") {
            Self::parse_azure(rest)
        } else if url.starts_with("memory://") {
            Ok(Self::in_memory())
        } else {
            Self::parse_local(url)
        }
    }

    /// Wrap an existing object store
    pub fn from_store(store: Arc<dyn ObjectStore>, scheme: impl Into<String>) -> Self {
        Self {
            store,
            prefix: String::new(),
            scheme: scheme.into(),
            decoder_format: DecoderFormat::default(),
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// A fresh in-memory store
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemory::new()), "memory")
    }

    /// Root every key under `prefix`
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Set how input objects are decoded
    #[must_use]
    pub fn with_decoder_format(mut self, format: DecoderFormat) -> Self {
        self.decoder_format = format;
        self
    }

    /// Set Parquet writer settings
    #[must_use]
    pub fn with_parquet_config(mut self, config: ParquetWriterConfig) -> Self {
        self.parquet = config;
        self
    }

    /// Split `bucket/path` into bucket and prefix
    fn split_bucket(without_scheme: &str) -> (&str, String) {
        match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(
        without_scheme: &str,
        scheme: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Self> {
        let (bucket, prefix) = Self::split_bucket(without_scheme);
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in {scheme} URL")));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        if let Some(credentials) = credentials {
            builder = builder
                .with_access_key_id(&credentials.access_key_id)
                .with_secret_access_key(&credentials.secret_access_key);
        }

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        if scheme == "r2" {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self::from_store(Arc::new(store), scheme).with_prefix(prefix))
    }

    /// Parse GCS URL
    fn parse_gcs(without_scheme: &str) -> Result<Self> {
        let (bucket, prefix) = Self::split_bucket(without_scheme);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self::from_store(Arc::new(store), "gs").with_prefix(prefix))
    }

    /// Parse Azure Blob URL
    fn parse_azure(without_scheme: &str) -> Result<Self> {
        let (container, prefix) = Self::split_bucket(without_scheme);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self::from_store(Arc::new(store), "az").with_prefix(prefix))
    }

    /// Parse a destination URL, creating a local output directory if needed
    pub fn parse_output(url: &str, credentials: Option<&Credentials>) -> Result<Self> {
        if Self::is_local_url(url) {
            let path = url.strip_prefix("file://").unwrap_or(url);
            std::fs::create_dir_all(path)
                .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;
        }
        Self::parse(url, credentials)
    }

    fn is_local_url(url: &str) -> bool {
        !["s3://", "s3a://", "r2://", "gs://", "az://", "memory://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
    }

    /// Parse local filesystem path; the directory must exist
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        if !std::path::Path::new(path).is_dir() {
            return Err(Error::config(format!("Local directory not found: {path}")));
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::from_store(Arc::new(store), "file"))
    }

    /// Check if this is a cloud destination (not local or in-memory)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Get the scheme (s3, r2, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The underlying object store
    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Resolve a key relative to the root prefix
    fn object_path(&self, relative: &str) -> Result<ObjectPath> {
        let relative = relative.trim_matches('/');
        let full = match (self.prefix.is_empty(), relative.is_empty()) {
            (true, _) => relative.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{relative}", self.prefix),
        };
        ObjectPath::parse(&full)
            .map_err(|e| Error::config(format!("Invalid path '{full}': {e}")))
    }

    /// Key relative to the root prefix
    fn relative_key<'a>(&self, location: &'a ObjectPath) -> &'a str {
        let key = location.as_ref();
        if self.prefix.is_empty() {
            return key;
        }
        key.strip_prefix(self.prefix.as_str())
            .map_or(key, |rest| rest.trim_start_matches('/'))
    }

    /// URL of a location, for logging
    fn url_of(&self, location: &ObjectPath) -> String {
        format!("{}://{location}", self.scheme)
    }

    /// List every object under a directory (recursive)
    async fn list_under(&self, dir: &ObjectPath) -> object_store::Result<Vec<ObjectMeta>> {
        let prefix = (!dir.as_ref().is_empty()).then_some(dir);
        self.store.list(prefix).try_collect().await
    }

    /// Put one object, mapping failures to write errors
    async fn put(&self, location: &ObjectPath, data: Bytes) -> Result<()> {
        self.store
            .put(location, data.into())
            .await
            .map_err(|e| Error::write(self.url_of(location), e.to_string()))?;
        Ok(())
    }

    /// Apply the write mode to an existing destination
    async fn prepare_destination(&self, dest: &ObjectPath, mode: WriteMode) -> Result<()> {
        let dest_url = self.url_of(dest);

        match mode {
            WriteMode::ErrorIfExists => {
                let prefix = (!dest.as_ref().is_empty()).then_some(dest);
                let existing = self
                    .store
                    .list(prefix)
                    .next()
                    .await
                    .transpose()
                    .map_err(|e| Error::write(&dest_url, e.to_string()))?;
                if existing.is_some() {
                    return Err(Error::AlreadyExists { path: dest_url });
                }
            }
            WriteMode::Overwrite => {
                let existing = self
                    .list_under(dest)
                    .await
                    .map_err(|e| Error::write(&dest_url, e.to_string()))?;
                if !existing.is_empty() {
                    debug!(path = %dest_url, objects = existing.len(), "Clearing destination");
                }
                for meta in existing {
                    self.store
                        .delete(&meta.location)
                        .await
                        .map_err(|e| Error::write(self.url_of(&meta.location), e.to_string()))?;
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for ObjectStorage {
    async fn read(&self, pattern: &str, schema: &SchemaRef) -> Result<RecordSet> {
        let glob = GlobPattern::new(pattern)?;
        let listing = self.object_path(glob.listing_prefix())?;

        let mut entries = self
            .list_under(&listing)
            .await
            .map_err(|e| Error::read(pattern, e.to_string()))?;
        entries.sort_by(|a, b| a.location.cmp(&b.location));

        let decoder = self.decoder_format.decoder();
        let mut records = Vec::new();
        let mut files = 0usize;

        for meta in entries {
            if !glob.matches(self.relative_key(&meta.location)) {
                continue;
            }

            let location = self.url_of(&meta.location);
            let body = self
                .store
                .get(&meta.location)
                .await
                .map_err(|e| Error::read(&location, e.to_string()))?
                .bytes()
                .await
                .map_err(|e| Error::read(&location, e.to_string()))?;
            let body =
                std::str::from_utf8(&body).map_err(|e| Error::read(&location, e.to_string()))?;

            let decoded = decoder
                .decode(body)
                .map_err(|e| Error::read(&location, e.to_string()))?;
            records.extend(decoded);
            files += 1;
        }

        if files == 0 {
            warn!(pattern = glob.as_str(), "No input objects matched");
        }
        info!(
            pattern = glob.as_str(),
            files,
            records = records.len(),
            "Read input records"
        );

        json_to_arrow(&records, schema).map_err(|e| Error::read(pattern, e.to_string()))
    }

    async fn write(
        &self,
        table: &RecordSet,
        path: &str,
        partition_columns: &[&str],
        mode: WriteMode,
    ) -> Result<WriteSummary> {
        let path = path.trim_matches('/');
        let dest = self.object_path(path)?;
        let dest_url = self.url_of(&dest);

        // Validate partition columns before touching the destination
        let mut chunks = split_by_columns(table, partition_columns)?;
        if chunks.is_empty() {
            let schema = data_schema(&table.schema(), partition_columns);
            chunks.push(PartitionChunk {
                dir: String::new(),
                batch: RecordBatch::new_empty(schema),
            });
        }

        self.prepare_destination(&dest, mode).await?;

        let mut summary = WriteSummary {
            path: dest_url.clone(),
            ..WriteSummary::default()
        };

        for chunk in &chunks {
            let relative = if chunk.dir.is_empty() {
                format!("{path}/{PART_FILE}")
            } else {
                format!("{path}/{}/{PART_FILE}", chunk.dir)
            };
            let location = self.object_path(&relative)?;
            let data = encode_parquet(&chunk.batch, &self.parquet)?;

            debug!(
                file = %self.url_of(&location),
                rows = chunk.batch.num_rows(),
                bytes = data.len(),
                "Writing parquet file"
            );
            self.put(&location, data).await?;

            summary.rows += chunk.batch.num_rows();
            summary.files += 1;
        }

        let marker = self.object_path(&format!("{path}/{SUCCESS_MARKER}"))?;
        self.put(&marker, Bytes::new()).await?;

        debug!(
            path = %dest_url,
            rows = summary.rows,
            files = summary.files,
            partitions = ?partition_columns,
            "Wrote parquet files"
        );

        Ok(summary)
    }
}
