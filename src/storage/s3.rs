use anyhow::{Context, Result, anyhow};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::series::SeriesKind;

/// Key under which a series' CSV is stored: `{prefix}/{table}/{file}`.
///
/// The folder is the Athena table name, so this is exactly the location
/// registered by the table DDL.
pub fn object_key(prefix: &str, kind: SeriesKind) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", kind.table(), kind.file_name())
    } else {
        format!("{}/{}/{}", prefix, kind.table(), kind.file_name())
    }
}

/// Body and key for an upload; with `gzip` the contents are compressed and
/// `.gz` is appended to the key.
pub fn encode_body(contents: Vec<u8>, key: &str, gzip: bool) -> Result<(Vec<u8>, String)> {
    if !gzip {
        return Ok((contents, key.to_string()));
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&contents)?;
    Ok((encoder.finish()?, format!("{key}.gz")))
}

/// The key the other encoding of `key` would have been stored under.
///
/// Both variants sit in the same table folder, so the one not written by
/// this run has to go or Athena reads every month twice.
pub fn other_variant_key(key: &str, gzip: bool) -> String {
    if gzip {
        key.to_string()
    } else {
        format!("{key}.gz")
    }
}

/// Uploads a local file, optionally gzip-compressing it first.
///
/// Compressed uploads get a `.gz` suffix; Athena's text SerDes decompress
/// those transparently. Returns the key that was written.
#[tracing::instrument(skip(client, path), fields(path = %path.display()))]
pub async fn upload_file(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    path: &Path,
    gzip: bool,
) -> Result<String> {
    let file_contents =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (body, s3_key) = encode_body(file_contents, key, gzip)?;

    let size = body.len();
    client
        .put_object()
        .bucket(bucket)
        .key(&s3_key)
        .body(ByteStream::from(body))
        .content_type(if gzip { "application/gzip" } else { "text/csv" })
        .send()
        .await
        .with_context(|| format!("Failed to upload s3://{bucket}/{s3_key}"))?;

    info!(key = %s3_key, bytes = size, "Uploaded to S3");
    Ok(s3_key)
}

/// Deletes one object. S3 treats a missing key as success.
pub async fn delete_object(client: &aws_sdk_s3::Client, bucket: &str, key: &str) -> Result<()> {
    client
        .delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .with_context(|| format!("Failed to delete s3://{bucket}/{key}"))?;
    debug!(key, "Deleted object");
    Ok(())
}

/// Name and size of a stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
}

/// Names of all buckets visible to the credentials in use.
pub async fn list_buckets(client: &aws_sdk_s3::Client) -> Result<Vec<String>> {
    let resp = client
        .list_buckets()
        .send()
        .await
        .context("Failed to list S3 buckets")?;

    Ok(resp
        .buckets()
        .iter()
        .filter_map(|b| b.name().map(str::to_string))
        .collect())
}

/// Lists every object under `prefix`, following continuation tokens.
#[tracing::instrument(skip(client))]
pub async fn list_objects(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<ObjectSummary>> {
    let mut objects = Vec::new();
    let mut continuation: Option<String> = None;

    loop {
        let resp = client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation.take())
            .send()
            .await
            .with_context(|| format!("Failed to list s3://{bucket}/{prefix}"))?;

        objects.extend(resp.contents().iter().filter_map(|o| {
            Some(ObjectSummary {
                key: o.key()?.to_string(),
                size: o.size().unwrap_or(0),
            })
        }));

        match resp.next_continuation_token() {
            Some(token) if resp.is_truncated().unwrap_or(false) => {
                continuation = Some(token.to_string());
            }
            _ => break,
        }
    }

    debug!(count = objects.len(), "Listed objects");
    Ok(objects)
}

/// Downloads a whole object into memory.
pub async fn get_object_bytes(
    client: &aws_sdk_s3::Client,
    location: &S3Location,
) -> Result<Bytes> {
    let resp = client
        .get_object()
        .bucket(&location.bucket)
        .key(&location.key)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {location}"))?;

    let data = resp
        .body
        .collect()
        .await
        .with_context(|| format!("Failed to read body of {location}"))?;
    Ok(data.into_bytes())
}

/// A parsed `s3://bucket/key` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl S3Location {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| anyhow!("Not an S3 URI: '{uri}'"))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| anyhow!("S3 URI has no object key: '{uri}'"))?;
        if bucket.is_empty() || key.is_empty() {
            return Err(anyhow!("S3 URI has an empty bucket or key: '{uri}'"));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl std::fmt::Display for S3Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
