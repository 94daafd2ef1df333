use crate::error::Error;
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use std::path::Path;
use tempfile::TempPath;
use tokio::{fs::File, io::AsyncWriteExt};

const STAGED_PREFIX: &str = "quote-";
const STAGED_SUFFIX: &str = ".stl";

/// An upload written out to disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    bytes: u64,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Streams `chunks` into a fresh file under `folder`.
///
/// Returns `None` when the stream carries no bytes, in which case nothing is
/// created on disk. Bytes are counted as they arrive, so the cap holds for
/// uploads sent without a content length.
pub async fn stage<S>(
    folder: &Path,
    max_bytes: Option<u64>,
    chunks: S,
) -> Result<Option<StagedUpload>, Error>
where
    S: Stream<Item = Result<Bytes, Error>>,
{
    futures::pin_mut!(chunks);

    let first = loop {
        match chunks.next().await {
            Some(chunk) => {
                let chunk = chunk?;
                if !chunk.is_empty() {
                    break chunk;
                }
            }
            None => return Ok(None),
        }
    };

    let (file, path) = tempfile::Builder::new()
        .prefix(STAGED_PREFIX)
        .suffix(STAGED_SUFFIX)
        .tempfile_in(folder)?
        .into_parts();
    let mut file = File::from_std(file);

    let mut bytes = 0;
    let mut next = Some(first);

    while let Some(chunk) = next {
        bytes += chunk.len() as u64;
        if let Some(limit) = max_bytes.filter(|limit| bytes > *limit) {
            return Err(Error::UploadTooLarge { limit });
        }
        file.write_all(&chunk).await?;

        next = chunks.next().await.transpose()?;
    }

    file.flush().await?;
    drop(file);

    Ok(Some(StagedUpload { path, bytes }))
}
