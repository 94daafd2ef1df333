use crate::{
    error::Error,
    probe::{VolumeProbe, VolumeResult},
    response::QuoteResponse,
    staging,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart},
    Extension, Json,
};
use futures::{Stream, TryStreamExt};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info, trace};

pub const QUOTES_ROUTE: &str = "/api/v1/quotes";
const FILE_FIELD: &str = "file";

/// Stages uploads and hands them to the volume probe.
#[derive(Clone)]
pub struct Quoter {
    probe: Arc<dyn VolumeProbe>,
    staging_folder: PathBuf,
    max_upload_bytes: Option<u64>,
}

impl Quoter {
    pub fn new(
        probe: Arc<dyn VolumeProbe>,
        staging_folder: PathBuf,
        max_upload_bytes: Option<u64>,
    ) -> Self {
        Self {
            probe,
            staging_folder,
            max_upload_bytes,
        }
    }

    pub async fn quote<S>(&self, chunks: S) -> Result<VolumeResult, Error>
    where
        S: Stream<Item = Result<Bytes, Error>>,
    {
        let staged = staging::stage(&self.staging_folder, self.max_upload_bytes, chunks)
            .await?
            .ok_or(Error::EmptyUpload)?;

        debug!(path = %staged.path().display(), bytes = staged.bytes(), "Staged upload");

        let result = self.probe.probe(staged.path()).await?;
        Ok(result)
    }
}

pub async fn create_quote(
    Extension(quoter): Extension<Quoter>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<QuoteResponse>, Error> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            trace!(field = ?field.name(), "Skipping form field");
            continue;
        }

        let file_name = field.file_name().map(ToOwned::to_owned);
        let result = quoter.quote(field.map_err(Error::UploadRead)).await?;
        info!(?file_name, volume = ?result.volume, "Quoted upload");

        return Ok(Json(result.into()));
    }

    Err(Error::EmptyUpload)
}
