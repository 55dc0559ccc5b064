use eyre::WrapErr;
use std::io::Write;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;

/// The handler artifact referenced by the stack definition
///
/// The artifact is a prebuilt `bootstrap` binary living in the asset
/// directory. It is bundled into the archive layout the managed runtime
/// expects and uploaded under a content-hash key, so an unchanged handler
/// deploys to the same object.
pub(crate) struct Asset {
    pub path: PathBuf,
}

impl Asset {
    pub fn new(path: PathBuf) -> Self {
        Asset { path }
    }

    pub async fn bundle(&self) -> eyre::Result<Vec<u8>> {
        let artifact = self.path.join("bootstrap");

        let buffer = tokio::fs::read(&artifact)
            .await
            .wrap_err(format!("Could not read the handler artifact {artifact:?}"))?;

        // Zip crate doesn't have async support, so we have to use a blocking task here
        let bytes = tokio::task::spawn_blocking(move || -> eyre::Result<Vec<u8>> {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file("bootstrap", SimpleFileOptions::default())
                .wrap_err("Could not open ZIP file")?;

            zip.write_all(&buffer).wrap_err("Could not write to ZIP file")?;

            let cursor = zip.finish().wrap_err("Could not close ZIP file")?;
            Ok(cursor.into_inner())
        })
        .await
        .wrap_err("Failed to spawn the blocking task")?
        .wrap_err("Failed to create a Zip archive")?;

        Ok(bytes)
    }

    /// Upload the bundle and return its object key
    pub async fn upload(&self, client: &aws_sdk_s3::Client, bucket: &str) -> eyre::Result<String> {
        let bytes = self.bundle().await?;
        let key = format!("user-manager/{}.zip", sha256::digest(bytes.as_slice()));

        client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .send()
            .await
            .wrap_err("Failed to upload the handler bundle")?;

        log::debug!("Uploaded handler bundle to s3://{bucket}/{key}");

        Ok(key)
    }
}
