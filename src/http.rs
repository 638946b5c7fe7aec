use std::{cmp::min, fs::File, io::Write, path::Path};

use futures_util::StreamExt;
use indicatif::ProgressBar;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode, Url};

use crate::{
    error::{AssetError, AssetResult},
    extend::CutePath,
    misc,
};

/// shared HTTP client
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(crate::global::USER_AGENT)
        .timeout(crate::global::HTTP_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
});

/// a fetched text document, whatever its status
#[derive(Clone, Debug)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

/// seam between the asset run and the network
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn get_page(&self, url: &Url) -> AssetResult<Page>;

    /// store the body of `url` at `path`, returns the number of bytes written
    async fn download(&self, url: &str, path: &Path, file_pb: &ProgressBar) -> AssetResult<u64>;
}

pub struct HttpFetcher;

impl Fetch for HttpFetcher {
    async fn get_page(&self, url: &Url) -> AssetResult<Page> {
        log::debug!("GET {}", url);
        let res = HTTP_CLIENT
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AssetError::Network {
                url: url.to_string(),
                source: e,
            })?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| AssetError::Network {
            url: url.to_string(),
            source: e,
        })?;

        Ok(Page { status, body })
    }

    async fn download(&self, url: &str, path: &Path, file_pb: &ProgressBar) -> AssetResult<u64> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        download_file_progress(file_pb, url, path, &file_name).await
    }
}

/// download to file in chunks
pub async fn download_file_progress(
    file_pb: &ProgressBar,
    url: &str,
    path: &Path,
    file_name: &str,
) -> AssetResult<u64> {
    let res = HTTP_CLIENT
        .get(url)
        .send()
        .await
        .map_err(|e| AssetError::Network {
            url: url.to_string(),
            source: e,
        })?;

    if res.status() != StatusCode::OK {
        return Err(AssetError::Status {
            context: "Image".to_string(),
            status: res.status().as_u16(),
        });
    }

    let file_size = res.content_length().unwrap_or(0);
    log::debug!(
        "Starting download of {} ({})",
        file_name,
        misc::human_readable_bytes(file_size)
    );

    file_pb.set_length(file_size);
    file_pb.set_position(0);
    file_pb.set_message(file_name.to_string());

    let mut file = File::create(path).map_err(|e| AssetError::fs(path, "file creation", e))?;
    let mut downloaded: u64 = 0;
    let mut stream = res.bytes_stream();

    while let Some(item) = stream.next().await {
        let chunk = item.map_err(|e| AssetError::Network {
            url: url.to_string(),
            source: e,
        })?;
        file.write_all(&chunk)
            .map_err(|e| AssetError::fs(path, "file write", e))?;

        downloaded += chunk.len() as u64;
        if file_size > 0 {
            file_pb.set_position(min(downloaded, file_size));
        } else {
            file_pb.set_position(downloaded);
        }
    }

    file.flush()
        .map_err(|e| AssetError::fs(path, "file write", e))?;
    file_pb.set_message(String::default());

    log::debug!("Wrote {} to {}", misc::human_readable_bytes(downloaded), path.cute_path());
    Ok(downloaded)
}
