//! HTTP/2 cleartext transport to the server's request dispatcher.
//! Every request's query string is built with the double percent-encoding
//! pass (see `dirsync_protocol::query`) and carried as a single opaque `q` parameter.

use dirsync_protocol::{query, DirEntry, MetaPayload};

#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl Transport {
    pub fn new(host: &str, port: u16, key: String) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .http2_prior_knowledge()
            .build()?;
        Ok(Self {
            client,
            base_url: format!("http://{host}:{port}"),
            key,
        })
    }

    fn url(&self, endpoint: &str, extra: &[(&str, &str)]) -> String {
        let mut pairs = Vec::with_capacity(extra.len() + 1);
        pairs.push(("key", self.key.as_str()));
        pairs.extend_from_slice(extra);
        let blob = query::build_query(&pairs);
        format!("{}/{endpoint}?q={blob}", self.base_url)
    }

    /// `GET files_description?key=K`. Also used as the connection manager's
    /// reachability probe — any response counts as a successful probe.
    pub async fn files_description(&self) -> reqwest::Result<Vec<DirEntry>> {
        let url = self.url("files_description", &[]);
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// `GET meta?key=K&path=P`. Returns `Ok(None)` on `404`.
    pub async fn meta(&self, path: &str) -> anyhow::Result<Option<MetaPayload>> {
        let url = self.url("meta", &[("path", path)]);
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(Some(MetaPayload::decode(&bytes)?))
    }

    /// `GET files?key=K&path=P`. Returns `Ok(None)` on `404`.
    pub async fn get_file(&self, path: &str) -> reqwest::Result<Option<Vec<u8>>> {
        let url = self.url("files", &[("path", path)]);
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    pub async fn post_dir(&self, path: &str) -> reqwest::Result<()> {
        let url = self.url("files", &[("path", path), ("type", "dir")]);
        self.client.post(url).send().await?.error_for_status()?;
        Ok(())
    }

    pub async fn post_file(&self, path: &str, content: Vec<u8>) -> reqwest::Result<()> {
        let url = self.url("files", &[("path", path), ("type", "file")]);
        self.client
            .post(url)
            .body(content)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn patch(&self, path: &str, offset: u64, data: Vec<u8>, end: bool) -> reqwest::Result<()> {
        let offset_str = offset.to_string();
        let mut extra = vec![("path", path), ("offset", offset_str.as_str())];
        if end {
            extra.push(("end", "1"));
        }
        let url = self.url("files", &extra);
        self.client
            .patch(url)
            .body(data)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> reqwest::Result<()> {
        let url = self.url("files", &[("path", path)]);
        self.client.delete(url).send().await?.error_for_status()?;
        Ok(())
    }
}
