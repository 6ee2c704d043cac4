//! PostgREST adapter for the `posts` collection.

use async_trait::async_trait;
use postdeck_api_types::{PostInsertRow, PostPatchRow, PostRow};
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

use crate::application::repos::{PostsRepo, RepoError, page_offset};
use crate::domain::posts::{Post, PostDraft, PostPatch};

use super::client::base_url;
use super::error::InfraError;

const PREFER: &str = "Prefer";

pub struct PostgrestPostsRepo {
    client: Client,
    collection: Url,
    key: String,
}

impl PostgrestPostsRepo {
    /// `store_url` is the project URL from the credential bundle; rows live at
    /// `<store_url>/<rest_path>/<table>`.
    pub fn new(
        client: Client,
        store_url: &str,
        key: String,
        rest_path: &str,
        table: &str,
    ) -> Result<Self, InfraError> {
        let rest = base_url(store_url)?
            .join(&format!("{}/", rest_path.trim_matches('/')))
            .map_err(|err| InfraError::configuration(err.to_string()))?;
        let collection = rest
            .join(table.trim_matches('/'))
            .map_err(|err| InfraError::configuration(err.to_string()))?;
        Ok(Self {
            client,
            collection,
            key,
        })
    }

    fn request(&self, method: Method, query: &[(&str, String)]) -> RequestBuilder {
        let mut url = self.collection.clone();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        self.client
            .request(method, url)
            .header("apikey", self.key.as_str())
            .bearer_auth(&self.key)
            .header(ACCEPT, "application/json")
    }

    async fn send(req: RequestBuilder) -> Result<Response, RepoError> {
        let resp = req.send().await.map_err(RepoError::transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RepoError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn rows<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, RepoError> {
        let resp = Self::send(req).await?;
        let bytes = resp.bytes().await.map_err(RepoError::transport)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| RepoError::decode(format!("failed to parse body: {err}")))
    }
}

fn id_filter(id: i64) -> (&'static str, String) {
    ("id", format!("eq.{id}"))
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/42`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl PostsRepo for PostgrestPostsRepo {
    async fn count(&self) -> Result<u64, RepoError> {
        let req = self
            .request(Method::HEAD, &[("select", "*".to_string())])
            .header(PREFER, "count=exact");
        let resp = Self::send(req).await?;
        let header = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RepoError::decode("count response has no Content-Range header"))?;
        let total = parse_content_range_total(header)
            .ok_or_else(|| RepoError::decode(format!("unparseable Content-Range `{header}`")))?;
        debug!(total, "counted posts");
        Ok(total)
    }

    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<Post>, RepoError> {
        let query = [
            ("select", "*".to_string()),
            ("order", "id.asc".to_string()),
            ("offset", page_offset(page, page_size).to_string()),
            ("limit", page_size.to_string()),
        ];
        let rows: Vec<PostRow> = Self::rows(self.request(Method::GET, &query)).await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let query = [
            ("select", "*".to_string()),
            id_filter(id),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<PostRow> = Self::rows(self.request(Method::GET, &query)).await?;
        Ok(rows.into_iter().next().map(Post::from))
    }

    async fn create(&self, draft: &PostDraft) -> Result<Post, RepoError> {
        draft.validate()?;
        let now = OffsetDateTime::now_utc();
        let payload = PostInsertRow {
            description: draft.description.clone(),
            status: draft.status,
            images: draft.images.clone(),
            created_at: now,
            updated_at: now,
        };
        let req = self
            .request(Method::POST, &[("select", "*".to_string())])
            .header(PREFER, "return=representation")
            .json(&payload);
        let rows: Vec<PostRow> = Self::rows(req).await?;
        rows.into_iter()
            .next()
            .map(Post::from)
            .ok_or_else(|| RepoError::decode("insert returned no rows"))
    }

    async fn update(&self, id: i64, patch: &PostPatch) -> Result<(), RepoError> {
        patch.validate()?;
        let payload = PostPatchRow {
            description: patch.description.clone(),
            status: patch.status,
            images: patch.images.clone(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let req = self
            .request(Method::PATCH, &[id_filter(id)])
            .header(PREFER, "return=minimal")
            .json(&payload);
        Self::send(req).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        Self::send(self.request(Method::DELETE, &[id_filter(id)])).await?;
        Ok(())
    }
}
