use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::auth::Session;
use crate::application::repos::{PostListScope, PostsRepo, RepoError};
use crate::domain::posts::{BlogPost, NewPost};

use super::{BackendClient, repo_error};

const SERVICE: &str = "posts";
const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Serialize)]
struct InsertRow<'a> {
    #[serde(flatten)]
    post: &'a NewPost,
    #[serde(with = "time::serde::rfc3339")]
    published_at: OffsetDateTime,
}

#[derive(Serialize)]
struct UpdateRow<'a> {
    #[serde(flatten)]
    post: &'a NewPost,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// Posts stored in the hosted table, read and written over its REST API.
pub struct RemotePosts {
    client: BackendClient,
    path: String,
}

impl RemotePosts {
    pub fn new(client: BackendClient, table: &str) -> Self {
        Self {
            client,
            path: format!("rest/v1/{table}"),
        }
    }

    fn id_filter(id: Uuid) -> (&'static str, String) {
        ("id", format!("eq.{id}"))
    }

    async fn fetch(
        &self,
        viewer: Option<&Session>,
        query: &[(&str, String)],
    ) -> Result<Vec<BlogPost>, RepoError> {
        let request = self
            .client
            .request(
                Method::GET,
                &self.path,
                query,
                viewer.map(|session| session.access_token.as_str()),
            )
            .map_err(repo_error)?;
        self.client
            .send_json(SERVICE, request)
            .await
            .map_err(repo_error)
    }

    async fn write<B: Serialize + Sync>(
        &self,
        method: Method,
        session: &Session,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Vec<BlogPost>, RepoError> {
        let mut request = self
            .client
            .request(method, &self.path, query, Some(&session.access_token))
            .map_err(repo_error)?
            .header(PREFER_HEADER, RETURN_REPRESENTATION);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.client
            .send_json(SERVICE, request)
            .await
            .map_err(repo_error)
    }
}

#[async_trait]
impl PostsRepo for RemotePosts {
    async fn list_posts(
        &self,
        viewer: Option<&Session>,
        scope: PostListScope,
    ) -> Result<Vec<BlogPost>, RepoError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "published_at.desc".to_string()),
        ];
        if !scope.includes_unpublished() {
            query.push(("is_published", "eq.true".to_string()));
        }
        self.fetch(viewer, &query).await
    }

    async fn find_post(
        &self,
        viewer: Option<&Session>,
        id: Uuid,
    ) -> Result<Option<BlogPost>, RepoError> {
        let query = [
            ("select", "*".to_string()),
            Self::id_filter(id),
            ("limit", "1".to_string()),
        ];
        Ok(self.fetch(viewer, &query).await?.into_iter().next())
    }

    async fn create_post(&self, session: &Session, post: NewPost) -> Result<BlogPost, RepoError> {
        let row = InsertRow {
            post: &post,
            published_at: OffsetDateTime::now_utc(),
        };
        self.write(Method::POST, session, &[], Some(&row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Persistence("insert returned no row".to_string()))
    }

    async fn update_post(
        &self,
        session: &Session,
        id: Uuid,
        post: NewPost,
    ) -> Result<BlogPost, RepoError> {
        let row = UpdateRow {
            post: &post,
            updated_at: OffsetDateTime::now_utc(),
        };
        self.write(Method::PATCH, session, &[Self::id_filter(id)], Some(&row))
            .await?
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, session: &Session, id: Uuid) -> Result<(), RepoError> {
        let deleted = self
            .write::<()>(Method::DELETE, session, &[Self::id_filter(id)], None)
            .await?;
        if deleted.is_empty() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
