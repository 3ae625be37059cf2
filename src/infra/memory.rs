//! In-process backend used for the offline demo and the test-suite.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::auth::{AuthError, AuthGateway, AuthUser, Session};
use crate::application::repos::{PostListScope, PostsRepo, RepoError};
use crate::domain::posts::{BlogPost, NewPost, seed_posts};

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryPosts {
    posts: RwLock<Vec<BlogPost>>,
}

impl MemoryPosts {
    pub fn new(posts: Vec<BlogPost>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }

    /// Store pre-filled with the demo posts.
    pub fn seeded() -> Self {
        Self::new(seed_posts())
    }
}

#[async_trait]
impl PostsRepo for MemoryPosts {
    async fn list_posts(
        &self,
        _viewer: Option<&Session>,
        scope: PostListScope,
    ) -> Result<Vec<BlogPost>, RepoError> {
        let mut posts: Vec<BlogPost> = read(&self.posts)
            .iter()
            .filter(|post| scope.includes_unpublished() || post.is_published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn find_post(
        &self,
        _viewer: Option<&Session>,
        id: Uuid,
    ) -> Result<Option<BlogPost>, RepoError> {
        Ok(read(&self.posts).iter().find(|post| post.id == id).cloned())
    }

    async fn create_post(&self, _session: &Session, post: NewPost) -> Result<BlogPost, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = BlogPost {
            id: Uuid::new_v4(),
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            author_name: post.author_name,
            author_avatar: post.author_avatar,
            published_at: now,
            reading_time: post.reading_time,
            category: post.category,
            tags: post.tags,
            cover_image: post.cover_image,
            is_published: post.is_published,
            created_at: Some(now),
            updated_at: Some(now),
        };
        write(&self.posts).push(record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        _session: &Session,
        id: Uuid,
        post: NewPost,
    ) -> Result<BlogPost, RepoError> {
        let mut posts = write(&self.posts);
        let existing = posts
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or(RepoError::NotFound)?;

        existing.title = post.title;
        existing.excerpt = post.excerpt;
        existing.content = post.content;
        existing.author_name = post.author_name;
        existing.author_avatar = post.author_avatar;
        existing.reading_time = post.reading_time;
        existing.category = post.category;
        existing.tags = post.tags;
        existing.cover_image = post.cover_image;
        existing.is_published = post.is_published;
        existing.updated_at = Some(OffsetDateTime::now_utc());

        Ok(existing.clone())
    }

    async fn delete_post(&self, _session: &Session, id: Uuid) -> Result<(), RepoError> {
        let mut posts = write(&self.posts);
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

/// Password accounts held in memory; tokens are random UUIDs.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    accounts: RwLock<HashMap<String, Account>>,
    tokens: RwLock<HashMap<String, AuthUser>>,
}

impl MemoryAuth {
    /// Auth backend with a single admin account.
    pub fn new(admin_email: &str, admin_password: &str) -> Self {
        Self::default().with_account(admin_email, admin_password, true)
    }

    pub fn with_account(self, email: &str, password: &str, is_admin: bool) -> Self {
        let email = email.trim().to_lowercase();
        write(&self.accounts).insert(
            email.clone(),
            Account {
                password: password.to_string(),
                user: AuthUser {
                    id: Uuid::new_v4(),
                    email: Some(email),
                    is_admin,
                },
            },
        );
        self
    }
}

#[async_trait]
impl AuthGateway for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = read(&self.accounts)
            .get(&email.trim().to_lowercase())
            .filter(|account| account.password == password)
            .map(|account| account.user.clone())
            .ok_or(AuthError::InvalidCredentials)?;

        let access_token = Uuid::new_v4().simple().to_string();
        write(&self.tokens).insert(access_token.clone(), user.clone());
        Ok(Session { access_token, user })
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(read(&self.tokens).get(token).cloned())
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        write(&self.tokens).remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "t".into(),
            user: AuthUser {
                id: Uuid::nil(),
                email: None,
                is_admin: true,
            },
        }
    }

    fn new_post(title: &str, is_published: bool) -> NewPost {
        NewPost {
            title: title.into(),
            excerpt: "excerpt".into(),
            content: "content".into(),
            category: "Design".into(),
            tags: vec![],
            cover_image: None,
            reading_time: 3,
            is_published,
            author_name: "Admin".into(),
            author_avatar: None,
        }
    }

    #[tokio::test]
    async fn public_scope_hides_unpublished_posts() {
        let repo = MemoryPosts::seeded();
        repo.create_post(&session(), new_post("Hidden", false))
            .await
            .expect("create");

        let public = repo.list_posts(None, PostListScope::Public).await.expect("list");
        let admin = repo.list_posts(None, PostListScope::Admin).await.expect("list");
        assert_eq!(public.len() + 1, admin.len());
        assert!(public.iter().all(|post| post.is_published));
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let repo = MemoryPosts::seeded();
        let created = repo
            .create_post(&session(), new_post("Newest", true))
            .await
            .expect("create");

        let posts = repo.list_posts(None, PostListScope::Public).await.expect("list");
        assert_eq!(posts[0].id, created.id);
        assert!(
            posts
                .windows(2)
                .all(|pair| pair[0].published_at >= pair[1].published_at)
        );
    }

    #[tokio::test]
    async fn update_keeps_identity_and_publication_date() {
        let repo = MemoryPosts::seeded();
        let original = seed_posts()[1].clone();

        let updated = repo
            .update_post(&session(), original.id, new_post("Renamed", true))
            .await
            .expect("update");
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.published_at, original.published_at);
        assert_eq!(updated.title, "Renamed");
        assert!(updated.updated_at > original.updated_at);
    }

    #[tokio::test]
    async fn deleting_unknown_post_reports_not_found() {
        let repo = MemoryPosts::seeded();
        let err = repo
            .delete_post(&session(), Uuid::from_u128(404))
            .await
            .expect_err("missing");
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn credentials_are_checked() {
        let auth =
            MemoryAuth::new("Admin@BlogHub.dev", "pw").with_account("reader@x.dev", "r", false);

        assert!(matches!(
            auth.sign_in("admin@bloghub.dev", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        let reader = auth.sign_in("reader@x.dev", "r").await.expect("reader");
        assert!(!reader.user.is_admin);
    }
}
