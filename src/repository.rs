use crate::models::{AccessRequest, Post, PostPayload, UpdateAccessRequest, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, in-memory).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
///
/// Store failures propagate as `sqlx::Error`; handlers convert them to the
/// API failure taxonomy. Nothing is swallowed at this layer.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Post Retrieval ---
    // Public listing: every post, newest first.
    async fn get_posts(&self) -> Result<Vec<Post>, sqlx::Error>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error>;
    // Admin listing: every post regardless of author, newest first, paged.
    async fn get_all_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error>;
    // Owner listing: only posts whose author_email matches, newest first, paged.
    async fn get_posts_by_author(
        &self,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error>;

    // --- Post Actions ---
    // The payload arrives with its category already resolved; `author_email`
    // is the authenticated caller, never a payload value.
    async fn create_post(&self, req: PostPayload, author_email: &str)
    -> Result<Post, sqlx::Error>;
    // Full-document replace of the payload fields. The stored author_email is
    // untouched. Returns None when the id is unknown.
    async fn update_post(&self, id: Uuid, req: PostPayload) -> Result<Option<Post>, sqlx::Error>;
    // Returns true if a row was removed.
    async fn delete_post(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Access Requests ---
    // Atomic insert-if-absent keyed on the unique email index. Returns
    // Ok(None) when a request with the same email already exists; there is no
    // separate existence check, so concurrent submissions cannot both win.
    async fn create_access_request(
        &self,
        req: AccessRequest,
    ) -> Result<Option<AccessRequest>, sqlx::Error>;
    async fn get_access_requests(&self) -> Result<Vec<AccessRequest>, sqlx::Error>;
    async fn get_access_request(&self, id: Uuid) -> Result<Option<AccessRequest>, sqlx::Error>;
    // Partial merge: only fields present in the payload overwrite stored values.
    async fn update_access_request(
        &self,
        id: Uuid,
        req: UpdateAccessRequest,
    ) -> Result<Option<AccessRequest>, sqlx::Error>;
    async fn delete_access_request(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Users ---
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;
    // Grants publishing permission to every account in the list; returns the
    // number of rows touched.
    async fn allow_creation(&self, emails: &[String]) -> Result<u64, sqlx::Error>;
    async fn toggle_user_permission(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Column list shared by every `posts` query that returns whole rows.
const POST_COLUMNS: &str = "id, title, category, custom_category, featured, author_email, \
                            author_name, author_link, sections, created_at, updated_at";

/// Column list for `access_requests` rows.
const REQUEST_COLUMNS: &str =
    "id, email, full_name, country, state, profession, phone, social_link, created_at, updated_at";

/// Column list for `users` rows.
const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_admin, is_allowed_to_create, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
/// Post sections live in a JSONB column and are decoded through `#[sqlx(json)]`
/// on the model.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_posts(&self) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC");
        sqlx::query_as::<_, Post>(&query).fetch_all(&self.pool).await
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_all_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_posts_by_author(
        &self,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_email = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(email)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn create_post(
        &self,
        req: PostPayload,
        author_email: &str,
    ) -> Result<Post, sqlx::Error> {
        let new_id = Uuid::new_v4();
        let query = format!(
            "INSERT INTO posts (id, title, category, custom_category, featured, author_email, \
                                author_name, author_link, sections, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) \
             RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(new_id)
            .bind(&req.title)
            .bind(&req.category)
            .bind(&req.custom_category)
            .bind(req.featured)
            .bind(author_email)
            .bind(&req.author_name)
            .bind(&req.author_link)
            .bind(sqlx::types::Json(&req.sections))
            .fetch_one(&self.pool)
            .await
    }

    async fn update_post(&self, id: Uuid, req: PostPayload) -> Result<Option<Post>, sqlx::Error> {
        // author_email is deliberately absent from the SET list.
        let query = format!(
            "UPDATE posts \
             SET title = $2, category = $3, custom_category = $4, featured = $5, \
                 author_name = $6, author_link = $7, sections = $8, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(&req.title)
            .bind(&req.category)
            .bind(&req.custom_category)
            .bind(req.featured)
            .bind(&req.author_name)
            .bind(&req.author_link)
            .bind(sqlx::types::Json(&req.sections))
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_access_request(
        &self,
        req: AccessRequest,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        // ON CONFLICT DO NOTHING + RETURNING: a duplicate email inserts no row
        // and yields no result, which the handler maps to the conflict class.
        let query = format!(
            "INSERT INTO access_requests (id, email, full_name, country, state, profession, \
                                          phone, social_link, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(req.id)
            .bind(&req.email)
            .bind(&req.full_name)
            .bind(&req.country)
            .bind(&req.state)
            .bind(&req.profession)
            .bind(&req.phone)
            .bind(&req.social_link)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_access_requests(&self) -> Result<Vec<AccessRequest>, sqlx::Error> {
        let query =
            format!("SELECT {REQUEST_COLUMNS} FROM access_requests ORDER BY created_at DESC");
        sqlx::query_as::<_, AccessRequest>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_access_request(&self, id: Uuid) -> Result<Option<AccessRequest>, sqlx::Error> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM access_requests WHERE id = $1");
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_access_request(
        &self,
        id: Uuid,
        req: UpdateAccessRequest,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        // COALESCE keeps stored values for fields the payload omitted.
        let query = format!(
            "UPDATE access_requests \
             SET email = COALESCE($2, email), \
                 full_name = COALESCE($3, full_name), \
                 country = COALESCE($4, country), \
                 state = COALESCE($5, state), \
                 profession = COALESCE($6, profession), \
                 phone = COALESCE($7, phone), \
                 social_link = COALESCE($8, social_link), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .bind(&req.email)
            .bind(&req.full_name)
            .bind(&req.country)
            .bind(&req.state)
            .bind(&req.profession)
            .bind(&req.phone)
            .bind(&req.social_link)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_access_request(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash, is_admin, \
                                is_allowed_to_create, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .bind(user.is_allowed_to_create)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(&self.pool).await
    }

    async fn allow_creation(&self, emails: &[String]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_allowed_to_create = TRUE WHERE email = ANY($1)")
            .bind(emails)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn toggle_user_permission(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET is_allowed_to_create = NOT is_allowed_to_create \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let query = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

// --- In-Memory Implementation (For Tests) ---

#[derive(Default)]
struct MemoryState {
    posts: Vec<Post>,
    requests: Vec<AccessRequest>,
    users: Vec<User>,
}

/// MemoryRepository
///
/// An in-memory implementation of `Repository` used by the integration tests,
/// so the full HTTP surface can be exercised without a running Postgres
/// instance. Rows are kept in insertion order; newest-first listings iterate
/// in reverse. The single mutex gives the same insert-if-absent atomicity the
/// unique index provides in Postgres.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_posts(&self) -> Result<Vec<Post>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.iter().rev().cloned().collect())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_all_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_posts_by_author(
        &self,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|p| p.author_email == email)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn create_post(
        &self,
        req: PostPayload,
        author_email: &str,
    ) -> Result<Post, sqlx::Error> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: req.title,
            category: req.category,
            custom_category: req.custom_category,
            featured: req.featured,
            author_email: author_email.to_string(),
            author_name: req.author_name,
            author_link: req.author_link,
            sections: req.sections,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.lock().unwrap();
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, req: PostPayload) -> Result<Option<Post>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = req.title;
        post.category = req.category;
        post.custom_category = req.custom_category;
        post.featured = req.featured;
        post.author_name = req.author_name;
        post.author_link = req.author_link;
        post.sections = req.sections;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        Ok(state.posts.len() < before)
    }

    async fn create_access_request(
        &self,
        req: AccessRequest,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        // Existence check and insert happen under the same lock.
        if state.requests.iter().any(|r| r.email == req.email) {
            return Ok(None);
        }
        let now = Utc::now();
        let stored = AccessRequest {
            created_at: now,
            updated_at: now,
            ..req
        };
        state.requests.push(stored.clone());
        Ok(Some(stored))
    }

    async fn get_access_requests(&self) -> Result<Vec<AccessRequest>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.iter().rev().cloned().collect())
    }

    async fn get_access_request(&self, id: Uuid) -> Result<Option<AccessRequest>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn update_access_request(
        &self,
        id: Uuid,
        req: UpdateAccessRequest,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(email) = req.email {
            stored.email = email;
        }
        if let Some(full_name) = req.full_name {
            stored.full_name = full_name;
        }
        if let Some(country) = req.country {
            stored.country = country;
        }
        if let Some(state_field) = req.state {
            stored.state = state_field;
        }
        if let Some(profession) = req.profession {
            stored.profession = profession;
        }
        if let Some(phone) = req.phone {
            stored.phone = Some(phone);
        }
        if let Some(social_link) = req.social_link {
            stored.social_link = social_link;
        }
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_access_request(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let before = state.requests.len();
        state.requests.retain(|r| r.id != id);
        Ok(state.requests.len() < before)
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        let stored = User {
            created_at: Utc::now(),
            ..user
        };
        let mut state = self.state.lock().unwrap();
        state.users.push(stored.clone());
        Ok(stored)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().rev().cloned().collect())
    }

    async fn allow_creation(&self, emails: &[String]) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let mut touched = 0;
        for user in state.users.iter_mut() {
            if emails.contains(&user.email) {
                user.is_allowed_to_create = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn toggle_user_permission(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.is_allowed_to_create = !user.is_allowed_to_create;
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(pos) = state.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        Ok(Some(state.users.remove(pos)))
    }
}
