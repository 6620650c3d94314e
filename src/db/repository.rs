// Repository pattern - all reads and writes of the public tables go through here
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use thiserror::Error;

use crate::db::models::*;
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, RepositoryError>;

    /// Insert a fresh profile, as done right after sign-up.
    async fn insert_profile(&self, seed: &ProfileSeed) -> Result<(), RepositoryError>;

    /// Insert or refresh a profile. An existing `profile_completed` flag is kept.
    async fn upsert_profile(&self, seed: &ProfileSeed) -> Result<(), RepositoryError>;

    async fn complete_profile(
        &self,
        id: &str,
        full_name: &str,
        phone_number: &str,
        avatar_url: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn update_profile(&self, id: &str, update: &ProfileUpdate)
        -> Result<(), RepositoryError>;

    async fn set_avatar(&self, id: &str, avatar_url: &str) -> Result<(), RepositoryError>;

    /// Every post with its author, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>, RepositoryError>;

    async fn posts_by_author(&self, user_id: &str) -> Result<Vec<Post>, RepositoryError>;

    async fn insert_post(&self, post: &NewPost) -> Result<Post, RepositoryError>;

    async fn update_post(&self, id: &str, update: &PostUpdate) -> Result<(), RepositoryError>;

    /// Delete a post together with its likes, saved rows and views.
    async fn delete_post(&self, id: &str) -> Result<(), RepositoryError>;

    async fn liked_post_ids(&self, user_id: &str) -> Result<HashSet<String>, RepositoryError>;

    async fn is_liked(&self, user_id: &str, post_id: &str) -> Result<bool, RepositoryError>;

    /// Bring the like relation to `liked` and return the post's like count.
    async fn set_like(
        &self,
        user_id: &str,
        post_id: &str,
        liked: bool,
    ) -> Result<i64, RepositoryError>;

    async fn saved_post_ids(&self, user_id: &str) -> Result<HashSet<String>, RepositoryError>;

    async fn is_saved(&self, user_id: &str, post_id: &str) -> Result<bool, RepositoryError>;

    async fn set_saved(
        &self,
        user_id: &str,
        post_id: &str,
        saved: bool,
    ) -> Result<(), RepositoryError>;

    /// The user's saved posts, most recently saved first.
    async fn saved_posts(&self, user_id: &str) -> Result<Vec<Post>, RepositoryError>;

    /// Count a view once per viewer. Returns true when the counter moved.
    async fn record_view(&self, viewer_id: &str, post_id: &str) -> Result<bool, RepositoryError>;

    async fn top_posts(&self, limit: usize) -> Result<Vec<Post>, RepositoryError>;

    async fn count_posts(&self) -> Result<i64, RepositoryError>;

    /// Posts created within the last `hours`.
    async fn count_posts_since(&self, hours: u32) -> Result<i64, RepositoryError>;

    /// Number of posts per stored category value.
    async fn category_counts(&self) -> Result<HashMap<String, i64>, RepositoryError>;

    /// Reset `likes_count` to the number of like rows where they disagree.
    async fn reconcile_counters(&self) -> Result<usize, RepositoryError>;
}

/// SQLite implementation
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const POST_SELECT: &str = "SELECT p.id, p.user_id, p.content, p.category, p.image_url, \
     p.likes_count, p.comments_count, p.views_count, p.created_at, p.updated_at, \
     pr.id, pr.full_name, pr.avatar_url, pr.is_owner \
     FROM posts p LEFT JOIN profiles pr ON pr.id = p.user_id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let author_id: Option<String> = row.get(10)?;
    let author = match author_id {
        Some(id) => Some(Author {
            id,
            full_name: row.get(11)?,
            avatar_url: row.get(12)?,
            is_owner: row.get(13)?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        image_url: row.get(4)?,
        likes_count: row.get(5)?,
        comments_count: row.get(6)?,
        views_count: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        author,
    })
}

fn query_posts(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Post>, RepositoryError> {
    let mut stmt = conn.prepare(sql)?;
    let posts = stmt
        .query_map(params, post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

fn query_post(conn: &Connection, id: &str) -> Result<Option<Post>, RepositoryError> {
    let post = conn
        .query_row(
            &format!("{POST_SELECT} WHERE p.id = ?1"),
            params![id],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

fn post_exists(conn: &Connection, id: &str) -> Result<bool, RepositoryError> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn relation_exists(
    conn: &Connection,
    table: &str,
    user_id: &str,
    post_id: &str,
) -> Result<bool, RepositoryError> {
    let exists = conn.query_row(
        &format!("SELECT COUNT(*) > 0 FROM {table} WHERE user_id = ?1 AND post_id = ?2"),
        params![user_id, post_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                "SELECT id, email, full_name, phone_number, avatar_url, bio, \
                 profile_completed, is_owner, created_at, updated_at \
                 FROM profiles WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Profile {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        full_name: row.get(2)?,
                        phone_number: row.get(3)?,
                        avatar_url: row.get(4)?,
                        bio: row.get(5)?,
                        profile_completed: row.get(6)?,
                        is_owner: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    async fn insert_profile(&self, seed: &ProfileSeed) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO profiles (id, email, full_name, avatar_url, is_owner, profile_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                seed.id,
                seed.email,
                seed.full_name,
                seed.avatar_url,
                seed.is_owner
            ],
        )?;
        Ok(())
    }

    async fn upsert_profile(&self, seed: &ProfileSeed) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO profiles (id, email, full_name, avatar_url, is_owner)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
               email = excluded.email,
               full_name = COALESCE(NULLIF(excluded.full_name, ''), profiles.full_name),
               avatar_url = COALESCE(NULLIF(excluded.avatar_url, ''), profiles.avatar_url),
               is_owner = MAX(profiles.is_owner, excluded.is_owner),
               updated_at = datetime('now')",
            params![
                seed.id,
                seed.email,
                seed.full_name,
                seed.avatar_url,
                seed.is_owner
            ],
        )?;
        Ok(())
    }

    async fn complete_profile(
        &self,
        id: &str,
        full_name: &str,
        phone_number: &str,
        avatar_url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles SET
               full_name = ?2,
               phone_number = ?3,
               avatar_url = COALESCE(?4, avatar_url),
               profile_completed = 1,
               updated_at = datetime('now')
             WHERE id = ?1",
            params![id, full_name, phone_number, avatar_url],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("profile {id}")));
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles SET full_name = ?2, phone_number = ?3, bio = ?4,
               updated_at = datetime('now')
             WHERE id = ?1",
            params![id, update.full_name, update.phone_number, update.bio],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("profile {id}")));
        }
        Ok(())
    }

    async fn set_avatar(&self, id: &str, avatar_url: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles SET avatar_url = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, avatar_url],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("profile {id}")));
        }
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        query_posts(
            &conn,
            &format!("{POST_SELECT} ORDER BY p.created_at DESC, p.rowid DESC"),
            [],
        )
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        query_post(&conn, id)
    }

    async fn posts_by_author(&self, user_id: &str) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        query_posts(
            &conn,
            &format!("{POST_SELECT} WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.rowid DESC"),
            params![user_id],
        )
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO posts (id, user_id, content, category, image_url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                post.user_id,
                post.content,
                post.category.map(|c| c.as_str()),
                post.image_url
            ],
        )?;
        query_post(&conn, &id)?.ok_or_else(|| RepositoryError::NotFound(format!("post {id}")))
    }

    async fn update_post(&self, id: &str, update: &PostUpdate) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE posts SET content = ?2, category = ?3, image_url = ?4,
               updated_at = datetime('now')
             WHERE id = ?1",
            params![
                id,
                update.content,
                update.category.as_str(),
                update.image_url
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("post {id}")));
        }
        Ok(())
    }

    async fn delete_post(&self, id: &str) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, id)? {
            return Err(RepositoryError::NotFound(format!("post {id}")));
        }

        let likes = tx.execute("DELETE FROM likes WHERE post_id = ?1", params![id])?;
        let saved = tx.execute("DELETE FROM saved_posts WHERE post_id = ?1", params![id])?;
        tx.execute("DELETE FROM post_views WHERE post_id = ?1", params![id])?;
        tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tx.commit()?;

        tracing::debug!(post_id = id, likes, saved, "Post deleted");
        Ok(())
    }

    async fn liked_post_ids(&self, user_id: &str) -> Result<HashSet<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT post_id FROM likes WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(ids)
    }

    async fn is_liked(&self, user_id: &str, post_id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        relation_exists(&conn, "likes", user_id, post_id)
    }

    async fn set_like(
        &self,
        user_id: &str,
        post_id: &str,
        liked: bool,
    ) -> Result<i64, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, post_id)? {
            return Err(RepositoryError::NotFound(format!("post {post_id}")));
        }

        let exists = relation_exists(&tx, "likes", user_id, post_id)?;
        if liked && !exists {
            tx.execute(
                "INSERT INTO likes (id, user_id, post_id) VALUES (?1, ?2, ?3)",
                params![uuid::Uuid::now_v7().to_string(), user_id, post_id],
            )?;
            tx.execute(
                "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1",
                params![post_id],
            )?;
        } else if !liked && exists {
            tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
            )?;
            tx.execute(
                "UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?1",
                params![post_id],
            )?;
        }

        let count: i64 = tx.query_row(
            "SELECT likes_count FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(count)
    }

    async fn saved_post_ids(&self, user_id: &str) -> Result<HashSet<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT post_id FROM saved_posts WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(ids)
    }

    async fn is_saved(&self, user_id: &str, post_id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        relation_exists(&conn, "saved_posts", user_id, post_id)
    }

    async fn set_saved(
        &self,
        user_id: &str,
        post_id: &str,
        saved: bool,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        if saved {
            if !post_exists(&conn, post_id)? {
                return Err(RepositoryError::NotFound(format!("post {post_id}")));
            }
            conn.execute(
                "INSERT OR IGNORE INTO saved_posts (id, user_id, post_id) VALUES (?1, ?2, ?3)",
                params![uuid::Uuid::now_v7().to_string(), user_id, post_id],
            )?;
        } else {
            conn.execute(
                "DELETE FROM saved_posts WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
            )?;
        }
        Ok(())
    }

    async fn saved_posts(&self, user_id: &str) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        query_posts(
            &conn,
            "SELECT p.id, p.user_id, p.content, p.category, p.image_url, \
             p.likes_count, p.comments_count, p.views_count, p.created_at, p.updated_at, \
             pr.id, pr.full_name, pr.avatar_url, pr.is_owner \
             FROM saved_posts s \
             JOIN posts p ON p.id = s.post_id \
             LEFT JOIN profiles pr ON pr.id = p.user_id \
             WHERE s.user_id = ?1 \
             ORDER BY s.created_at DESC, s.rowid DESC",
            params![user_id],
        )
    }

    async fn record_view(&self, viewer_id: &str, post_id: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, post_id)? {
            return Err(RepositoryError::NotFound(format!("post {post_id}")));
        }

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO post_views (viewer_id, post_id) VALUES (?1, ?2)",
            params![viewer_id, post_id],
        )?;
        if inserted == 1 {
            tx.execute(
                "UPDATE posts SET views_count = views_count + 1 WHERE id = ?1",
                params![post_id],
            )?;
        }
        tx.commit()?;
        Ok(inserted == 1)
    }

    async fn top_posts(&self, limit: usize) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        query_posts(
            &conn,
            &format!("{POST_SELECT} ORDER BY p.likes_count DESC, p.created_at DESC LIMIT ?1"),
            params![limit as i64],
        )
    }

    async fn count_posts(&self) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn count_posts_since(&self, hours: u32) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE created_at >= datetime('now', ?1)",
            params![format!("-{hours} hours")],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn category_counts(&self) -> Result<HashMap<String, i64>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT category, COUNT(*) FROM posts WHERE category IS NOT NULL GROUP BY category",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<String, i64>, _>>()?;
        Ok(counts)
    }

    async fn reconcile_counters(&self) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;
        let fixed = conn.execute(
            "UPDATE posts
             SET likes_count = (SELECT COUNT(*) FROM likes l WHERE l.post_id = posts.id)
             WHERE likes_count != (SELECT COUNT(*) FROM likes l WHERE l.post_id = posts.id)",
            [],
        )?;
        Ok(fixed)
    }
}
