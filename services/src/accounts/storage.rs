use super::{Account, Role};
use crate::error::{StorageResultExt as _, StoreError};
use chrono::Utc;
use sqlx::SqlitePool;

const ACCOUNT_COLUMNS: &str = "id, username, email, admin, uploader, created, last_login";

pub async fn create(pool: &SqlitePool, username: &str, email: &str) -> Result<Account, StoreError> {
    if username.trim().is_empty() {
        return Err(StoreError::Validation("username is empty".to_owned()));
    }
    let now = Utc::now();

    let account = sqlx::query_as::<_, Account>(&format!(
        r#"
        INSERT INTO users (username, email, created, last_login)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(username) DO NOTHING
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(email)
    .bind(now)
    .bind(now)
    .fetch_optional(pool)
    .await
    .during("inserting account")?
    .ok_or_else(|| StoreError::AlreadyExists(format!("account '{username}'")))?;

    tracing::info!(username, "Account created");
    Ok(account)
}

pub async fn get(pool: &SqlitePool, username: &str) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .during("loading account")?
    .ok_or_else(|| StoreError::NotFound(format!("account '{username}'")))
}

/// All accounts, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<Account>, StoreError> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY created DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
    .during("listing accounts")
}

/// Removes an account. Its comments survive as anonymous comments.
pub async fn delete(pool: &SqlitePool, username: &str) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await
        .during("deleting account")?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("account '{username}'")));
    }
    tracing::info!(username, "Account deleted");
    Ok(())
}

pub async fn set_role(
    pool: &SqlitePool,
    username: &str,
    role: Role,
    granted: bool,
) -> Result<(), StoreError> {
    let result = sqlx::query(&format!(
        "UPDATE users SET {} = ? WHERE username = ?",
        role.column()
    ))
    .bind(granted)
    .bind(username)
    .execute(pool)
    .await
    .during("updating account role")?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("account '{username}'")));
    }
    tracing::info!(username, %role, granted, "Account role updated");
    Ok(())
}

pub async fn set_admin(pool: &SqlitePool, username: &str, admin: bool) -> Result<(), StoreError> {
    set_role(pool, username, Role::Admin, admin).await
}

pub async fn set_uploader(
    pool: &SqlitePool,
    username: &str,
    uploader: bool,
) -> Result<(), StoreError> {
    set_role(pool, username, Role::Uploader, uploader).await
}

/// Flips a role in one statement and returns the new value.
pub async fn toggle_role(pool: &SqlitePool, username: &str, role: Role) -> Result<bool, StoreError> {
    let column = role.column();
    sqlx::query_scalar::<_, bool>(&format!(
        "UPDATE users SET {column} = NOT {column} WHERE username = ? RETURNING {column}"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .during("toggling account role")?
    .ok_or_else(|| StoreError::NotFound(format!("account '{username}'")))
}

pub async fn touch_login(pool: &SqlitePool, username: &str) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE users SET last_login = ? WHERE username = ?")
        .bind(Utc::now())
        .bind(username)
        .execute(pool)
        .await
        .during("recording login")?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("account '{username}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::create_pool;

    async fn pool() -> SqlitePool {
        create_pool(&Config::new_for_test())
            .await
            .expect("pool should open")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = pool().await;
        let created = create(&pool, "alice", "alice@example.org")
            .await
            .expect("create should succeed");

        let loaded = get(&pool, "alice").await.expect("get should succeed");
        assert_eq!(created, loaded);
        assert!(!loaded.admin);
        assert!(!loaded.uploader);
    }

    #[tokio::test]
    async fn test_duplicate_username_already_exists() {
        let pool = pool().await;
        create(&pool, "alice", "").await.expect("first create");

        let err = create(&pool, "alice", "").await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_roles_can_be_set_and_toggled() {
        let pool = pool().await;
        create(&pool, "bob", "").await.expect("create");

        set_uploader(&pool, "bob", true).await.expect("set uploader");
        assert!(toggle_role(&pool, "bob", Role::Admin).await.expect("toggle"));
        assert!(!toggle_role(&pool, "bob", Role::Admin).await.expect("toggle"));

        let bob = get(&pool, "bob").await.expect("get");
        assert!(bob.uploader);
        assert!(!bob.admin);
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let pool = pool().await;

        assert!(get(&pool, "ghost").await.unwrap_err().is_not_found());
        assert!(delete(&pool, "ghost").await.unwrap_err().is_not_found());
        assert!(set_admin(&pool, "ghost", true).await.unwrap_err().is_not_found());
        assert!(touch_login(&pool, "ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_deleting_account_keeps_comments_anonymously() {
        let pool = pool().await;
        create(&pool, "carol", "").await.expect("create");
        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, post_time, uploader) VALUES ('p', '2024-01-01T00:00:00Z', 'u') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .expect("post insert should succeed");
        crate::comments::storage::add(&pool, post_id, Some("carol"), "hi")
            .await
            .expect("comment");

        delete(&pool, "carol").await.expect("delete");

        let comments = crate::comments::storage::list_for_post(&pool, post_id)
            .await
            .expect("list");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_anonymous());
    }
}
