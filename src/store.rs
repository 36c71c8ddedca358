use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask, User},
};

/// Repository between the domain structs and SQLite. All task queries are
/// owner-scoped: a task that exists but belongs to someone else is
/// indistinguishable from one that does not exist.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // --- Users ---

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        // The UNIQUE constraint is the source of truth: a pre-check would
        // race with a concurrent registration of the same username.
        let result =
            sqlx::query("INSERT INTO users (username, email, hashed_password) VALUES (?, ?, ?)")
                .bind(username)
                .bind(email)
                .bind(hashed_password)
                .execute(&self.pool)
                .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::ValidationError(
                    "Username already taken".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Deletes a user and every task it owns in one transaction. Ownership
    /// is exclusive, so no task survives its owner.
    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE owner_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // tx dropped here, rolling back
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    // --- Tasks ---

    pub async fn list_tasks(
        &self,
        owner: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE owner_id = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(owner)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn get_task(&self, id: i64, owner: i64) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Task not found".to_string()))?;

        Ok(task)
    }

    pub async fn create_task(&self, owner: i64, fields: CreateTask) -> Result<Task, AppError> {
        let title = fields.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError(
                "title must not be empty".to_string(),
            ));
        }

        let status = parse_enum_field::<TaskStatus>(fields.status.as_deref())?.unwrap_or_default();
        let priority =
            parse_enum_field::<TaskPriority>(fields.priority.as_deref())?.unwrap_or_default();

        let id = sqlx::query(
            "INSERT INTO tasks (title, description, status, priority, due_date, owner_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(fields.description.as_deref().unwrap_or(""))
        .bind(status)
        .bind(priority)
        .bind(fields.due_date)
        .bind(owner)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_task(id, owner).await
    }

    pub async fn update_task(
        &self,
        id: i64,
        owner: i64,
        fields: UpdateTask,
    ) -> Result<Task, AppError> {
        // Ownership check first, so a foreign task 404s before validation.
        self.get_task(id, owner).await?;

        if let Some(title) = &fields.title {
            if title.trim().is_empty() {
                return Err(AppError::ValidationError(
                    "title must not be empty".to_string(),
                ));
            }
        }

        let status = parse_enum_field::<TaskStatus>(fields.status.as_deref())?;
        let priority = parse_enum_field::<TaskPriority>(fields.priority.as_deref())?;

        // SQLx binds Option::None as NULL, so COALESCE keeps the stored value
        // for absent fields. Clearing a set due_date is not supported here.
        sqlx::query(
            "UPDATE tasks SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                due_date = COALESCE(?, due_date)
            WHERE id = ? AND owner_id = ?",
        )
        .bind(fields.title.as_deref().map(str::trim))
        .bind(&fields.description)
        .bind(status)
        .bind(priority)
        .bind(fields.due_date)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        self.get_task(id, owner).await
    }

    pub async fn delete_task(&self, id: i64, owner: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".to_string()));
        }

        Ok(())
    }
}

fn parse_enum_field<T: std::str::FromStr<Err = String>>(
    value: Option<&str>,
) -> Result<Option<T>, AppError> {
    value
        .map(str::parse::<T>)
        .transpose()
        .map_err(AppError::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_store() -> Store {
        // A single connection, or each pooled connection would get its own
        // :memory: database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Store::new(pool)
    }

    fn new_task(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_with_defaults() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();

        let created = store.create_task(alice.id, new_task("Buy milk")).await.unwrap();
        assert_eq!(created.title, "Buy milk");
        assert_eq!(created.description, "");
        assert_eq!(created.status, TaskStatus::Pending);
        assert_eq!(created.priority, TaskPriority::Medium);
        assert_eq!(created.due_date, None);
        assert_eq!(created.owner_id, alice.id);

        let fetched = store.get_task(created.id, alice.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_username_maps_to_validation_error() {
        let store = setup_store().await;
        store.create_user("alice", "", "hash").await.unwrap();

        // The UNIQUE constraint violation must not leak out as a storage
        // error (500), even when the insert itself hits it.
        assert!(matches!(
            store.create_user("alice", "", "other-hash").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn list_tasks_paginates_in_id_order() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();

        for title in ["one", "two", "three"] {
            store.create_task(alice.id, new_task(title)).await.unwrap();
        }

        let page = store.list_tasks(alice.id, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "two");

        let rest = store.list_tasks(alice.id, 2, 100).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "three");
    }

    #[tokio::test]
    async fn get_is_owner_scoped() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();
        let bob = store.create_user("bob", "", "hash").await.unwrap();

        let task = store.create_task(alice.id, new_task("secret")).await.unwrap();

        // Foreign owner and absent id are indistinguishable
        assert!(matches!(
            store.get_task(task.id, bob.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.get_task(9999, alice.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_enum_values_persist_nothing() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();

        let mut fields = new_task("Buy milk");
        fields.status = Some("done".to_string());
        assert!(matches!(
            store.create_task(alice.id, fields).await,
            Err(AppError::ValidationError(_))
        ));

        let mut fields = new_task("Buy milk");
        fields.priority = Some("urgent".to_string());
        assert!(matches!(
            store.create_task(alice.id, fields).await,
            Err(AppError::ValidationError(_))
        ));

        assert!(store.list_tasks(alice.id, 0, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();

        assert!(matches!(
            store.create_task(alice.id, new_task("   ")).await,
            Err(AppError::ValidationError(_))
        ));

        let task = store.create_task(alice.id, new_task("Buy milk")).await.unwrap();
        let update = UpdateTask {
            title: Some("".to_string()),
            ..UpdateTask::default()
        };
        assert!(matches!(
            store.update_task(task.id, alice.id, update).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();
        let task = store.create_task(alice.id, new_task("Buy milk")).await.unwrap();

        let update = UpdateTask {
            status: Some("completed".to_string()),
            ..UpdateTask::default()
        };
        let updated = store.update_task(task.id, alice.id, update).await.unwrap();

        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.priority, TaskPriority::Medium);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_its_tasks() {
        let store = setup_store().await;
        let alice = store.create_user("alice", "", "hash").await.unwrap();
        let bob = store.create_user("bob", "", "hash").await.unwrap();

        let t1 = store.create_task(alice.id, new_task("one")).await.unwrap();
        let t2 = store.create_task(alice.id, new_task("two")).await.unwrap();
        let kept = store.create_task(bob.id, new_task("mine")).await.unwrap();

        store.delete_user(alice.id).await.unwrap();

        for id in [t1.id, t2.id] {
            assert!(matches!(
                store.get_task(id, alice.id).await,
                Err(AppError::NotFound(_))
            ));
            assert!(matches!(
                store.get_task(id, bob.id).await,
                Err(AppError::NotFound(_))
            ));
        }
        assert!(store.get_task(kept.id, bob.id).await.is_ok());
        assert!(store.find_user_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_an_unknown_user_is_not_found() {
        let store = setup_store().await;
        assert!(matches!(
            store.delete_user(42).await,
            Err(AppError::NotFound(_))
        ));
    }
}
