use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewNotification, Notification, NotificationId, NotificationUpdate},
    store::{NotificationQueryFilter, NotificationStoreError},
};

/// Inserts a new notification using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to, and pass `&mut *tx` as the connection argument.
pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, NotificationStoreError> {
    let record: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (user_uid, title, message, device_token)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(notification.user_uid)
    .bind(notification.title)
    .bind(notification.message)
    .bind(notification.device_token)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Notification #{} saved for user {}", record.id, record.user_uid);
    Ok(record)
}

pub async fn fetch_notification_by_id(
    id: NotificationId,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    let notification =
        sqlx::query_as("SELECT * FROM notifications WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(notification)
}

/// Fetches notifications according to criteria specified in the `NotificationQueryFilter`
///
/// Results are ordered by `id` in ascending order
pub async fn search_notifications(
    query: NotificationQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM notifications ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_uid) = query.user_uid {
        where_clause.push("user_uid = ");
        where_clause.push_bind_unseparated(user_uid);
    }
    if let Some(is_view) = query.is_view {
        where_clause.push("is_view = ");
        where_clause.push_bind_unseparated(is_view);
    }
    builder.push(" ORDER BY id ASC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let notifications = builder.build_query_as::<Notification>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_notifications: {} records", notifications.len());
    Ok(notifications)
}

/// Applies the fields that are set in `update` and bumps `updated_at`. An empty update leaves the record untouched.
pub async fn update_notification(
    id: NotificationId,
    update: NotificationUpdate,
    conn: &mut SqliteConnection,
) -> Result<Notification, NotificationStoreError> {
    if update.is_empty() {
        return fetch_notification_by_id(id, conn).await?.ok_or(NotificationStoreError::NotificationNotFound(id));
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE notifications SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(title) = update.title {
        set_clause.push("title = ");
        set_clause.push_bind_unseparated(title);
    }
    if let Some(message) = update.message {
        set_clause.push("message = ");
        set_clause.push_bind_unseparated(message);
    }
    if let Some(device_token) = update.device_token {
        set_clause.push("device_token = ");
        set_clause.push_bind_unseparated(device_token);
    }
    if let Some(user_uid) = update.user_uid {
        set_clause.push("user_uid = ");
        set_clause.push_bind_unseparated(user_uid);
    }
    if let Some(is_view) = update.is_view {
        set_clause.push("is_view = ");
        set_clause.push_bind_unseparated(is_view);
    }
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build_query_as::<Notification>().fetch_optional(conn).await?;
    result.ok_or(NotificationStoreError::NotificationNotFound(id))
}

pub async fn delete_notification(id: NotificationId, conn: &mut SqliteConnection) -> Result<(), NotificationStoreError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(NotificationStoreError::NotificationNotFound(id));
    }
    debug!("🗃️ Notification #{id} deleted");
    Ok(())
}
