//! `SqliteDatabase` is a concrete implementation of a notification store backend.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, notifications, MIGRATOR};
use crate::{
    db_types::{NewNotification, Notification, NotificationId, NotificationUpdate},
    store::{NotificationManagement, NotificationQueryFilter, NotificationStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn fetch_notifications(
        &self,
        filter: NotificationQueryFilter,
    ) -> Result<Vec<Notification>, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::search_notifications(filter, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_notification(&self, id: NotificationId) -> Result<Option<Notification>, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_notification_by_id(id, &mut conn).await?;
        Ok(result)
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_notification(notification, &mut conn).await
    }

    async fn update_notification(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<Notification, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        notifications::update_notification(id, update, &mut conn).await
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<(), NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        notifications::delete_notification(id, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        MIGRATOR.run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
