use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationQueryFilter {
    pub user_uid: Option<String>,
    pub is_view: Option<bool>,
    pub limit: Option<u32>,
}

impl NotificationQueryFilter {
    pub fn with_user_uid<S: Into<String>>(mut self, user_uid: S) -> Self {
        self.user_uid = Some(user_uid.into());
        self
    }

    pub fn with_viewed(mut self, is_view: bool) -> Self {
        self.is_view = Some(is_view);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True if no WHERE clause is needed. The limit does not count.
    pub fn is_empty(&self) -> bool {
        self.user_uid.is_none() && self.is_view.is_none()
    }
}
