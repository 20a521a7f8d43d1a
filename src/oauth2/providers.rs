use std::collections::HashMap;

use crate::error::Error;

use super::model::OAuthAppConfig;

/// Read-only view of registered OAuth applications.
pub trait ApplicationProvider: Send + Sync {
    /// Fails with [`Error::ApplicationNotFound`] for unknown clients.
    fn get_oauth_app(&self, client_id: &str) -> Result<OAuthAppConfig, Error>;
}

/// A stored user. `attributes` holds the raw JSON attribute document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub attributes: Option<Vec<u8>>,
}

/// Read-only view of users and their group memberships.
pub trait UserProvider: Send + Sync {
    fn get_user(&self, user_id: &str) -> Result<UserRecord, Error>;

    /// Names of the groups `user_id` belongs to, one page at a time.
    fn get_user_groups(&self, user_id: &str, limit: usize, offset: usize)
        -> Result<Vec<String>, Error>;
}

impl ApplicationProvider for HashMap<String, OAuthAppConfig> {
    fn get_oauth_app(&self, client_id: &str) -> Result<OAuthAppConfig, Error> {
        self.get(client_id)
            .cloned()
            .ok_or_else(|| Error::ApplicationNotFound(client_id.to_string()))
    }
}

impl<T: ApplicationProvider + ?Sized> ApplicationProvider for std::sync::Arc<T> {
    fn get_oauth_app(&self, client_id: &str) -> Result<OAuthAppConfig, Error> {
        (**self).get_oauth_app(client_id)
    }
}

impl<T: UserProvider + ?Sized> UserProvider for std::sync::Arc<T> {
    fn get_user(&self, user_id: &str) -> Result<UserRecord, Error> {
        (**self).get_user(user_id)
    }

    fn get_user_groups(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>, Error> {
        (**self).get_user_groups(user_id, limit, offset)
    }
}
