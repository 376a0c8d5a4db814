use futures::future::BoxFuture;

use crate::platform::PlatformResult;

/// Profile data returned by the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Platform user identifier.
    pub user_id: i64,
    /// Name the platform shows in chats.
    pub display_name: String,
}

/// Lookup of platform user profiles.
pub trait UserDirectory: Send + Sync {
    /// Resolve a user profile, `None` when the platform does not know the user.
    fn lookup(&self, user_id: i64) -> BoxFuture<'static, PlatformResult<Option<UserProfile>>>;
}
