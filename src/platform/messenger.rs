use futures::future::BoxFuture;

use crate::dto::keyboard::Keyboard;
use crate::platform::PlatformResult;

/// Outbound messaging operations the engine needs from the chat platform.
///
/// `broadcast` returns the platform id of the sent message so callers can
/// edit or pin it later. Acknowledgments answer a button press with a
/// private notification visible only to the pressing user.
pub trait Messenger: Send + Sync {
    fn broadcast(
        &self,
        conversation_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> BoxFuture<'static, PlatformResult<i64>>;
    fn edit(
        &self,
        conversation_id: i64,
        message_id: i64,
        text: String,
    ) -> BoxFuture<'static, PlatformResult<()>>;
    fn pin(&self, conversation_id: i64, message_id: i64) -> BoxFuture<'static, PlatformResult<()>>;
    fn unpin(&self, conversation_id: i64) -> BoxFuture<'static, PlatformResult<()>>;
    fn acknowledge(
        &self,
        event_id: String,
        user_id: i64,
        conversation_id: i64,
        text: String,
    ) -> BoxFuture<'static, PlatformResult<()>>;
    fn react(&self, conversation_id: i64, message_id: i64)
    -> BoxFuture<'static, PlatformResult<()>>;
}
