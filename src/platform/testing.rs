//! Recording fakes for the platform ports, shared by service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::dto::keyboard::Keyboard;
use crate::platform::directory::{UserDirectory, UserProfile};
use crate::platform::messenger::Messenger;
use crate::platform::{PlatformError, PlatformResult};

/// One broadcast captured by [`RecordingMessenger`].
#[derive(Debug, Clone)]
pub(crate) struct SentBroadcast {
    pub(crate) conversation_id: i64,
    pub(crate) text: String,
    pub(crate) keyboard: Option<Keyboard>,
    pub(crate) message_id: i64,
}

/// One acknowledgment captured by [`RecordingMessenger`].
#[derive(Debug, Clone)]
pub(crate) struct SentAck {
    pub(crate) event_id: String,
    pub(crate) user_id: i64,
    pub(crate) text: String,
}

#[derive(Default)]
struct MessengerLog {
    next_message_id: AtomicI64,
    fail_pins: AtomicBool,
    broadcasts: Mutex<Vec<SentBroadcast>>,
    edits: Mutex<Vec<(i64, i64, String)>>,
    pins: Mutex<Vec<(i64, i64)>>,
    unpins: Mutex<Vec<i64>>,
    acks: Mutex<Vec<SentAck>>,
    reactions: Mutex<Vec<(i64, i64)>>,
}

/// Messenger fake that records every outbound call and never blocks.
#[derive(Clone, Default)]
pub(crate) struct RecordingMessenger {
    log: Arc<MessengerLog>,
}

impl RecordingMessenger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `pin` calls fail.
    pub(crate) fn fail_pins(&self) {
        self.log.fail_pins.store(true, Ordering::SeqCst);
    }

    pub(crate) fn broadcasts(&self) -> Vec<SentBroadcast> {
        self.log.broadcasts.lock().unwrap().clone()
    }

    pub(crate) fn broadcast_texts(&self) -> Vec<String> {
        self.broadcasts().into_iter().map(|b| b.text).collect()
    }

    pub(crate) fn acks(&self) -> Vec<SentAck> {
        self.log.acks.lock().unwrap().clone()
    }

    pub(crate) fn ack_texts(&self) -> Vec<String> {
        self.acks().into_iter().map(|a| a.text).collect()
    }

    pub(crate) fn edits(&self) -> Vec<(i64, i64, String)> {
        self.log.edits.lock().unwrap().clone()
    }

    pub(crate) fn pins(&self) -> Vec<(i64, i64)> {
        self.log.pins.lock().unwrap().clone()
    }

    pub(crate) fn unpins(&self) -> Vec<i64> {
        self.log.unpins.lock().unwrap().clone()
    }

    pub(crate) fn reactions(&self) -> Vec<(i64, i64)> {
        self.log.reactions.lock().unwrap().clone()
    }
}

impl Messenger for RecordingMessenger {
    fn broadcast(
        &self,
        conversation_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> BoxFuture<'static, PlatformResult<i64>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            let message_id = log.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
            log.broadcasts.lock().unwrap().push(SentBroadcast {
                conversation_id,
                text,
                keyboard,
                message_id,
            });
            Ok(message_id)
        })
    }

    fn edit(
        &self,
        conversation_id: i64,
        message_id: i64,
        text: String,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            log.edits
                .lock()
                .unwrap()
                .push((conversation_id, message_id, text));
            Ok(())
        })
    }

    fn pin(&self, conversation_id: i64, message_id: i64) -> BoxFuture<'static, PlatformResult<()>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            if log.fail_pins.load(Ordering::SeqCst) {
                return Err(PlatformError::rejected("pin disabled in this chat"));
            }
            log.pins.lock().unwrap().push((conversation_id, message_id));
            Ok(())
        })
    }

    fn unpin(&self, conversation_id: i64) -> BoxFuture<'static, PlatformResult<()>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            log.unpins.lock().unwrap().push(conversation_id);
            Ok(())
        })
    }

    fn acknowledge(
        &self,
        event_id: String,
        user_id: i64,
        _conversation_id: i64,
        text: String,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            log.acks.lock().unwrap().push(SentAck {
                event_id,
                user_id,
                text,
            });
            Ok(())
        })
    }

    fn react(
        &self,
        conversation_id: i64,
        message_id: i64,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            log.reactions
                .lock()
                .unwrap()
                .push((conversation_id, message_id));
            Ok(())
        })
    }
}

/// Directory fake backed by a fixed name table.
#[derive(Clone, Default)]
pub(crate) struct StaticDirectory {
    names: Arc<HashMap<i64, String>>,
    fail_lookups: bool,
}

impl StaticDirectory {
    pub(crate) fn with_names(entries: &[(i64, &str)]) -> Self {
        Self {
            names: Arc::new(
                entries
                    .iter()
                    .map(|(id, name)| (*id, (*name).to_string()))
                    .collect(),
            ),
            fail_lookups: false,
        }
    }

    /// Directory whose every lookup fails with a platform error.
    pub(crate) fn failing() -> Self {
        Self {
            names: Arc::new(HashMap::new()),
            fail_lookups: true,
        }
    }
}

impl UserDirectory for StaticDirectory {
    fn lookup(&self, user_id: i64) -> BoxFuture<'static, PlatformResult<Option<UserProfile>>> {
        let names = Arc::clone(&self.names);
        let fail = self.fail_lookups;
        Box::pin(async move {
            if fail {
                return Err(PlatformError::rejected("directory offline"));
            }
            Ok(names.get(&user_id).map(|name| UserProfile {
                user_id,
                display_name: name.clone(),
            }))
        })
    }
}
