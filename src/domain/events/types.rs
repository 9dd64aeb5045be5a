//! Event discriminators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ChatError, DataError};

/// Declares the closed `EventType` set with its wire names and direction.
macro_rules! event_types {
    ($($variant:ident => $wire:literal, $direction:ident;)*) => {
        /// Wire `eventType` of an envelope.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventType {
            $(
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        impl EventType {
            pub const ALL: &'static [EventType] = &[$(EventType::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EventType::$variant => $wire,)*
                }
            }

            /// True for events the server sends to the client.
            pub fn is_inbound(&self) -> bool {
                match self {
                    $(EventType::$variant => matches!(Direction::$direction, Direction::Inbound),)*
                }
            }
        }

        impl FromStr for EventType {
            type Err = ChatError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(EventType::$variant),)*
                    other => Err(ChatError::InvalidData(DataError::UnsupportedEvent(other.to_string()))),
                }
            }
        }
    };
}

enum Direction {
    Inbound,
    Outbound,
}

event_types! {
    // Server to client
    MessageCreated => "MessageCreated", Inbound;
    MessageReadChanged => "MessageReadChanged", Inbound;
    MoreMessagesLoaded => "MoreMessagesLoaded", Inbound;
    ThreadRecovered => "ThreadRecovered", Inbound;
    ThreadListFetched => "ThreadListFetched", Inbound;
    ThreadMetadataLoaded => "ThreadMetadataLoaded", Inbound;
    TokenRefreshed => "TokenRefreshed", Inbound;
    CustomerAuthorized => "CustomerAuthorized", Inbound;
    ContactInboxAssigneeChanged => "CaseInboxAssigneeChanged", Inbound;

    // Client to server
    AuthorizeCustomer => "AuthorizeCustomer", Outbound;
    ReconnectCustomer => "ReconnectCustomer", Outbound;
    RefreshToken => "RefreshToken", Outbound;
    SendMessage => "SendMessage", Outbound;
    SendTranscript => "SendTranscript", Outbound;
    RecoverThread => "RecoverLivechat", Outbound;
    FetchThreadList => "FetchThreadList", Outbound;
    LoadThreadMetadata => "LoadThreadMetadata", Outbound;
    LoadMoreMessages => "LoadMoreMessages", Outbound;
    ArchiveThread => "ArchiveThread", Outbound;
    MessageSeenByCustomer => "MessageSeenByCustomer", Outbound;
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire `eventObject`: the kind of entity an event applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventObject {
    Message,
    Thread,
    Case,
    Customer,
    Contact,
    ChatWindowEvent,
}
