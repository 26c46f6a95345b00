use crate::processing::RenderBuffer;
use serde::{Deserialize, Serialize};

/// Control messages from the host context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostCommand {
    Start,
    ForceSave,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Notifications to the host context.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostEvent {
    Status {
        payload: ConnectionStatus,
    },
    #[serde(rename_all = "camelCase")]
    ReconnectScheduled {
        attempt: u32,
        delay_ms: u64,
    },
    /// Ownership of `buffer` moves to the receiver.
    UpdateRender {
        buffer: RenderBuffer,
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{EntityRecord, RenderBufferBuilder};
    use serde_json::json;

    #[test]
    fn commands_parse_from_host_json() {
        let start: HostCommand = serde_json::from_str(r#"{"type":"START"}"#).unwrap();
        let save: HostCommand = serde_json::from_str(r#"{"type":"FORCE_SAVE"}"#).unwrap();
        assert_eq!(start, HostCommand::Start);
        assert_eq!(save, HostCommand::ForceSave);
        assert!(serde_json::from_str::<HostCommand>(r#"{"type":"REBOOT"}"#).is_err());
    }

    #[test]
    fn events_serialize_to_host_json() {
        let status = HostEvent::Status {
            payload: ConnectionStatus::Connected,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"type": "STATUS", "payload": "CONNECTED"})
        );

        let mut builder = RenderBufferBuilder::with_rows(1);
        builder.push(&EntityRecord {
            id: 1,
            lat: 37.5,
            lng: -122.0,
            status: 1,
            last_update: 0,
            is_moving: true,
        });
        let render = HostEvent::UpdateRender {
            buffer: builder.finish(),
            count: 1,
        };
        assert_eq!(
            serde_json::to_value(&render).unwrap(),
            json!({"type": "UPDATE_RENDER", "buffer": [1.0, -122.0, 37.5, 1.0, 1.0], "count": 1})
        );

        let retry = HostEvent::ReconnectScheduled {
            attempt: 2,
            delay_ms: 2_000,
        };
        assert_eq!(
            serde_json::to_value(&retry).unwrap(),
            json!({"type": "RECONNECT_SCHEDULED", "attempt": 2, "delayMs": 2000})
        );
    }
}
