use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::constants::{
    CLIENT_BUILD_NUMBER, CLIENT_PROPERTIES_BROWSER, CLIENT_PROPERTIES_BROWSER_VERSION,
    CLIENT_PROPERTIES_DEVICE, CLIENT_PROPERTIES_LOCALE, CLIENT_PROPERTIES_OS,
    CLIENT_PROPERTIES_OS_VERSION, CLIENT_PROPERTIES_RELEASE_CHANNEL, CLIENT_PROPERTIES_USER_AGENT,
    GatewayOpcode, IDENTIFY_CAPABILITIES,
};
use crate::infrastructure::discord::dto::{ChannelDto, GuildDto, UserDto};

/// One gateway frame, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    #[must_use]
    pub const fn new(op: GatewayOpcode, d: Value) -> Self {
        Self {
            op: op.as_u8(),
            d,
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub const fn opcode(&self) -> Option<GatewayOpcode> {
        GatewayOpcode::from_u8(self.op)
    }

    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self::new(
            GatewayOpcode::Heartbeat,
            sequence.map_or(Value::Null, |s| Value::Number(s.into())),
        )
    }

    #[must_use]
    pub fn identify(token: &str) -> Self {
        Self::new(
            GatewayOpcode::Identify,
            json!({
                "token": token,
                "capabilities": IDENTIFY_CAPABILITIES,
                "properties": {
                    "os": CLIENT_PROPERTIES_OS,
                    "browser": CLIENT_PROPERTIES_BROWSER,
                    "device": CLIENT_PROPERTIES_DEVICE,
                    "system_locale": CLIENT_PROPERTIES_LOCALE,
                    "browser_user_agent": CLIENT_PROPERTIES_USER_AGENT,
                    "browser_version": CLIENT_PROPERTIES_BROWSER_VERSION,
                    "os_version": CLIENT_PROPERTIES_OS_VERSION,
                    "referrer": "",
                    "referring_domain": "",
                    "referrer_current": "",
                    "referring_domain_current": "",
                    "release_channel": CLIENT_PROPERTIES_RELEASE_CHANNEL,
                    "client_build_number": CLIENT_BUILD_NUMBER,
                    "client_event_source": null
                }
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub user: UserDto,
    #[serde(default)]
    pub users: Vec<UserDto>,
    #[serde(default)]
    pub private_channels: Vec<ChannelDto>,
    #[serde(default)]
    pub guilds: Vec<GuildDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_payload() {
        let payload = GatewayPayload::heartbeat(Some(42));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "op": 1, "d": 42 })
        );
    }

    #[test]
    fn test_heartbeat_null_sequence() {
        let payload = GatewayPayload::heartbeat(None);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"op":1,"d":null}"#
        );
    }

    #[test]
    fn test_identify_payload_structure() {
        let payload = GatewayPayload::identify("secret");
        assert_eq!(payload.opcode(), Some(GatewayOpcode::Identify));

        let d = payload.d.as_object().unwrap();
        assert_eq!(d["token"], "secret");
        assert_eq!(d["capabilities"], 16381);
        assert!(d["properties"].is_object());
        assert_eq!(d["properties"]["browser"], "Chrome");
    }

    #[test]
    fn test_inbound_frame_without_data() {
        let payload: GatewayPayload = serde_json::from_str(r#"{"op":11}"#).unwrap();
        assert_eq!(payload.opcode(), Some(GatewayOpcode::HeartbeatAck));
        assert!(payload.d.is_null());
        assert!(payload.s.is_none());
    }
}
