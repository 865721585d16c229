use std::time::Duration;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=9&encoding=json";
pub const ZLIB_STREAM_PARAM: &str = "compress=zlib-stream";
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

pub const IDENTIFY_CAPABILITIES: u32 = 16381;

pub const CLIENT_PROPERTIES_OS: &str = "Windows";
pub const CLIENT_PROPERTIES_BROWSER: &str = "Chrome";
pub const CLIENT_PROPERTIES_DEVICE: &str = "";
pub const CLIENT_PROPERTIES_LOCALE: &str = "en-US";
pub const CLIENT_PROPERTIES_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
pub const CLIENT_PROPERTIES_BROWSER_VERSION: &str = "123.0.0.0";
pub const CLIENT_PROPERTIES_OS_VERSION: &str = "10";
pub const CLIENT_PROPERTIES_RELEASE_CHANNEL: &str = "stable";
pub const CLIENT_BUILD_NUMBER: u32 = 281_369;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOpcode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    Resume = 6,
    Reconnect = 7,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

impl GatewayOpcode {
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<GatewayOpcode> for u8 {
    fn from(opcode: GatewayOpcode) -> Self {
        opcode.as_u8()
    }
}

/// Appends the zlib-stream transport parameter when compression is enabled.
#[must_use]
pub fn gateway_url(base: &str, compress: bool) -> String {
    if !compress || base.contains(ZLIB_STREAM_PARAM) {
        return base.to_string();
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{ZLIB_STREAM_PARAM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values_are_pinned() {
        assert_eq!(GatewayOpcode::Dispatch.as_u8(), 0);
        assert_eq!(GatewayOpcode::Heartbeat.as_u8(), 1);
        assert_eq!(GatewayOpcode::Identify.as_u8(), 2);
        assert_eq!(GatewayOpcode::InvalidSession.as_u8(), 9);
        assert_eq!(GatewayOpcode::Hello.as_u8(), 10);
        assert_eq!(GatewayOpcode::from_u8(11), Some(GatewayOpcode::HeartbeatAck));
        assert_eq!(GatewayOpcode::from_u8(3), None);
    }

    #[test]
    fn test_gateway_url_compression() {
        assert_eq!(gateway_url(GATEWAY_URL, false), GATEWAY_URL);
        assert_eq!(
            gateway_url(GATEWAY_URL, true),
            "wss://gateway.discord.gg/?v=9&encoding=json&compress=zlib-stream"
        );
        assert_eq!(
            gateway_url("wss://example.invalid", true),
            "wss://example.invalid?compress=zlib-stream"
        );
    }
}
