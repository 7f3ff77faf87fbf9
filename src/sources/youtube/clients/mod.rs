pub mod common;

use serde_json::{Map, Value, json};

use super::ua::yt_ua;
use crate::common::Identity;

/// An InnerTube client shape accepted by the player endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientProfile {
    pub name: &'static str,
    /// Numeric id sent as `X-YouTube-Client-Name`.
    pub id: &'static str,
    pub version: &'static str,
    pub user_agent: &'static str,
    /// Extra `context.client` fields (device and OS details).
    pub device: &'static [(&'static str, &'static str)],
}

pub const WEB_REMIX: ClientProfile = ClientProfile {
    name: "WEB_REMIX",
    id: "67",
    version: "1.20260121.03.00",
    user_agent: yt_ua::WEB,
    device: &[],
};

pub const ANDROID: ClientProfile = ClientProfile {
    name: "ANDROID",
    id: "3",
    version: "20.01.35",
    user_agent: yt_ua::ANDROID,
    device: &[
        ("deviceMake", "Google"),
        ("deviceModel", "Pixel 6"),
        ("osName", "Android"),
        ("osVersion", "14"),
        ("androidSdkVersion", "34"),
    ],
};

pub const WEB: ClientProfile = ClientProfile {
    name: "WEB",
    id: "1",
    version: "2.20260114.01.00",
    user_agent: yt_ua::WEB,
    device: &[],
};

pub const IOS: ClientProfile = ClientProfile {
    name: "IOS",
    id: "5",
    version: "21.02.1",
    user_agent: yt_ua::IOS,
    device: &[
        ("deviceMake", "Apple"),
        ("deviceModel", "iPhone16,2"),
        ("osName", "iPhone"),
        ("osVersion", "18.2.22C152"),
    ],
};

impl ClientProfile {
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "WEB_REMIX" | "MUSIC_WEB" => Some(WEB_REMIX),
            "ANDROID" => Some(ANDROID),
            "WEB" => Some(WEB),
            "IOS" => Some(IOS),
            _ => None,
        }
    }

    /// The `context` object of a player request.
    pub fn context(&self) -> Value {
        let mut client = Map::new();
        client.insert("clientName".to_string(), self.name.into());
        client.insert("clientVersion".to_string(), self.version.into());
        client.insert("userAgent".to_string(), self.user_agent.into());
        for (key, value) in self.device {
            client.insert((*key).to_string(), (*value).into());
        }
        client.insert("hl".to_string(), "en".into());
        client.insert("gl".to_string(), "US".into());

        json!({
            "client": client,
            "user": { "lockedSafetyMode": false },
            "request": { "useSsl": true }
        })
    }
}

impl Identity for ClientProfile {
    fn label(&self) -> &str {
        self.name
    }
}
