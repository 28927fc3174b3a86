use std::{fmt::Display, hash::Hash};

use serde::{Deserialize, Serialize};

/// Name given to every padding slot of a bracket.
pub const BYE_NAME: &str = "BYE";

/// Scheme used to reach a player service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// A tournament entrant: a bot service, a human seat, or a BYE sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub is_bye: bool,
    #[serde(default)]
    pub is_human: bool,
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.port == other.port
            && self.host == other.host
            && self.is_bye == other.is_bye
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.port.hash(state);
        self.host.hash(state);
        self.is_bye.hash(state);
    }
}

impl Player {
    /// A bot reachable at `http://localhost:{port}`.
    pub fn new(name: impl Into<String>, port: u16) -> Player {
        Player {
            name: name.into(),
            port: Some(port),
            host: None,
            protocol: None,
            is_bye: false,
            is_human: false,
        }
    }

    pub fn human(name: impl Into<String>) -> Player {
        Player {
            name: name.into(),
            port: None,
            host: None,
            protocol: None,
            is_bye: false,
            is_human: true,
        }
    }

    /// The padding sentinel. Always has no port.
    pub fn bye() -> Player {
        Player {
            name: BYE_NAME.to_string(),
            port: None,
            host: None,
            protocol: None,
            is_bye: true,
            is_human: false,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// True for entrants that actually play (neither BYE nor human).
    pub fn is_bot(&self) -> bool {
        !self.is_bye && !self.is_human
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) if !self.is_bye => write!(f, "{}:{}", self.name, port),
            _ => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bye_has_no_port() {
        let bye = Player::bye();
        assert!(bye.is_bye);
        assert_eq!(bye.port, None);
        assert!(!bye.is_bot());
    }

    #[test]
    fn deserializes_camel_case_flags() {
        let player: Player =
            serde_json::from_str(r#"{"name":"Ana","port":null,"isHuman":true}"#).unwrap();
        assert!(player.is_human);
        assert!(!player.is_bye);
        assert_eq!(player.protocol, None);
    }

    #[test]
    fn protocol_is_lowercase_on_the_wire() {
        let player = Player::new("X", 3001).with_protocol(Protocol::Https);
        let value = serde_json::to_value(&player).unwrap();
        assert_eq!(value["protocol"], "https");
        assert_eq!(value["isBye"], false);
    }
}
