//! Session configuration

/// Default poll loop frequency in iterations per second.
pub const DEFAULT_POLL_HZ: u32 = 60;

/// Session tuning options.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Poll loop frequency in iterations per second. Higher values lower
    /// inbound latency at the cost of CPU; values below 1 are treated
    /// as 1.
    pub poll_hz: u32,

    /// Connection key offered to the transport when connecting (clients
    /// only). The transport's acceptance policy decides what to do
    /// with it.
    pub connect_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_hz: DEFAULT_POLL_HZ,
            connect_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_hz, 60);
        assert!(config.connect_key.is_empty());
    }
}
