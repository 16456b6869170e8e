use std::fmt;

/// Connection lifecycle of a subscriber.
///
/// `Disconnected -> Connecting -> Ready -> Subscribed`, with `Reconnecting`
/// entered on any transport error or close. `Disconnected` is only re-entered
/// on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberState {
    Disconnected,
    Connecting,
    Ready,
    Subscribed,
    Reconnecting,
}

impl SubscriberState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Subscribed => "subscribed",
            Self::Reconnecting => "reconnecting",
        }
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed)
    }
}

impl fmt::Display for SubscriberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
