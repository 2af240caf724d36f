//! Notification target parsing

use secrecy::SecretString;

/// Where a completion message goes
#[derive(Debug)]
pub enum NotifyTarget {
    /// `http(s)://...`: GET with a `text` query parameter
    Webhook(String),

    /// `pushdeer:<pushkey>`
    PushDeer(SecretString),

    /// `tg:<token>`
    Telegram(SecretString),

    /// `lark:<token>`
    Lark(SecretString),

    /// Anything else. Delivering to it does nothing.
    Unknown(String),
}

impl NotifyTarget {
    /// Parse a target string. Blank targets yield `None`.
    pub fn parse(target: &str) -> Option<Self> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        if target.starts_with("http") {
            return Some(NotifyTarget::Webhook(target.to_string()));
        }

        let Some((scheme, token)) = target.split_once(':') else {
            return Some(NotifyTarget::Unknown(target.to_string()));
        };
        if token.is_empty() {
            return Some(NotifyTarget::Unknown(target.to_string()));
        }

        let secret = || SecretString::from(token.to_string());
        Some(match scheme {
            "pushdeer" => NotifyTarget::PushDeer(secret()),
            "tg" => NotifyTarget::Telegram(secret()),
            "lark" => NotifyTarget::Lark(secret()),
            _ => NotifyTarget::Unknown(scheme.to_string()),
        })
    }

    /// Short name for logs; never includes the token
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyTarget::Webhook(_) => "webhook",
            NotifyTarget::PushDeer(_) => "pushdeer",
            NotifyTarget::Telegram(_) => "tg",
            NotifyTarget::Lark(_) => "lark",
            NotifyTarget::Unknown(_) => "unknown",
        }
    }
}
