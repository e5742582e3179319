//! Routing-key parsing.
//!
//! Publishes arrive on `<prefix>/<userId>/<deviceId>`; the user and device
//! segments identify the tracked record. Extra segments are ignored.

#[derive(Debug, thiserror::Error)]
pub enum TopicError {
    #[error("topic `{0}` is missing user or device segments")]
    Malformed(String),
}

/// A parsed routing key. Keeps the raw form for event correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub raw: String,
    pub prefix: String,
    pub user_id: String,
    pub device_id: String,
}

impl Topic {
    pub fn parse(raw: &str) -> Result<Self, TopicError> {
        let mut segments = raw.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(prefix), Some(user_id), Some(device_id))
                if !user_id.is_empty() && !device_id.is_empty() =>
            {
                Ok(Self {
                    raw: raw.to_string(),
                    prefix: prefix.to_string(),
                    user_id: user_id.to_string(),
                    device_id: device_id.to_string(),
                })
            }
            _ => Err(TopicError::Malformed(raw.to_string())),
        }
    }
}
