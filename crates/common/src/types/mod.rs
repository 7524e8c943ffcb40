use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// `{ "status": ..., "message": ... }` body used for replies that carry no data.
#[derive(Serialize, Debug, Clone)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: "success", message: message.into() }
    }
}
