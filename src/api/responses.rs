//! Shared API response types

use serde::Serialize;

/// Body returned by every delete endpoint
#[derive(Debug, Serialize)]
pub struct DeletedResponse<T: Serialize> {
    pub message: String,
    pub id: T,
}

impl<T: Serialize> DeletedResponse<T> {
    pub fn new(what: &str, id: T) -> Self {
        Self {
            message: format!("{} deleted successfully", what),
            id,
        }
    }
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_response_shape() {
        let body = serde_json::to_value(DeletedResponse::new("Slider", 4)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "Slider deleted successfully", "id": 4})
        );
    }
}
