//! Upload API types.

use serde::Deserialize;

/// Multipart field carrying the public key.
pub const PUB_KEY_FIELD: &str = "UPLOADCARE_PUB_KEY";
/// Multipart field selecting the storage behavior.
pub const STORE_FIELD: &str = "UPLOADCARE_STORE";
/// Multipart field carrying the photo.
pub const FILE_FIELD: &str = "file";

/// Successful upload response: `{"file": "<uuid>"}`.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file: Option<String>,
}

/// Error response: `{"error": {"content": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub content: String,
}

/// Extract a readable message from an error body, falling back to the raw text.
pub fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => parsed.error.content,
        Err(_) => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_with_file() {
        let response: UploadResponse =
            serde_json::from_str(r#"{"file": "17be4678-dab7-4bc7-8753-28914a22960a"}"#).unwrap();
        assert_eq!(
            response.file.as_deref(),
            Some("17be4678-dab7-4bc7-8753-28914a22960a")
        );
    }

    #[test]
    fn test_upload_response_without_file() {
        let response: UploadResponse = serde_json::from_str("{}").unwrap();
        assert!(response.file.is_none());
    }

    #[test]
    fn test_error_message_from_json() {
        let body = r#"{"error": {"content": "pub_key is invalid.", "status_code": 403, "error_code": "ProjectPublicKeyInvalidError"}}"#;
        assert_eq!(error_message(body.to_string()), "pub_key is invalid.");
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(error_message("Bad gateway".to_string()), "Bad gateway");
    }
}
