//! HTTP uploader backed by the Uploadcare direct upload API.

pub mod api;
pub mod uploader;

pub use uploader::HttpUploader;
