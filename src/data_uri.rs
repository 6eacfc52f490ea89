//! Base64 data URIs for page payloads

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Error, Result};

/// Mime type used when a name has no recognized image extension
pub const DEFAULT_MIME: &str = "image/jpeg";

/// Raster formats accepted as comic pages
pub const PAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Lowercased text after the last `.` of a name, if any
pub fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Whether an archive entry name looks like a page image
pub fn is_page_image(name: &str) -> bool {
    extension(name).is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Mime type for a file name, falling back to [`DEFAULT_MIME`]
pub fn mime_for_name(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => DEFAULT_MIME,
    }
}

/// File extension to use when writing a payload of the given mime type
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// Build `data:<mime>;base64,<payload>`
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    let payload = BASE64.encode(bytes);
    let mut uri = String::with_capacity("data:;base64,".len() + mime.len() + payload.len());
    uri.push_str("data:");
    uri.push_str(mime);
    uri.push_str(";base64,");
    uri.push_str(&payload);
    uri
}

/// Borrowed view of a parsed data URI
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Split a base64 data URI into mime type and payload
    pub fn parse(uri: &'a str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::invalid_data_uri("missing `data:` scheme"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::invalid_data_uri("missing `,` separator"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::invalid_data_uri("payload is not base64"))?;
        Ok(Self { mime, payload })
    }

    /// Decode the payload back to raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.payload)
            .map_err(|e| Error::invalid_data_uri(e.to_string()))
    }
}

/// Raw base64 payload of an image data URI, or the input unchanged when it
/// carries no `data:image/...;base64,` header.
pub fn strip_prefix(uri: &str) -> &str {
    match DataUri::parse(uri) {
        Ok(parsed) if parsed.mime.starts_with("image/") => parsed.payload,
        _ => uri,
    }
}
