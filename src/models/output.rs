//! Decoding of the untyped model output into an image location.
//!
//! Flux returns a bare URL string, but other deployments of the same model have
//! returned `{"url": ...}` objects or lists of URLs. All three are accepted; the
//! first location of a list is the one that gets rendered.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutput {
    SingleLocation(String),
    LocationList(Vec<String>),
    Unrecognized(Value),
}

impl ImageOutput {
    pub fn decode(value: Value) -> Self {
        if let Some(location) = location_of(&value) {
            return ImageOutput::SingleLocation(location);
        }

        if let Value::Array(items) = &value {
            // A list only counts if its first element resolves.
            if items.first().and_then(location_of).is_some() {
                let locations = items.iter().filter_map(location_of).collect();
                return ImageOutput::LocationList(locations);
            }
        }

        ImageOutput::Unrecognized(value)
    }

    /// The location to render and download, if any.
    pub fn primary_location(&self) -> Option<&str> {
        match self {
            ImageOutput::SingleLocation(url) => Some(url),
            ImageOutput::LocationList(urls) => urls.first().map(String::as_str),
            ImageOutput::Unrecognized(_) => None,
        }
    }
}

fn location_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => is_http_url(s).then(|| s.clone()),
        Value::Object(map) => map
            .get("url")
            .and_then(Value::as_str)
            .filter(|s| is_http_url(s))
            .map(str::to_string),
        _ => None,
    }
}

fn is_http_url(candidate: &str) -> bool {
    match reqwest::Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://replicate.delivery/xezq/abc/out-0.webp";

    #[test]
    fn test_decode_string() {
        let output = ImageOutput::decode(json!(URL));
        assert_eq!(output, ImageOutput::SingleLocation(URL.to_string()));
        assert_eq!(output.primary_location(), Some(URL));
    }

    #[test]
    fn test_decode_url_object() {
        let output = ImageOutput::decode(json!({ "url": URL }));
        assert_eq!(output.primary_location(), Some(URL));
    }

    #[test]
    fn test_decode_list_uses_first() {
        let second = "https://replicate.delivery/xezq/abc/out-1.webp";
        let output = ImageOutput::decode(json!([URL, second]));
        assert_eq!(
            output,
            ImageOutput::LocationList(vec![URL.to_string(), second.to_string()])
        );
        assert_eq!(output.primary_location(), Some(URL));
    }

    #[test]
    fn test_unrecognized_shapes() {
        for raw in [
            json!([]),
            json!(null),
            json!({ "image": URL }),
            json!(["not a url", URL]),
            json!("ftp://example.com/a.webp"),
            json!(""),
            json!(42),
        ] {
            let output = ImageOutput::decode(raw.clone());
            assert_eq!(output, ImageOutput::Unrecognized(raw));
            assert!(output.primary_location().is_none());
        }
    }
}
