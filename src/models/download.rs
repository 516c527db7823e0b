use super::OutputFormat;
use base64::Engine;

/// Bytes of a generated image, ready to be offered as a file download.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub label: String,
    pub data: Vec<u8>,
}

impl DownloadArtifact {
    pub fn new(seed: u32, format: OutputFormat, data: Vec<u8>) -> Self {
        Self {
            file_name: format!("generated_image_{}.{}", seed, format.extension()),
            mime_type: format.mime_type(),
            label: format!("Download image ({})", format.extension().to_uppercase()),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_naming() {
        let artifact = DownloadArtifact::new(42, OutputFormat::Webp, vec![1, 2, 3]);
        assert_eq!(artifact.file_name, "generated_image_42.webp");
        assert_eq!(artifact.mime_type, "image/webp");
        assert_eq!(artifact.label, "Download image (WEBP)");
        assert_eq!(artifact.size(), 3);

        let artifact = DownloadArtifact::new(0, OutputFormat::Jpg, Vec::new());
        assert_eq!(artifact.file_name, "generated_image_0.jpg");
        assert_eq!(artifact.mime_type, "image/jpeg");
    }

    #[test]
    fn test_data_url() {
        let artifact = DownloadArtifact::new(7, OutputFormat::Jpg, b"abc".to_vec());
        assert_eq!(artifact.to_data_url(), "data:image/jpeg;base64,YWJj");
    }
}
