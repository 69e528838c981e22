//! Stable Image edit endpoints (v2beta, multipart)

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::client::StabilityClient;
use crate::error::{Error, Result};

use super::types::{ImageResult, OutputFormat, ResponseFormat};

/// Request to cut the subject out of its background
#[derive(Debug, Clone)]
pub struct RemoveBackgroundRequest {
    /// Encoded source image
    pub image: Vec<u8>,
    /// Encoded output format
    pub output_format: Option<OutputFormat>,
}

impl RemoveBackgroundRequest {
    /// Create a request for the given source image
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            output_format: None,
        }
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Check the request before dispatch.
    pub fn validate(&self) -> Result<()> {
        if self.image.is_empty() {
            return Err(Error::Validation("image must not be empty".to_string()));
        }
        Ok(())
    }

    pub(crate) fn to_form(&self) -> Form {
        let mut form =
            Form::new().part("image", Part::bytes(self.image.clone()).file_name("image"));
        if let Some(format) = self.output_format {
            form = form.text("output_format", format.as_str());
        }
        form
    }
}

impl StabilityClient {
    /// Remove the background from an image.
    pub async fn remove_background(
        &self,
        request: &RemoveBackgroundRequest,
        format: ResponseFormat,
    ) -> Result<ImageResult> {
        request.validate()?;
        info!(input_bytes = request.image.len(), "Removing background");
        self.send_image_request(
            "/v2beta/stable-image/edit/remove-background",
            request.to_form(),
            format,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_rejected() {
        let request = RemoveBackgroundRequest::new(Vec::new());
        assert!(matches!(request.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_request_with_format() {
        let request = RemoveBackgroundRequest::new(vec![0x89, 0x50, 0x4E, 0x47])
            .with_output_format(OutputFormat::Png);
        assert!(request.validate().is_ok());
        assert_eq!(request.output_format, Some(OutputFormat::Png));
    }
}
