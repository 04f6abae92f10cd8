//! Structured artifact: the lossless JSON form of a document

use crate::model::Document;

/// Serializes a document to pretty-printed JSON bytes
pub fn render_structured(document: &Document) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses bytes produced by [`render_structured`]
pub fn parse_structured(bytes: &[u8]) -> Result<Document, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Endpoint, HttpMethod, Page, Parameter, ParameterLocation, ResponseExample};
    use chrono::{TimeZone, Utc};

    fn sample_document() -> Document {
        let mut endpoint = Endpoint::new(HttpMethod::Post, "/loans/{loanAccountId}:approve");
        endpoint.parameters.push(Parameter {
            name: "loanAccountId".to_string(),
            location: ParameterLocation::Path,
            param_type: "string".to_string(),
            required: true,
            description: "The id or encoded key".to_string(),
        });
        endpoint
            .code_samples
            .insert("curl".to_string(), "curl -X POST \\\n  https://x".to_string());
        endpoint.response_examples.push(ResponseExample {
            status: Some(200),
            payload: "{\n  \"state\": \"APPROVED\"\n}".to_string(),
        });

        Document {
            version: "v2".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            pages: vec![
                Page {
                    url: "https://api.mambu.com/#/v2".to_string(),
                    title: "Welcome".to_string(),
                    section_path: vec![],
                    raw_html: None,
                    extracted_at: Utc::now(),
                    description: "Intro with \"quotes\" and ünïcode".to_string(),
                    endpoint: None,
                },
                Page {
                    url: "https://api.mambu.com/#/v2/loans/approve".to_string(),
                    title: "Approve loan".to_string(),
                    section_path: vec!["Loans".to_string()],
                    raw_html: None,
                    extracted_at: Utc::now(),
                    description: String::new(),
                    endpoint: Some(endpoint),
                },
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let document = sample_document();
        let bytes = render_structured(&document).unwrap();
        assert_eq!(parse_structured(&bytes).unwrap(), document);
    }

    #[test]
    fn test_raw_html_not_serialized() {
        let mut document = sample_document();
        document.pages[0].raw_html = Some("<secret/>".to_string());
        let bytes = render_structured(&document).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains(r#""http_method": "POST""#));
    }

    #[test]
    fn test_rendering_is_stable() {
        let document = sample_document();
        assert_eq!(
            render_structured(&document).unwrap(),
            render_structured(&document).unwrap()
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_structured(b"{\"version\": 2}").is_err());
    }
}
