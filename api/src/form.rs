use std::collections::HashMap;

use axum::extract::Multipart;
use frame_sieve_common::storage::{has_allowed_extension, secure_filename};
use tracing::debug;

/// What a POST to `/` asks for. Exactly one operation per request.
#[derive(Debug, PartialEq, Eq)]
pub enum FrontEndRequest {
    Animate {
        url: String,
        frames: Option<u32>,
        interval_ms: Option<u64>,
        browser: Option<String>,
    },
    LocalGif {
        path: String,
    },
    Clear,
    RemoteGif {
        url: String,
    },
    Upload {
        file_name: String,
        data: Vec<u8>,
    },
    /// Nothing actionable (empty form, rejected upload): just show the page.
    ShowPage,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Raw fields of a submitted form.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    pub text: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("malformed form data: {0}")]
    Multipart(String),
    #[error("field {field} must be a non-negative integer, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

impl FormFields {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut fields = FormFields::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| FormError::Multipart(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "file" {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| FormError::Multipart(e.body_text()))?;
                debug!(file_name = ?file_name, bytes = data.len(), "received upload");
                fields.file = Some(UploadedFile {
                    file_name,
                    data: data.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| FormError::Multipart(e.body_text()))?;
                fields.text.insert(name, value);
            }
        }
        Ok(fields)
    }

    /// Pick the operation. Precedence: `url`, `gif`, `clear`, `gif_url`, `file`.
    pub fn into_request(mut self, allowed_extensions: &[String]) -> Result<FrontEndRequest, FormError> {
        if let Some(url) = self.text.remove("url") {
            return Ok(FrontEndRequest::Animate {
                url: url.trim().to_string(),
                frames: parse_optional(&self.text, "frames")?,
                interval_ms: parse_optional(&self.text, "interval_ms")?,
                browser: self
                    .text
                    .remove("browser")
                    .map(|b| b.trim().to_string())
                    .filter(|b| !b.is_empty()),
            });
        }
        if let Some(path) = self.text.remove("gif") {
            return Ok(FrontEndRequest::LocalGif { path });
        }
        if self.text.contains_key("clear") {
            return Ok(FrontEndRequest::Clear);
        }
        if let Some(url) = self.text.remove("gif_url") {
            return Ok(FrontEndRequest::RemoteGif {
                url: url.trim().to_string(),
            });
        }
        if let Some(file) = self.file {
            let accepted = file
                .file_name
                .as_deref()
                .and_then(secure_filename)
                .filter(|name| has_allowed_extension(name, allowed_extensions));
            return Ok(match accepted {
                Some(file_name) if !file.data.is_empty() => FrontEndRequest::Upload {
                    file_name,
                    data: file.data,
                },
                _ => {
                    debug!(file_name = ?file.file_name, "upload rejected");
                    FrontEndRequest::ShowPage
                }
            });
        }
        Ok(FrontEndRequest::ShowPage)
    }
}

fn parse_optional<T: std::str::FromStr>(
    text: &HashMap<String, String>,
    field: &'static str,
) -> Result<Option<T>, FormError> {
    match text.get(field).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| FormError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gif_only() -> Vec<String> {
        vec!["gif".to_string()]
    }

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        FormFields {
            text: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn url_wins_over_everything_else() {
        let req = fields(&[("url", " https://a.test "), ("gif", "/x.gif"), ("clear", "")])
            .into_request(&gif_only())
            .unwrap();
        assert_eq!(
            req,
            FrontEndRequest::Animate {
                url: "https://a.test".into(),
                frames: None,
                interval_ms: None,
                browser: None,
            }
        );
    }

    #[test]
    fn animate_overrides_are_parsed() {
        let req = fields(&[
            ("url", "https://a.test"),
            ("frames", "5"),
            ("interval_ms", "250"),
            ("browser", "firefox"),
        ])
        .into_request(&gif_only())
        .unwrap();
        assert_eq!(
            req,
            FrontEndRequest::Animate {
                url: "https://a.test".into(),
                frames: Some(5),
                interval_ms: Some(250),
                browser: Some("firefox".into()),
            }
        );
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = fields(&[("url", "https://a.test"), ("frames", "lots")])
            .into_request(&gif_only())
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidNumber { field: "frames", .. }));
    }

    #[test]
    fn gif_then_clear_then_remote() {
        assert_eq!(
            fields(&[("gif", "/tmp/a.gif"), ("clear", "1")])
                .into_request(&gif_only())
                .unwrap(),
            FrontEndRequest::LocalGif {
                path: "/tmp/a.gif".into()
            }
        );
        assert_eq!(
            fields(&[("clear", "1"), ("gif_url", "https://a.test/b.gif")])
                .into_request(&gif_only())
                .unwrap(),
            FrontEndRequest::Clear
        );
        assert_eq!(
            fields(&[("gif_url", "https://a.test/b.gif")])
                .into_request(&gif_only())
                .unwrap(),
            FrontEndRequest::RemoteGif {
                url: "https://a.test/b.gif".into()
            }
        );
    }

    #[test]
    fn upload_is_sanitized_and_extension_checked() {
        let upload = |name: Option<&str>, data: &[u8]| FormFields {
            text: HashMap::new(),
            file: Some(UploadedFile {
                file_name: name.map(str::to_string),
                data: data.to_vec(),
            }),
        };

        assert_eq!(
            upload(Some("../my cat.GIF"), b"GIF89a")
                .into_request(&gif_only())
                .unwrap(),
            FrontEndRequest::Upload {
                file_name: "my_cat.GIF".into(),
                data: b"GIF89a".to_vec(),
            }
        );
        for rejected in [
            upload(Some("cat.png"), b"x"),
            upload(None, b"x"),
            upload(Some("cat.gif"), b""),
        ] {
            assert_eq!(
                rejected.into_request(&gif_only()).unwrap(),
                FrontEndRequest::ShowPage
            );
        }
    }

    #[test]
    fn empty_form_shows_page() {
        assert_eq!(
            FormFields::default().into_request(&gif_only()).unwrap(),
            FrontEndRequest::ShowPage
        );
    }
}
