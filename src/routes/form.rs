//! Multipart form reading for image-bearing endpoints.

use crate::error::AppError;
use crate::services::UploadedFile;
use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::str::FromStr;

/// A buffered multipart form: text fields plus the files of one field.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Read the whole form. Parts named `file_field` are collected as files
    /// (at most `max_files`); every other part is a text field.
    pub async fn read(
        mut multipart: Multipart,
        file_field: &str,
        max_files: usize,
    ) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                if form.files.len() >= max_files {
                    return Err(AppError::BadRequest(format!(
                        "Too many files; at most {} allowed",
                        max_files
                    )));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid file upload: {}", e)))?;

                let file = UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
                file.check()?;
                form.files.push(file);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Whether the form carried the field at all.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Trimmed text value. `Some("")` means the field was sent empty.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    /// Trimmed, non-empty text value.
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name).filter(|v| !v.is_empty()).map(str::to_string)
    }

    /// Checkbox-style flag; absent means false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.raw(name), Some("true" | "on" | "1"))
    }

    /// Parse a non-empty field, reporting garbage as a validation error.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Invalid value for {}: {}", name, raw))),
        }
    }

    /// Decimal field; `NaN` and infinities parse as `f64` but are refused.
    pub fn number(&self, name: &str) -> Result<Option<f64>, AppError> {
        match self.parse::<f64>(name)? {
            Some(n) if !n.is_finite() => Err(AppError::Validation(format!(
                "Invalid value for {}: must be a number",
                name
            ))),
            n => Ok(n),
        }
    }

    /// Date field as `YYYY-MM-DD` or RFC 3339.
    pub fn date(&self, name: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Some(naive.and_utc()))
            .ok_or_else(|| AppError::Validation(format!("Invalid date for {}: {}", name, raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    fn form(pairs: &[(&str, &str)]) -> MultipartForm {
        MultipartForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: vec![],
        }
    }

    #[test]
    fn test_text_and_flags() {
        let f = form(&[("teamName", "  Ajax "), ("notes", ""), ("signed", "true"), ("matchWorn", "false")]);
        assert_eq!(f.text("teamName").as_deref(), Some("Ajax"));
        assert_eq!(f.text("notes"), None);
        assert!(f.has("notes"));
        assert!(f.flag("signed"));
        assert!(!f.flag("matchWorn"));
        assert!(!f.flag("playerIssue"));
    }

    #[test]
    fn test_parse_values() {
        let f = form(&[("playerNumber", "10"), ("condition", "mint"), ("purchasePrice", "x")]);
        assert_eq!(f.parse::<i32>("playerNumber").unwrap(), Some(10));
        assert!(f.parse::<Condition>("condition").is_err());
        assert!(f.parse::<f64>("purchasePrice").is_err());
        assert_eq!(f.parse::<f64>("currentValue").unwrap(), None);
    }

    #[test]
    fn test_numbers_must_be_finite() {
        let f = form(&[("a", "12.50"), ("b", "NaN"), ("c", "inf"), ("d", "-infinity"), ("e", "")]);
        assert_eq!(f.number("a").unwrap(), Some(12.5));
        assert!(f.number("b").is_err());
        assert!(f.number("c").is_err());
        assert!(f.number("d").is_err());
        assert_eq!(f.number("e").unwrap(), None);
    }

    #[test]
    fn test_dates() {
        let f = form(&[("a", "2021-08-14"), ("b", "2021-08-14T10:00:00Z"), ("c", "14/08/2021")]);
        assert_eq!(f.date("a").unwrap().unwrap().to_rfc3339(), "2021-08-14T00:00:00+00:00");
        assert!(f.date("b").unwrap().is_some());
        assert!(f.date("c").is_err());
    }
}
