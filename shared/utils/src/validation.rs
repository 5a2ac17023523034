use crate::error::{CarePlanError, CarePlanResult};
use validator::{Validate, ValidationErrors};

/// Bytes scanned for the `%PDF-` marker. Some producers prepend junk.
const PDF_HEADER_WINDOW: usize = 1024;

pub fn validate_model<T: Validate>(model: &T) -> CarePlanResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(CarePlanError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match (&error.message, error.code.as_ref()) {
                (Some(message), _) => format!("{}: {}", field, message),
                (None, "length") => format!("Length validation failed for field '{}'", field),
                (None, "range") => format!("Value out of range for field '{}'", field),
                (None, "required") => format!("Field '{}' is required", field),
                (None, code) => format!("Validation failed for field '{}': {}", field, code),
            };
            messages.push(message);
        }
    }

    // Nested models such as plan sections
    for (field, kind) in errors.errors() {
        if let validator::ValidationErrorsKind::List(items) = kind {
            for (index, nested) in items {
                messages.push(format!("{}[{}]: {}", field, index, format_validation_errors(nested)));
            }
        }
    }

    messages.sort();
    messages.join(", ")
}

/// Cheap checks on an uploaded report before it is handed to the PDF parser.
pub fn validate_pdf_upload(data: &[u8], max_size: usize) -> CarePlanResult<()> {
    if data.is_empty() {
        return Err(CarePlanError::validation("file", "Uploaded file is empty"));
    }

    validate_file_size(data.len() as u64, max_size as u64)?;

    let window = &data[..data.len().min(PDF_HEADER_WINDOW)];
    if !window.windows(5).any(|w| w == b"%PDF-") {
        return Err(CarePlanError::unreadable_document(
            "File does not look like a PDF document",
        ));
    }

    Ok(())
}

pub fn validate_file_type(file_name: &str, allowed_types: &[&str]) -> CarePlanResult<()> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed_types.contains(&extension.to_lowercase().as_str()) {
        return Err(CarePlanError::validation(
            "file_type",
            format!(
                "File type '{}' not allowed. Allowed types: {}",
                extension,
                allowed_types.join(", ")
            ),
        ));
    }

    Ok(())
}

pub fn validate_file_size(file_size: u64, max_size: u64) -> CarePlanResult<()> {
    if file_size > max_size {
        return Err(CarePlanError::validation(
            "file_size",
            format!(
                "File size {} bytes exceeds maximum allowed size {} bytes",
                file_size, max_size
            ),
        ));
    }

    Ok(())
}

pub fn validate_non_blank(field: &str, value: &str) -> CarePlanResult<()> {
    if value.trim().is_empty() {
        return Err(CarePlanError::validation(field, "Value must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Query {
        #[validate(range(min = 1, max = 20))]
        top_k: usize,
    }

    #[test]
    fn test_validate_pdf_upload() {
        assert!(validate_pdf_upload(b"%PDF-1.5\n...", 1024).is_ok());

        let mut prefixed = vec![b' '; 100];
        prefixed.extend_from_slice(b"%PDF-1.7");
        assert!(validate_pdf_upload(&prefixed, 1024).is_ok());
    }

    #[test]
    fn test_validate_pdf_upload_rejects() {
        let empty = validate_pdf_upload(b"", 1024).unwrap_err();
        assert_eq!(empty.error_code(), "VALIDATION_ERROR");

        let text = validate_pdf_upload(b"plain text report", 1024).unwrap_err();
        assert_eq!(text.error_code(), "UNREADABLE_DOCUMENT");

        let big = validate_pdf_upload(&[b'%'; 2048], 1024).unwrap_err();
        assert!(matches!(big, CarePlanError::Validation { ref field, .. } if field == "file_size"));
    }

    #[test]
    fn test_validate_model_range() {
        assert!(validate_model(&Query { top_k: 3 }).is_ok());

        let error = validate_model(&Query { top_k: 0 }).unwrap_err();
        assert!(error.to_string().contains("top_k"));
        assert!(validate_model(&Query { top_k: 21 }).is_err());
    }

    #[test]
    fn test_validate_file_type() {
        assert!(validate_file_type("report.PDF", &["pdf"]).is_ok());
        assert!(validate_file_type("report.docx", &["pdf"]).is_err());
    }

    #[test]
    fn test_validate_non_blank() {
        assert!(validate_non_blank("text", "chest pain").is_ok());
        assert!(validate_non_blank("text", " \n\t").is_err());
    }
}
