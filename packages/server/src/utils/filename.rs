/// Why an uploaded file name was rejected.
#[derive(Debug)]
pub enum FilenameError {
    Empty,
    TooLong,
    ContainsPathSeparator,
    NullByte,
    ControlCharacter,
    Hidden,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "File must have a name",
            Self::TooLong => "File name exceeds 255 characters",
            Self::ContainsPathSeparator => "Invalid file name: path separators are not allowed",
            Self::NullByte => "Invalid file name: null bytes are not allowed",
            Self::ControlCharacter => "Invalid file name: control characters are not allowed",
            Self::Hidden => "Invalid file name: hidden files (starting with '.') are not allowed",
        }
    }
}

/// Validates the client-supplied name of an uploaded file and returns it trimmed.
pub fn validate_upload_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.chars().count() > 255 {
        return Err(FilenameError::TooLong);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // The name is forwarded to the extraction service in a multipart header.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// MIME type implied by the file extension, if any.
pub fn mime_from_filename(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
}
