/// Result of validating an image filename from a URL path.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is a path traversal pattern (`..`).
    PathTraversal,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains characters outside `[A-Za-z0-9._-]`.
    UnsafeCharacter,
    /// Filename does not end in `.png`.
    NotPng,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::Hidden => "Invalid filename: hidden files are not allowed",
            Self::UnsafeCharacter => "Invalid filename: only letters, digits, '.', '_' and '-' are allowed",
            Self::NotPng => "Invalid filename: only .png images are served",
        }
    }
}

/// Validates a flat `.png` filename for the image-serving routes.
///
/// Both generated avatars (`avatar_<uuid>.png`) and trait assets are flat
/// PNG files; anything that could escape the serving directory is rejected
/// before the path is built.
pub fn validate_image_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    // Covers null bytes and control characters as well.
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(FilenameError::UnsafeCharacter);
    }

    if !trimmed.ends_with(".png") {
        return Err(FilenameError::NotPng);
    }

    Ok(trimmed)
}
