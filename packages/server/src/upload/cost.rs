use crate::gateway::FileKind;

use super::UploadError;

/// Tokens charged for one upload.
///
/// Images cost a flat `cost_per_page`; PDFs cost `pages * cost_per_page`.
/// A PDF without a positive page count is rejected.
pub fn compute_cost(
    kind: FileKind,
    page_count: Option<i64>,
    cost_per_page: i64,
) -> Result<i64, UploadError> {
    if cost_per_page <= 0 {
        return Err(UploadError::InvalidInput(format!(
            "Invalid token cost per page: {cost_per_page}"
        )));
    }
    match kind {
        FileKind::Image => Ok(cost_per_page),
        FileKind::Pdf => {
            let pages = page_count
                .filter(|&p| p > 0)
                .ok_or_else(|| UploadError::InvalidInput("Failed to count PDF pages.".into()))?;
            pages
                .checked_mul(cost_per_page)
                .ok_or_else(|| UploadError::InvalidInput("PDF is too large to price.".into()))
        }
    }
}

/// First `chars` characters of the extracted text.
pub fn preview(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}
