//! Tunable limits shared by task services.

use crate::task::ports::PageRequest;
use serde::{Deserialize, Serialize};

/// Limits applied by task services.
///
/// # Examples
///
/// ```
/// use taskdesk::task::services::TaskPolicy;
///
/// let policy = TaskPolicy::default();
/// assert_eq!(policy.min_reason_chars, 20);
///
/// let page = policy.page(Some(0), Some(1_000));
/// assert_eq!(page.page, 1);
/// assert_eq!(page.per_page, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPolicy {
    /// Minimum length of cancellation and deletion reasons, in characters.
    pub min_reason_chars: usize,
    /// Page size used when a listing does not request one.
    pub default_page_size: u32,
    /// Largest page size a listing may request.
    pub max_page_size: u32,
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self {
            min_reason_chars: 20,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl TaskPolicy {
    /// Sets the minimum reason length.
    #[must_use]
    pub const fn with_min_reason_chars(mut self, min_reason_chars: usize) -> Self {
        self.min_reason_chars = min_reason_chars;
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub const fn with_default_page_size(mut self, default_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    /// Sets the largest page size.
    #[must_use]
    pub const fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Clamps a requested page to the configured limits.
    ///
    /// Page numbers start at one; a missing or zero page size falls back to
    /// the default.
    #[must_use]
    pub fn page(&self, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
        let max = self.max_page_size.max(1);
        let size = per_page
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
            .clamp(1, max);
        PageRequest::new(page.unwrap_or(1).max(1), size)
    }
}
