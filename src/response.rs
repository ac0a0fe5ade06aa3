use crate::Error;

/// Result of inspecting a completed exchange's status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    /// A range was asked for but the whole resource came back
    RangeIgnored,
    /// 416: the range starts past the end of the resource
    RangeUnsatisfied,
    HttpStatus(u16),
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success)
    }

    /// Error for a non-success classification of a load of `url`.
    pub fn into_error(self, url: &str) -> Option<Error> {
        let url = url.to_string();
        match self {
            Classification::Success => None,
            Classification::RangeIgnored => Some(Error::RangeIgnored { url }),
            Classification::RangeUnsatisfied => Some(Error::RangeUnsatisfied { url }),
            Classification::HttpStatus(status) => Some(Error::HttpStatus { status, url }),
        }
    }
}

/// Classify a response status.
///
/// Status 0 comes from local access with no HTTP semantics and counts as
/// success. A successful status other than 206 on a range request is not a
/// success: offset-based parsers would read the wrong bytes.
pub fn classify(status: u16, was_range: bool) -> Classification {
    if status == 0 || (200..=300).contains(&status) {
        if was_range && status != 206 {
            Classification::RangeIgnored
        } else {
            Classification::Success
        }
    } else if status == 416 {
        Classification::RangeUnsatisfied
    } else {
        Classification::HttpStatus(status)
    }
}
