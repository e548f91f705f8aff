use crate::error::AdvisorError;

/// What the transport should show the user: text plus optional button rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Vec<String>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), buttons: Vec::new() }
    }

    pub fn with_buttons(text: impl Into<String>, buttons: Vec<Vec<String>>) -> Self {
        Self { text: text.into(), buttons }
    }

    pub fn error(err: &AdvisorError) -> Self {
        let prefix = match err {
            AdvisorError::Validation(_) => "⚠️",
            _ => "❌",
        };
        Self::text(format!("{prefix} {err}"))
    }

    pub fn cancelled() -> Self {
        Self::text("🚫 Operation cancelled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_prefixes() {
        let r = Reply::error(&AdvisorError::Validation("invalid percent: x".into()));
        assert_eq!(r.text, "⚠️ invalid percent: x");
        let r = Reply::error(&AdvisorError::Backend("timeout".into()));
        assert_eq!(r.text, "❌ Backend unavailable: timeout");
        assert!(r.buttons.is_empty());
    }
}
