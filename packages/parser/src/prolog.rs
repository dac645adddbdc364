use serde::{Deserialize, Serialize};

/// Declaration emitted when the source had none.
pub const DEFAULT_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Doctype emitted when the source had none.
pub const DEFAULT_DOCTYPE: &str =
    r#"<!DOCTYPE topic PUBLIC "-//OASIS//DTD LIGHTWEIGHT DITA Topic//EN" "lw-topic.dtd">"#;

/// XML declaration and DOCTYPE exactly as they appeared in the source.
///
/// Captured parts are re-emitted byte for byte; missing parts fall back to
/// [`DEFAULT_DECLARATION`] and [`DEFAULT_DOCTYPE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prolog {
    pub declaration: Option<String>,
    pub doctype: Option<String>,
}

impl Prolog {
    pub fn new(declaration: Option<String>, doctype: Option<String>) -> Self {
        Self {
            declaration,
            doctype,
        }
    }

    /// Nothing was captured from the source.
    pub fn is_default(&self) -> bool {
        self.declaration.is_none() && self.doctype.is_none()
    }

    pub fn declaration(&self) -> &str {
        self.declaration.as_deref().unwrap_or(DEFAULT_DECLARATION)
    }

    pub fn doctype(&self) -> &str {
        self.doctype.as_deref().unwrap_or(DEFAULT_DOCTYPE)
    }

    /// Declaration and doctype, each followed by a newline.
    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.declaration(), self.doctype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prolog() {
        let prolog = Prolog::default();
        assert!(prolog.is_default());
        assert_eq!(
            prolog.render(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE topic PUBLIC \"-//OASIS//DTD LIGHTWEIGHT DITA Topic//EN\" \"lw-topic.dtd\">\n"
        );
    }

    #[test]
    fn test_partial_prolog_falls_back_per_part() {
        let prolog = Prolog::new(Some("<?xml version=\"1.4\"?>".to_string()), None);
        assert!(!prolog.is_default());
        assert_eq!(prolog.declaration(), "<?xml version=\"1.4\"?>");
        assert_eq!(prolog.doctype(), DEFAULT_DOCTYPE);
    }
}
