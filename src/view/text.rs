//! Text view: a bare string or `{ "content": ..., "format": ... }`.

use crate::view::ViewError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,

    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "plain".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawText {
    Bare(String),
    Full {
        content: String,
        #[serde(default = "default_format")]
        format: String,
    },
}

impl Text {
    pub fn validate(raw: &str) -> Result<Text, ViewError> {
        let parsed: RawText = serde_json::from_str(raw)?;
        match parsed {
            RawText::Bare(content) => Ok(Text {
                content,
                format: default_format(),
            }),
            RawText::Full { content, format } => {
                if format.is_empty() {
                    return Err(ViewError::Text("format must be non-empty".to_string()));
                }
                Ok(Text { content, format })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_accepted() {
        let text = Text::validate(r#""hello""#).unwrap();
        assert_eq!(text.content, "hello");
        assert_eq!(text.format, "plain");
    }

    #[test]
    fn object_form_keeps_format() {
        let text = Text::validate(r##"{"content":"# hi","format":"markdown"}"##).unwrap();
        assert_eq!(text.format, "markdown");
    }
}
