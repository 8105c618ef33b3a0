use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for tag names.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned, lowercase element tag name.
/// Internally a `Spur` index: 4 bytes, compared and hashed in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(Spur);

impl Tag {
    /// Intern a tag name. Markup tag names are case-insensitive, so the
    /// name is lowercased before interning.
    pub fn intern(name: &str) -> Self {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            Tag(INTERNER.get_or_intern(name.to_ascii_lowercase()))
        } else {
            Tag(INTERNER.get_or_intern(name))
        }
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Whether this tag has the given (lowercase) name.
    pub fn is(&self, name: &str) -> bool {
        self.as_str() == name
    }

    /// Elements with no content and no end tag.
    pub fn is_void(&self) -> bool {
        matches!(
            self.as_str(),
            "area"
                | "base"
                | "br"
                | "col"
                | "embed"
                | "hr"
                | "img"
                | "input"
                | "link"
                | "meta"
                | "source"
                | "track"
                | "wbr"
        )
    }

    /// Elements whose content is raw text up to the matching end tag.
    pub fn is_raw_text(&self) -> bool {
        matches!(self.as_str(), "script" | "style" | "textarea" | "title")
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Tag::intern(&s))
    }
}
