//! Render descriptions.
//!
//! `Template` is the opaque value that flows from widgets to a render slot.
//! The router never looks inside it; only the mount helpers ask for its
//! first element.

use serde::Serialize;
use std::fmt;

/// A declarative render description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Template {
    /// Raw text.
    Text { text: String },
    /// A single element with children.
    Element { tag: String, children: Vec<Template> },
    /// A sequence of siblings.
    Fragment { children: Vec<Template> },
}

impl Template {
    pub fn text(text: impl Into<String>) -> Self {
        Template::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, children: impl IntoIterator<Item = Template>) -> Self {
        Template::Element {
            tag: tag.into(),
            children: children.into_iter().collect(),
        }
    }

    pub fn fragment(children: impl IntoIterator<Item = Template>) -> Self {
        Template::Fragment {
            children: children.into_iter().collect(),
        }
    }

    /// A template that renders nothing.
    pub fn empty() -> Self {
        Template::Fragment {
            children: Vec::new(),
        }
    }

    /// The first top-level element, looking through fragments.
    pub fn first_element(&self) -> Option<&Template> {
        match self {
            Template::Text { .. } => None,
            Template::Element { .. } => Some(self),
            Template::Fragment { children } => children.iter().find_map(Template::first_element),
        }
    }

    /// Concatenated text of the whole tree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Template::Text { text } => out.push_str(text),
            Template::Element { children, .. } | Template::Fragment { children } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Text { text } => f.write_str(text),
            Template::Element { tag, children } => {
                write!(f, "<{tag}>")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
            Template::Fragment { children } => {
                for child in children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Template::text(text)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Template::text(text)
    }
}

macro_rules! template_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Template {
                fn from(value: $ty) -> Self {
                    Template::text(value.to_string())
                }
            }
        )*
    };
}

template_from_display!(i32, i64, u32, u64, usize);

/// Output of a matcher: a template, or "leave the slot as it is".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Render {
    Template(Template),
    NoChange,
}

impl From<Template> for Render {
    fn from(template: Template) -> Self {
        Render::Template(template)
    }
}
