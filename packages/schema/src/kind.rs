use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! node_kinds {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Every node kind the LwDITA registry knows about.
        ///
        /// Declaration order is registry order: it decides which kind wins
        /// when several share a presentation name and nothing else
        /// separates them.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum NodeKind {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$variant),+];

            /// Canonical name, which is also the XML element name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => $name,)+
                }
            }
        }

        impl FromStr for NodeKind {
            type Err = SchemaError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($name => Ok(NodeKind::$variant),)+
                    other => Err(SchemaError::UnknownNodeKind(other.to_string())),
                }
            }
        }
    };
}

node_kinds! {
    Document => "document",
    Topic => "topic",
    Title => "title",
    P => "p",
    Shortdesc => "shortdesc",
    Prolog => "prolog",
    Body => "body",
    Section => "section",
    Ul => "ul",
    Ol => "ol",
    Li => "li",
    Dl => "dl",
    Dlentry => "dlentry",
    Dt => "dt",
    Dd => "dd",
    Pre => "pre",
    Note => "note",
    Fig => "fig",
    Desc => "desc",
    Image => "image",
    Alt => "alt",
    Xref => "xref",
    Ph => "ph",
    B => "b",
    I => "i",
    U => "u",
    Sub => "sub",
    Sup => "sup",
    Data => "data",
    Audio => "audio",
    Video => "video",
    VideoPoster => "video-poster",
    MediaSource => "media-source",
    MediaTrack => "media-track",
    Fallback => "fallback",
    Simpletable => "simpletable",
    Sthead => "sthead",
    Strow => "strow",
    Stentry => "stentry",
    Fn => "fn",
    Text => "text",
}

impl NodeKind {
    /// Kinds that never appear as XML elements.
    pub fn is_synthetic(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Text)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_registry_order_matches_discriminants() {
        for (position, kind) in NodeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "blink".parse::<NodeKind>().unwrap_err();
        assert_eq!(err, SchemaError::UnknownNodeKind("blink".to_string()));
    }

    #[test]
    fn test_serde_uses_element_names() {
        let json = serde_json::to_string(&NodeKind::MediaSource).unwrap();
        assert_eq!(json, "\"media-source\"");
        let kind: NodeKind = serde_json::from_str("\"video-poster\"").unwrap();
        assert_eq!(kind, NodeKind::VideoPoster);
    }
}
