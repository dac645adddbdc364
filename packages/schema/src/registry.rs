//! The LwDITA node registry.
//!
//! Every [`NodeKind`] has exactly one [`Descriptor`], produced by the
//! exhaustive table in [`node_spec`]. The registry is built once and never
//! mutated afterwards; [`Schema::lwdita`] hands out the process-wide copy.

use crate::content_model::ContentModel;
use crate::error::{SchemaError, SchemaResult};
use crate::kind::NodeKind;
use once_cell::sync::Lazy;
use tracing::debug;

use NodeKind::*;

/// Declared attribute with its default, if the vocabulary has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

const fn attr(name: &'static str) -> AttributeSpec {
    AttributeSpec { name, default: None }
}

const fn attr_default(name: &'static str, default: &'static str) -> AttributeSpec {
    AttributeSpec {
        name,
        default: Some(default),
    }
}

/// Attributes every element accepts, in serialization order.
const COMMON_ATTRIBUTES: &[AttributeSpec] = &[
    attr("id"),
    attr("conref"),
    attr("props"),
    attr("dir"),
    attr("xml:lang"),
    attr("translate"),
    attr("class"),
    attr("outputclass"),
];

pub const DITAARCH_NAMESPACE: &str = "http://dita.oasis-open.org/architecture/2005/";

const INLINE_TEXT: &[NodeKind] = &[Text, Ph, B, I, U, Sub, Sup, Data];
const ALL_INLINE: &[NodeKind] = &[Text, Ph, B, I, U, Sub, Sup, Image, Xref, Data];
const LIST_BLOCKS: &[NodeKind] = &[P, Ul, Ol, Dl, Pre, Audio, Video, Simpletable, Fig, Note];
const SIMPLE_BLOCKS: &[NodeKind] = &[P, Ul, Ol, Dl, Pre, Audio, Video, Simpletable, Fig];
const FIG_BLOCKS: &[NodeKind] = &[P, Ul, Ol, Dl, Pre, Audio, Video, Simpletable];
const FN_BLOCKS: &[NodeKind] = &[P, Ul, Ol, Dl];
const ALL_BLOCKS: &[NodeKind] = &[P, Ul, Ol, Dl, Pre, Audio, Video, Simpletable, Fig, Note, Fn];

/// Content-model groups referenced as `%name` in patterns.
pub fn group(name: &str) -> Option<&'static [NodeKind]> {
    match name {
        "inline-text" => Some(INLINE_TEXT),
        "all-inline" => Some(ALL_INLINE),
        "list-blocks" => Some(LIST_BLOCKS),
        "simple-blocks" => Some(SIMPLE_BLOCKS),
        "fig-blocks" => Some(FIG_BLOCKS),
        "fn-blocks" => Some(FN_BLOCKS),
        "all-blocks" => Some(ALL_BLOCKS),
        _ => None,
    }
}

/// Static description of one kind before its pattern is compiled.
struct NodeSpec {
    pattern: &'static str,
    presentation: &'static str,
    attributes: &'static [AttributeSpec],
    isolating: bool,
    creatable: bool,
}

impl NodeSpec {
    fn new(pattern: &'static str, presentation: &'static str) -> Self {
        Self {
            pattern,
            presentation,
            attributes: &[],
            isolating: false,
            creatable: true,
        }
    }

    fn attributes(mut self, attributes: &'static [AttributeSpec]) -> Self {
        self.attributes = attributes;
        self
    }

    fn isolating(mut self) -> Self {
        self.isolating = true;
        self
    }

    fn not_creatable(mut self) -> Self {
        self.creatable = false;
        self
    }
}

const TOPIC_ATTRIBUTES: &[AttributeSpec] = &[attr_default("xmlns:ditaarch", DITAARCH_NAMESPACE)];
const PRE_ATTRIBUTES: &[AttributeSpec] = &[attr("xml:space")];
const NOTE_ATTRIBUTES: &[AttributeSpec] = &[attr_default("type", "note")];
const IMAGE_ATTRIBUTES: &[AttributeSpec] = &[
    attr("href"),
    attr("height"),
    attr("width"),
    attr("keyref"),
    attr("scope"),
];
const XREF_ATTRIBUTES: &[AttributeSpec] =
    &[attr("href"), attr("format"), attr("scope"), attr("keyref")];
const KEYREF_ATTRIBUTES: &[AttributeSpec] = &[attr("keyref")];
const DATA_ATTRIBUTES: &[AttributeSpec] = &[attr("name"), attr("value"), attr("href")];
const AUDIO_ATTRIBUTES: &[AttributeSpec] = &[
    attr("autoplay"),
    attr("controls"),
    attr("loop"),
    attr("muted"),
];
const VIDEO_ATTRIBUTES: &[AttributeSpec] = &[
    attr("autoplay"),
    attr("controls"),
    attr("loop"),
    attr("muted"),
    attr("height"),
    attr("width"),
];
const VALUE_ATTRIBUTES: &[AttributeSpec] = &[attr("value")];
const TRACK_ATTRIBUTES: &[AttributeSpec] = &[attr("value"), attr("srclang"), attr("kind")];
const SIMPLETABLE_ATTRIBUTES: &[AttributeSpec] = &[attr("relcolwidth")];
const FN_ATTRIBUTES: &[AttributeSpec] = &[attr("callout")];

const INLINE_MARKUP: &str = "(%all-inline)*";

fn node_spec(kind: NodeKind) -> NodeSpec {
    match kind {
        Document => NodeSpec::new("topic", "doc").not_creatable(),
        Topic => NodeSpec::new("title shortdesc? prolog? body?", "article")
            .attributes(TOPIC_ATTRIBUTES)
            .isolating(),
        Title => NodeSpec::new("(%inline-text)*", "h1"),
        Shortdesc => NodeSpec::new(INLINE_MARKUP, "p"),
        Prolog => NodeSpec::new("data*", "header"),
        Body => NodeSpec::new("(%list-blocks)* section* fn*", "div"),
        Section => NodeSpec::new("title? (%all-blocks)*", "section"),
        P => NodeSpec::new(INLINE_MARKUP, "p"),
        Ul => NodeSpec::new("li+", "ul"),
        Ol => NodeSpec::new("li+", "ol"),
        Li => NodeSpec::new("(%list-blocks)+", "li"),
        Dl => NodeSpec::new("dlentry+", "dl"),
        Dlentry => NodeSpec::new("dt dd", "div"),
        Dt => NodeSpec::new(INLINE_MARKUP, "dt"),
        Dd => NodeSpec::new("(%list-blocks)*", "dd"),
        Pre => NodeSpec::new("(%inline-text | xref)*", "pre").attributes(PRE_ATTRIBUTES),
        Note => NodeSpec::new("(%simple-blocks)*", "aside")
            .attributes(NOTE_ATTRIBUTES)
            .isolating(),
        Fig => NodeSpec::new("title? desc? (%fig-blocks | image | xref)*", "figure"),
        Desc => NodeSpec::new("(%inline-text | xref)*", "figcaption"),
        Image => NodeSpec::new("alt?", "img").attributes(IMAGE_ATTRIBUTES),
        Alt => NodeSpec::new("(%inline-text)*", "span"),
        Xref => NodeSpec::new("(%inline-text | image)*", "a")
            .attributes(XREF_ATTRIBUTES)
            .not_creatable(),
        Ph => NodeSpec::new(INLINE_MARKUP, "span").attributes(KEYREF_ATTRIBUTES),
        B => NodeSpec::new(INLINE_MARKUP, "strong"),
        I => NodeSpec::new(INLINE_MARKUP, "em"),
        U => NodeSpec::new(INLINE_MARKUP, "u"),
        Sub => NodeSpec::new(INLINE_MARKUP, "sub"),
        Sup => NodeSpec::new(INLINE_MARKUP, "sup"),
        Data => NodeSpec::new("(text | data)*", "data").attributes(DATA_ATTRIBUTES),
        Audio => NodeSpec::new("desc? fallback? media-source* media-track*", "audio")
            .attributes(AUDIO_ATTRIBUTES),
        Video => NodeSpec::new(
            "desc? fallback? video-poster? media-source* media-track*",
            "video",
        )
        .attributes(VIDEO_ATTRIBUTES),
        VideoPoster => NodeSpec::new("", "img").attributes(VALUE_ATTRIBUTES),
        MediaSource => NodeSpec::new("", "source").attributes(VALUE_ATTRIBUTES),
        MediaTrack => NodeSpec::new("", "track").attributes(TRACK_ATTRIBUTES),
        Fallback => NodeSpec::new("(%fn-blocks)*", "div"),
        Simpletable => NodeSpec::new("title? sthead? strow+", "table")
            .attributes(SIMPLETABLE_ATTRIBUTES),
        Sthead => NodeSpec::new("stentry+", "thead"),
        Strow => NodeSpec::new("stentry+", "tr"),
        Stentry => NodeSpec::new("(%simple-blocks)*", "td").isolating(),
        Fn => NodeSpec::new("(%fn-blocks)*", "div")
            .attributes(FN_ATTRIBUTES)
            .isolating(),
        Text => NodeSpec::new("", "text").not_creatable(),
    }
}

/// Compiled registry entry for one node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub kind: NodeKind,
    pub content: ContentModel,
    pub presentation: &'static str,
    /// Declared attributes: the common set first, then kind-specific ones.
    pub attributes: Vec<AttributeSpec>,
    /// The command engine never looks for a host above this node.
    pub isolating: bool,
    /// Whether structural commands may create this kind at all.
    pub creatable: bool,
}

impl Descriptor {
    /// Declared attributes that carry a default value.
    pub fn default_attributes(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.attributes
            .iter()
            .filter_map(|spec| spec.default.map(|value| (spec.name, value)))
    }

    /// Position of `name` in declaration order.
    pub fn attribute_rank(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|spec| spec.name == name)
    }

    pub fn admits_text(&self) -> bool {
        self.content.admits(Text)
    }
}

/// Immutable table of every node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    descriptors: Vec<Descriptor>,
}

static LWDITA: Lazy<Schema> = Lazy::new(|| {
    Schema::build().unwrap_or_else(|err| panic!("built-in LwDITA registry is inconsistent: {}", err))
});

impl Schema {
    /// The process-wide registry.
    pub fn lwdita() -> &'static Schema {
        &LWDITA
    }

    /// Build a fresh registry from the static table.
    pub fn build() -> SchemaResult<Self> {
        let mut descriptors = Vec::with_capacity(NodeKind::ALL.len());
        for &kind in NodeKind::ALL {
            let spec = node_spec(kind);
            let content = ContentModel::compile(kind, spec.pattern, group)?;
            let attributes = if kind.is_synthetic() {
                Vec::new()
            } else {
                COMMON_ATTRIBUTES
                    .iter()
                    .chain(spec.attributes.iter())
                    .copied()
                    .collect()
            };
            descriptors.push(Descriptor {
                kind,
                content,
                presentation: spec.presentation,
                attributes,
                isolating: spec.isolating,
                creatable: spec.creatable,
            });
        }
        debug!(kinds = descriptors.len(), "Built LwDITA registry");
        Ok(Self { descriptors })
    }

    pub fn lookup(&self, kind: NodeKind) -> &Descriptor {
        &self.descriptors[kind.index()]
    }

    pub fn lookup_name(&self, name: &str) -> SchemaResult<&Descriptor> {
        let kind: NodeKind = name.parse()?;
        Ok(self.lookup(kind))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn content_model(&self, kind: NodeKind) -> &ContentModel {
        &self.lookup(kind).content
    }

    pub fn presentation_name_of(&self, kind: NodeKind) -> &'static str {
        self.lookup(kind).presentation
    }

    /// All kinds rendered as `name`, in registry order.
    pub fn kinds_with_presentation(&self, name: &str) -> Vec<NodeKind> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.presentation == name)
            .map(|descriptor| descriptor.kind)
            .collect()
    }

    /// Inverse of [`Schema::presentation_name_of`].
    ///
    /// Presentation names are shared between kinds (`div`, `p`, `span`,
    /// `img`); the parent kind narrows the candidates to the ones its
    /// content model admits.
    pub fn logical_name_of(&self, name: &str, parent: Option<NodeKind>) -> SchemaResult<NodeKind> {
        let mut candidates = self.kinds_with_presentation(name);
        if candidates.is_empty() {
            return Err(SchemaError::unknown_presentation(name, parent));
        }

        if let Some(parent_kind) = parent {
            let parent_model = self.content_model(parent_kind);
            candidates.retain(|kind| parent_model.admits(*kind));
        }

        match candidates.as_slice() {
            [] => Err(SchemaError::unknown_presentation(name, parent)),
            [kind] => Ok(*kind),
            _ => Err(SchemaError::AmbiguousPresentationName {
                name: name.to_string(),
                parent,
                candidates,
            }),
        }
    }

    /// Kinds that may contain `kind` as a direct child.
    pub fn hosts_of(&self, kind: NodeKind) -> impl Iterator<Item = NodeKind> + '_ {
        self.descriptors
            .iter()
            .filter(move |descriptor| descriptor.content.admits(kind))
            .map(|descriptor| descriptor.kind)
    }
}
