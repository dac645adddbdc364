//! Finite-state matcher over child-kind sequences.
//!
//! A compiled [`ContentModel`] is a list of terms. The matcher state is the
//! index of the current term plus how many children that term has consumed.
//! Matching is greedy: a child is consumed by the current term whenever the
//! term admits it and still has room, and the matcher never moves back to an
//! earlier term.

use crate::error::SchemaResult;
use crate::kind::NodeKind;
use crate::pattern::{parse_pattern, PatternTerm, Quantifier};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    alternatives: Vec<NodeKind>,
    quantifier: Quantifier,
}

impl Term {
    pub fn alternatives(&self) -> &[NodeKind] {
        &self.alternatives
    }

    pub fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        self.alternatives.contains(&kind)
    }

    pub fn min(&self) -> usize {
        self.quantifier.min()
    }

    fn has_room(&self, count: usize) -> bool {
        self.quantifier.max().map_or(true, |max| count < max)
    }

    /// Kind used when the term has to be synthesised.
    pub fn first(&self) -> NodeKind {
        self.alternatives[0]
    }
}

impl From<PatternTerm> for Term {
    fn from(term: PatternTerm) -> Self {
        Self {
            alternatives: term.alternatives,
            quantifier: term.quantifier,
        }
    }
}

/// Position of the matcher inside a content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchState {
    term: usize,
    count: usize,
}

/// Why a child sequence does not satisfy a content model.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The child at `index` cannot appear there.
    Unexpected { index: usize, kind: NodeKind },
    /// The sequence ended before a required term was satisfied.
    Missing { expected: Vec<NodeKind> },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Unexpected { index, kind } => {
                write!(f, "unexpected {} at position {}", kind, index)
            }
            Mismatch::Missing { expected } => {
                let names: Vec<_> = expected.iter().map(|k| k.as_str()).collect();
                write!(f, "missing required {}", names.join(" | "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentModel {
    source: &'static str,
    terms: Vec<Term>,
}

impl ContentModel {
    pub fn compile<G>(owner: NodeKind, source: &'static str, resolve_group: G) -> SchemaResult<Self>
    where
        G: Fn(&str) -> Option<&'static [NodeKind]>,
    {
        let terms = parse_pattern(owner, source, resolve_group)?
            .into_iter()
            .map(Term::from)
            .collect();
        Ok(Self { source, terms })
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True when no children are allowed at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True when `kind` may appear somewhere among the children.
    pub fn admits(&self, kind: NodeKind) -> bool {
        self.terms.iter().any(|term| term.contains(kind))
    }

    pub fn start(&self) -> MatchState {
        MatchState::default()
    }

    pub fn step(&self, mut state: MatchState, kind: NodeKind) -> Option<MatchState> {
        while let Some(term) = self.terms.get(state.term) {
            if term.contains(kind) && term.has_room(state.count) {
                return Some(MatchState {
                    term: state.term,
                    count: state.count + 1,
                });
            }
            if state.count < term.min() {
                return None;
            }
            state = MatchState {
                term: state.term + 1,
                count: 0,
            };
        }
        None
    }

    pub fn is_accepting(&self, state: MatchState) -> bool {
        self.first_unsatisfied(state).is_none()
    }

    fn first_unsatisfied(&self, state: MatchState) -> Option<&Term> {
        self.terms
            .iter()
            .enumerate()
            .skip(state.term)
            .find(|(index, term)| {
                let count = if *index == state.term { state.count } else { 0 };
                count < term.min()
            })
            .map(|(_, term)| term)
    }

    /// Kinds that have a transition out of `state`.
    pub fn allowed_next(&self, state: MatchState) -> Vec<NodeKind> {
        let mut allowed: Vec<NodeKind> = Vec::new();
        for (index, term) in self.terms.iter().enumerate().skip(state.term) {
            let count = if index == state.term { state.count } else { 0 };
            if term.has_room(count) {
                for kind in &term.alternatives {
                    if !allowed.contains(kind) {
                        allowed.push(*kind);
                    }
                }
            }
            if count < term.min() {
                break;
            }
        }
        allowed
    }

    /// Run the whole sequence through the matcher.
    pub fn matches<I>(&self, children: I) -> Result<(), Mismatch>
    where
        I: IntoIterator<Item = NodeKind>,
    {
        let mut state = self.start();
        for (index, kind) in children.into_iter().enumerate() {
            state = self
                .step(state, kind)
                .ok_or(Mismatch::Unexpected { index, kind })?;
        }
        match self.first_unsatisfied(state) {
            Some(term) => Err(Mismatch::Missing {
                expected: term.alternatives.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self, children: &[NodeKind]) -> bool {
        self.matches(children.iter().copied()).is_ok()
    }

    /// Would the sequence still be valid with `kind` inserted before `index`?
    pub fn allows_insert(&self, children: &[NodeKind], index: usize, kind: NodeKind) -> bool {
        if index > children.len() {
            return false;
        }
        let (before, after) = children.split_at(index);
        self.matches(
            before
                .iter()
                .copied()
                .chain(std::iter::once(kind))
                .chain(after.iter().copied()),
        )
        .is_ok()
    }

    /// The minimal child sequence that satisfies the model: every required
    /// term contributes its minimum count of its first alternative.
    pub fn required_fill(&self) -> Vec<NodeKind> {
        self.terms
            .iter()
            .flat_map(|term| std::iter::repeat(term.first()).take(term.min()))
            .collect()
    }

    /// A minimal valid sequence containing `kind`, with the slot `kind`
    /// occupies. `None` when no such sequence exists.
    pub fn fill_around(&self, kind: NodeKind) -> Option<(Vec<NodeKind>, usize)> {
        let mut children = Vec::new();
        let mut slot = None;
        for term in &self.terms {
            if slot.is_none() && term.contains(kind) {
                slot = Some(children.len());
                children.push(kind);
                children.extend(std::iter::repeat(term.first()).take(term.min().saturating_sub(1)));
            } else {
                children.extend(std::iter::repeat(term.first()).take(term.min()));
            }
        }
        let slot = slot?;
        self.is_valid(&children).then_some((children, slot))
    }
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_empty() {
            f.write_str("EMPTY")
        } else {
            f.write_str(self.source)
        }
    }
}
