//! Selector fallback chain
//!
//! A field is located by an ordered list of candidates, each a CSS selector
//! paired with a parse rule. Candidates are tried in order and the first one
//! whose selector matches an element *and* whose rule produces a value wins.
//! A selector that matches nothing is the normal case on a drifting page,
//! so it only moves the chain along.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{ExtractError, Result};

/// Parse rule applied to a matched element.
pub type Rule<T> = Arc<dyn for<'a> Fn(ElementRef<'a>) -> Option<T> + Send + Sync>;

/// Something selectors can be run against: a whole document or a subtree.
pub trait Scope {
    fn first<'a>(&'a self, selector: &Selector) -> Option<ElementRef<'a>>;
    fn all<'a>(&'a self, selector: &Selector) -> Vec<ElementRef<'a>>;
}

impl Scope for Html {
    fn first<'a>(&'a self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.select(selector).next()
    }

    fn all<'a>(&'a self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.select(selector).collect()
    }
}

impl<'d> Scope for ElementRef<'d> {
    fn first<'a>(&'a self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.select(selector).next()
    }

    fn all<'a>(&'a self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.select(selector).collect()
    }
}

/// One locator + parse rule pair.
pub struct Candidate<T> {
    selector: Selector,
    source: String,
    rule: Rule<T>,
}

pub struct FallbackChain<T> {
    field: &'static str,
    candidates: Vec<Candidate<T>>,
}

impl<T> FallbackChain<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            candidates: Vec::new(),
        }
    }

    /// Build a chain where every selector shares the same parse rule.
    pub fn from_selectors<F>(field: &'static str, selectors: &[String], rule: F) -> Result<Self>
    where
        F: for<'a> Fn(ElementRef<'a>) -> Option<T> + Send + Sync + 'static,
    {
        let rule: Rule<T> = Arc::new(rule);
        let mut chain = Self::new(field);
        for source in selectors {
            chain.candidates.push(Candidate {
                selector: compile_one(field, source)?,
                source: source.clone(),
                rule: Arc::clone(&rule),
            });
        }
        Ok(chain)
    }

    pub fn candidate<F>(mut self, source: &str, rule: F) -> Result<Self>
    where
        F: for<'a> Fn(ElementRef<'a>) -> Option<T> + Send + Sync + 'static,
    {
        self.candidates.push(Candidate {
            selector: compile_one(self.field, source)?,
            source: source.to_string(),
            rule: Arc::new(rule),
        });
        Ok(self)
    }

    /// First value produced by the first matching element of any candidate.
    pub fn resolve<S: Scope + ?Sized>(&self, scope: &S) -> Option<T> {
        for (i, candidate) in self.candidates.iter().enumerate() {
            let Some(element) = scope.first(&candidate.selector) else {
                continue;
            };
            match (candidate.rule)(element) {
                Some(value) => {
                    debug!(field = self.field, candidate = i, selector = %candidate.source, "resolved");
                    return Some(value);
                }
                None => {
                    debug!(field = self.field, candidate = i, selector = %candidate.source, "matched but did not parse");
                }
            }
        }

        debug!(field = self.field, candidates = self.candidates.len(), "no candidate resolved");
        None
    }

    /// List variant: the rule runs on every element a candidate matches, and
    /// the first candidate yielding at least one value wins. Results from
    /// different candidates are never merged.
    pub fn resolve_all<S: Scope + ?Sized>(&self, scope: &S) -> Vec<T> {
        for (i, candidate) in self.candidates.iter().enumerate() {
            let values: Vec<T> = scope
                .all(&candidate.selector)
                .into_iter()
                .filter_map(|element| (candidate.rule)(element))
                .collect();

            if !values.is_empty() {
                debug!(field = self.field, candidate = i, selector = %candidate.source, count = values.len(), "resolved list");
                return values;
            }
        }

        debug!(field = self.field, candidates = self.candidates.len(), "no candidate produced items");
        Vec::new()
    }
}

/// Compile one selector, reporting which field it belongs to on failure.
pub fn compile_one(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

pub fn compile(field: &str, selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| compile_one(field, s)).collect()
}

/// Run several selectors in order and return the first element any of them matches.
pub fn first_match<'a, S: Scope + ?Sized>(scope: &'a S, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|selector| scope.first(selector))
}

/// Visible text of an element with whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    crate::normalize::clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text held directly by an element, ignoring descendants.
pub fn own_text(element: ElementRef<'_>) -> String {
    let direct: Vec<&str> = element
        .children()
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    crate::normalize::clean_text(&direct.join(" "))
}
