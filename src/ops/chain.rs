//! Guard-chain composition.
//!
//! `one` resolves a single element, runs the guards in order and then the terminal
//! action. The first guard that does not hold stops the chain and becomes an error
//! carrying its guard text. `each` resolves every match and hands the whole list to the
//! action. Both append the selector to any error on the way out.

use super::outcome::Outcome;
use crate::dom::{Document, NodeId};
use crate::selector::Selector;

/// A precondition on one element. The `guard` of the returned outcome is the reason
/// reported when it does not hold.
pub type Guard = fn(&Document, NodeId) -> Outcome;

pub const NOT_FOUND: &str = "could not find DOM element matching selector";

/// Resolve the target and run the guards
fn locate(doc: &Document, selector: &Selector, guards: &[Guard]) -> Result<NodeId, Outcome> {
    let annotation = selector.annotation();
    let node = match selector.resolve_one(doc) {
        Ok(Some(node)) => node,
        Ok(None) => return Err(Outcome::error(NOT_FOUND).annotate(annotation)),
        Err(err) => return Err(Outcome::from(err).sealed()),
    };
    for guard in guards {
        let outcome = guard(doc, node);
        if !outcome.success {
            return Err(outcome.into_error().annotate(annotation));
        }
    }
    Ok(node)
}

/// Compose guards and a read-only action over one element
pub fn one(
    doc: &Document,
    selector: &Selector,
    guards: &[Guard],
    action: impl FnOnce(&Document, NodeId) -> Outcome,
) -> Outcome {
    match locate(doc, selector, guards) {
        Ok(node) => action(doc, node).annotate(selector.annotation()),
        Err(outcome) => outcome,
    }
}

/// Compose guards and a mutating action over one element
pub fn one_mut(
    doc: &mut Document,
    selector: &Selector,
    guards: &[Guard],
    action: impl FnOnce(&mut Document, NodeId) -> Outcome,
) -> Outcome {
    match locate(doc, selector, guards) {
        Ok(node) => action(doc, node).annotate(selector.annotation()),
        Err(outcome) => outcome,
    }
}

/// Run a read-only action over every match
pub fn each(doc: &Document, selector: &Selector, action: impl FnOnce(&Document, Vec<NodeId>) -> Outcome) -> Outcome {
    match selector.resolve_many(doc) {
        Ok(nodes) => action(doc, nodes).annotate(selector.annotation()),
        Err(err) => Outcome::from(err).sealed(),
    }
}

/// Run a mutating action over every match
pub fn each_mut(
    doc: &mut Document,
    selector: &Selector,
    action: impl FnOnce(&mut Document, Vec<NodeId>) -> Outcome,
) -> Outcome {
    match selector.resolve_many(doc) {
        Ok(nodes) => action(doc, nodes).annotate(selector.annotation()),
        Err(err) => Outcome::from(err).sealed(),
    }
}
