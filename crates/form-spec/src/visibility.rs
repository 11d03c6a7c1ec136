use std::collections::BTreeMap;

use crate::answers::{AnswerValue, Answers};
use crate::spec::{Catalog, Field};

pub type VisibilityMap = BTreeMap<String, bool>;

/// Decides whether `field` is shown for the given answers.
///
/// Every `visible_when` entry must hold: the dependency is answered, its
/// string form is non-empty and it is one of the allowed values.
pub fn is_visible(field: &Field, answers: &Answers) -> bool {
    conditions_hold(field, |key| answers.get(key))
}

fn conditions_hold<'a, F>(field: &Field, lookup: F) -> bool
where
    F: Fn(&str) -> Option<&'a AnswerValue>,
{
    field
        .visible_when
        .iter()
        .all(|(dependency, allowed)| match lookup(dependency) {
            Some(answer) => {
                let text = answer.to_text();
                !text.is_empty() && allowed.contains(&text)
            }
            None => false,
        })
}

/// Ordered subsequence of the catalog that is currently visible.
///
/// Dependencies only resolve against fields that sit strictly earlier in the
/// catalog; unknown, forward and self references read as unanswered.
pub fn project<'c>(catalog: &'c Catalog, answers: &Answers) -> Vec<&'c Field> {
    let positions = catalog.positions();
    catalog
        .fields
        .iter()
        .enumerate()
        .filter(|(index, field)| {
            conditions_hold(field, |key| match positions.get(key) {
                Some(position) if position < index => answers.get(key),
                _ => None,
            })
        })
        .map(|(_, field)| field)
        .collect()
}

/// Visibility flag for every catalog key.
pub fn resolve_visibility(catalog: &Catalog, answers: &Answers) -> VisibilityMap {
    let mut map: VisibilityMap = catalog
        .fields
        .iter()
        .map(|field| (field.key.clone(), false))
        .collect();
    for field in project(catalog, answers) {
        map.insert(field.key.clone(), true);
    }
    map
}
