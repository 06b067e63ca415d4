//! Permission model: rules, condition predicates, role mapping, and the
//! `Ability` evaluator that answers "can the actor do this?".

pub mod condition;
pub mod errors;
pub mod mapper;
pub mod types;

use serde_json::Value;
use types::{Action, Rule, Subject};

/// An actor's permission set: an immutable, ordered sequence of rules built
/// once per login or permission refresh. Replacing permissions means
/// constructing a new `Ability` and swapping the reference; rules are never
/// mutated in place.
///
/// Matching is permissive: any matching rule grants, and the absence of a
/// matching rule is the only denial mechanism. There are no deny rules.
#[derive(Debug, Default)]
pub struct Ability {
    rules: Vec<Rule>,
    /// Cached "unconditional manage on All" short-circuit.
    unrestricted: bool,
}

impl Ability {
    /// The empty, deny-everything ability. Safe default for anonymous and
    /// not-yet-resolved sessions.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(rules: Vec<Rule>) -> Self {
        let unrestricted = rules.iter().any(Rule::is_unrestricted);
        Self {
            rules,
            unrestricted,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Subject-level check: can the actor perform `action` on `subject`?
    pub fn can(&self, action: Action, subject: Subject) -> bool {
        self.can_with_context(action, subject, None, None)
    }

    /// Field-level check against a rule's field restrictions.
    pub fn can_field(&self, action: Action, subject: Subject, field: &str) -> bool {
        self.can_with_context(action, subject, Some(field), None)
    }

    /// Full check with an optional field and an optional context record for
    /// condition predicates. Rules carrying a condition are skipped when no
    /// context is supplied.
    pub fn can_with_context(
        &self,
        action: Action,
        subject: Subject,
        field: Option<&str>,
        context: Option<&Value>,
    ) -> bool {
        if self.unrestricted {
            return true;
        }
        self.rules
            .iter()
            .any(|rule| rule.grants(action, subject, field, context))
    }
}
