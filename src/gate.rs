//! Render-time gating: show-vs-fallback branches and route guards.
//!
//! Gates are pure read-time decisions over an `Ability`; they hold no
//! state, trigger no I/O, and mutate nothing. Reactivity comes from the
//! caller re-evaluating on each session snapshot notification.

use serde_json::Value;

use crate::ability::types::{Action, Subject};
use crate::ability::Ability;
use crate::session::{AuthPhase, SessionSnapshot};

/// A declarative permission requirement for a slice of UI.
#[derive(Debug, Clone)]
pub struct Gate {
    action: Action,
    subject: Subject,
    field: Option<String>,
}

/// What a gate decided: render the guarded content, or its fallback
/// (default: nothing). Denial is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Show,
    Fallback,
}

impl Gate {
    pub fn new(action: Action, subject: Subject) -> Self {
        Self {
            action,
            subject,
            field: None,
        }
    }

    /// Narrow the gate to a single field of the subject.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn outcome(&self, ability: &Ability) -> GateOutcome {
        self.outcome_with_context(ability, None)
    }

    /// Evaluate with a context record for condition-bearing rules.
    pub fn outcome_with_context(&self, ability: &Ability, context: Option<&Value>) -> GateOutcome {
        let granted =
            ability.can_with_context(self.action, self.subject, self.field.as_deref(), context);
        if granted {
            GateOutcome::Show
        } else {
            GateOutcome::Fallback
        }
    }

    /// Children-vs-fallback convenience: returns `granted` when the check
    /// passes, `fallback` otherwise.
    pub fn select<T>(&self, ability: &Ability, granted: T, fallback: T) -> T {
        match self.outcome(ability) {
            GateOutcome::Show => granted,
            GateOutcome::Fallback => fallback,
        }
    }
}

/// What a route guard decided for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity/permissions still being resolved; show a loading state,
    /// not a denial.
    Loading,
    /// No authenticated session.
    RedirectToLogin,
    Allow,
    /// Authenticated but not permitted; show the access-denied screen.
    Denied,
}

/// A navigation-time check: authentication first, then an optional
/// permission requirement.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    requirement: Option<Gate>,
}

impl RouteGuard {
    /// Guard that only requires an authenticated session.
    pub fn authenticated() -> Self {
        Self { requirement: None }
    }

    /// Guard that requires an authenticated session plus a passing gate.
    pub fn requiring(gate: Gate) -> Self {
        Self {
            requirement: Some(gate),
        }
    }

    pub fn decide(&self, snapshot: &SessionSnapshot) -> GuardDecision {
        let decision = match snapshot.phase {
            AuthPhase::Resolving => GuardDecision::Loading,
            AuthPhase::Anonymous => GuardDecision::RedirectToLogin,
            AuthPhase::Authenticated => match &self.requirement {
                None => GuardDecision::Allow,
                Some(gate) => match gate.outcome(&snapshot.ability) {
                    GateOutcome::Show => GuardDecision::Allow,
                    GateOutcome::Fallback => GuardDecision::Denied,
                },
            },
        };
        tracing::debug!(?decision, phase = ?snapshot.phase, "route guard");
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::types::Rule;
    use crate::session::Identity;
    use std::sync::Arc;

    fn snapshot(phase: AuthPhase, ability: Ability) -> SessionSnapshot {
        let identity = matches!(phase, AuthPhase::Authenticated).then(|| Identity {
            user_id: "u-1".into(),
            username: "amira".into(),
            display_name: None,
        });
        SessionSnapshot {
            phase,
            identity,
            ability: Arc::new(ability),
        }
    }

    #[test]
    fn gate_shows_on_grant() {
        let ability = Ability::new(vec![Rule::new(Action::Read, Subject::Reports)]);
        let gate = Gate::new(Action::Read, Subject::Reports);
        assert_eq!(gate.outcome(&ability), GateOutcome::Show);
    }

    #[test]
    fn gate_falls_back_on_denial() {
        let gate = Gate::new(Action::Read, Subject::Reports);
        assert_eq!(gate.outcome(&Ability::none()), GateOutcome::Fallback);
    }

    #[test]
    fn gate_select_picks_children_or_fallback() {
        let ability = Ability::new(vec![Rule::new(Action::Read, Subject::Reports)]);
        let gate = Gate::new(Action::Read, Subject::Reports);
        assert_eq!(gate.select(&ability, "reports", "not authorized"), "reports");
        assert_eq!(
            gate.select(&Ability::none(), "reports", "not authorized"),
            "not authorized"
        );
    }

    #[test]
    fn field_gate() {
        let rule = Rule::new(Action::Update, Subject::Product)
            .with_fields(["price"])
            .unwrap();
        let ability = Ability::new(vec![rule]);

        let price = Gate::new(Action::Update, Subject::Product).with_field("price");
        let stock = Gate::new(Action::Update, Subject::Product).with_field("stock");
        assert_eq!(price.outcome(&ability), GateOutcome::Show);
        assert_eq!(stock.outcome(&ability), GateOutcome::Fallback);
    }

    #[test]
    fn gate_with_context() {
        let rule = Rule::new(Action::Update, Subject::SalesInvoice)
            .with_condition("record.open")
            .unwrap();
        let ability = Ability::new(vec![rule]);
        let gate = Gate::new(Action::Update, Subject::SalesInvoice);

        assert_eq!(gate.outcome(&ability), GateOutcome::Fallback);
        let open = serde_json::json!({ "record": { "open": true } });
        assert_eq!(
            gate.outcome_with_context(&ability, Some(&open)),
            GateOutcome::Show
        );
    }

    #[test]
    fn guard_loading_while_resolving() {
        let guard = RouteGuard::requiring(Gate::new(Action::Read, Subject::Dashboard));
        let snap = snapshot(AuthPhase::Resolving, Ability::none());
        assert_eq!(guard.decide(&snap), GuardDecision::Loading);
    }

    #[test]
    fn guard_redirects_anonymous() {
        let guard = RouteGuard::authenticated();
        let snap = snapshot(AuthPhase::Anonymous, Ability::none());
        assert_eq!(guard.decide(&snap), GuardDecision::RedirectToLogin);
    }

    #[test]
    fn guard_allows_authenticated_without_requirement() {
        let guard = RouteGuard::authenticated();
        let snap = snapshot(AuthPhase::Authenticated, Ability::none());
        assert_eq!(guard.decide(&snap), GuardDecision::Allow);
    }

    #[test]
    fn guard_checks_requirement_when_authenticated() {
        let guard = RouteGuard::requiring(Gate::new(Action::Read, Subject::Reports));

        let granted = snapshot(
            AuthPhase::Authenticated,
            Ability::new(vec![Rule::new(Action::Read, Subject::Reports)]),
        );
        assert_eq!(guard.decide(&granted), GuardDecision::Allow);

        let denied = snapshot(AuthPhase::Authenticated, Ability::none());
        assert_eq!(guard.decide(&denied), GuardDecision::Denied);
    }
}
