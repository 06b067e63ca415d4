//! Translation of backend permission payloads into rules.
//!
//! Two input forms, both pure: a role name dispatched over a closed enum,
//! and a list of `"<action>-<subject>"` grant strings. Malformed input is
//! dropped with a warning, never turned into a rule and never escalated
//! into an error on the render path.

use crate::ability::types::{Action, Rule, Subject};

/// The closed set of back-office roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Manager,
    Clerk,
}

impl Role {
    /// Case-insensitive parse. The backend's `"user"` role maps to
    /// `Clerk` to avoid colliding with the `User` subject.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" | "clerk" => Some(Role::Clerk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Clerk => "clerk",
        }
    }

    /// The fixed rule list granted by this role.
    pub fn rules(&self) -> Vec<Rule> {
        match self {
            Role::Admin => vec![Rule::new(Action::Manage, Subject::All)],
            Role::Manager => {
                let managed = [
                    Subject::Product,
                    Subject::Category,
                    Subject::Supplier,
                    Subject::Customer,
                    Subject::Expense,
                    Subject::PurchaseInvoice,
                    Subject::SalesInvoice,
                ];
                let mut rules = vec![Rule::new(Action::Read, Subject::Dashboard)];
                for subject in managed {
                    rules.push(Rule::new(Action::Create, subject));
                    rules.push(Rule::new(Action::Read, subject));
                    rules.push(Rule::new(Action::Update, subject));
                }
                rules.push(Rule::new(Action::Read, Subject::Reports));
                rules
            }
            Role::Clerk => vec![
                Rule::new(Action::Read, Subject::Dashboard),
                Rule::new(Action::Create, Subject::SalesInvoice),
                Rule::new(Action::Read, Subject::SalesInvoice),
                Rule::new(Action::Update, Subject::SalesInvoice),
            ],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission payload shape a backend can return for an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSource {
    /// A single role name, mapped through the static role table.
    Role(String),
    /// Explicit `"<action>-<subject>"` grant strings.
    Grants(Vec<String>),
}

/// Map a role name to its rule list. Unrecognized roles yield no
/// permissions.
pub fn rules_for_role(name: &str) -> Vec<Rule> {
    match Role::parse(name) {
        Some(role) => role.rules(),
        None => {
            tracing::warn!(role = name, "unrecognized role, granting no permissions");
            Vec::new()
        }
    }
}

/// Map backend grant strings to rules. Each entry is `"<action>-<subject>"`
/// split on the first `-`; entries that do not parse against the closed
/// action/subject sets are dropped.
pub fn rules_for_grants<S: AsRef<str>>(grants: &[S]) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(grants.len());
    for grant in grants {
        let grant = grant.as_ref();
        match parse_grant(grant) {
            Some(rule) => rules.push(rule),
            None => {
                tracing::warn!(grant, "dropping malformed permission grant");
            }
        }
    }
    rules
}

/// Map either payload form.
pub fn rules_for_source(source: &PermissionSource) -> Vec<Rule> {
    match source {
        PermissionSource::Role(name) => rules_for_role(name),
        PermissionSource::Grants(grants) => rules_for_grants(grants),
    }
}

fn parse_grant(grant: &str) -> Option<Rule> {
    let (action, subject) = grant.split_once('-')?;
    let action = Action::parse(action)?;
    let subject = Subject::parse(subject)?;
    Some(Rule::new(action, subject))
}
