use std::fmt;

use serde_json::Value;

use crate::ability::condition::Predicate;
use crate::ability::errors::AbilityError;

/// Operation kinds checked against a subject. `Manage` is the wildcard
/// action and matches every other action during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Manage,
    ];

    /// Strict parse from the lowercase wire form. Anything else is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Action::Read),
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            "manage" => Some(Action::Manage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain entity types an action can target, plus two sentinels: `All`
/// (wildcard subject) and `NotDeleted` (soft-delete filter marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Dashboard,
    Product,
    Category,
    Supplier,
    Customer,
    Expense,
    PurchaseInvoice,
    SalesInvoice,
    Reports,
    User,
    All,
    NotDeleted,
}

impl Subject {
    pub const VARIANTS: [Subject; 12] = [
        Subject::Dashboard,
        Subject::Product,
        Subject::Category,
        Subject::Supplier,
        Subject::Customer,
        Subject::Expense,
        Subject::PurchaseInvoice,
        Subject::SalesInvoice,
        Subject::Reports,
        Subject::User,
        Subject::All,
        Subject::NotDeleted,
    ];

    /// Strict parse from the PascalCase wire form. Anything else is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Dashboard" => Some(Subject::Dashboard),
            "Product" => Some(Subject::Product),
            "Category" => Some(Subject::Category),
            "Supplier" => Some(Subject::Supplier),
            "Customer" => Some(Subject::Customer),
            "Expense" => Some(Subject::Expense),
            "PurchaseInvoice" => Some(Subject::PurchaseInvoice),
            "SalesInvoice" => Some(Subject::SalesInvoice),
            "Reports" => Some(Subject::Reports),
            "User" => Some(Subject::User),
            "All" => Some(Subject::All),
            "NotDeleted" => Some(Subject::NotDeleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Dashboard => "Dashboard",
            Subject::Product => "Product",
            Subject::Category => "Category",
            Subject::Supplier => "Supplier",
            Subject::Customer => "Customer",
            Subject::Expense => "Expense",
            Subject::PurchaseInvoice => "PurchaseInvoice",
            Subject::SalesInvoice => "SalesInvoice",
            Subject::Reports => "Reports",
            Subject::User => "User",
            Subject::All => "All",
            Subject::NotDeleted => "NotDeleted",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grant record: an action on a subject, optionally narrowed to a
/// field list and/or a condition predicate. Immutable once built; duplicate
/// and overlapping rules are permitted and all are considered.
#[derive(Debug, Clone)]
pub struct Rule {
    action: Action,
    subject: Subject,
    fields: Option<Vec<String>>,
    condition: Option<Predicate>,
}

impl Rule {
    pub fn new(action: Action, subject: Subject) -> Self {
        Self {
            action,
            subject,
            fields: None,
            condition: None,
        }
    }

    /// Narrow the rule to the given fields. The list must be non-empty;
    /// omit the restriction entirely to grant the whole subject.
    pub fn with_fields<I, S>(mut self, fields: I) -> Result<Self, AbilityError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(AbilityError::EmptyFieldList {
                subject: self.subject.to_string(),
            });
        }
        self.fields = Some(fields);
        Ok(self)
    }

    /// Attach a condition predicate, compiled immediately so a malformed
    /// expression surfaces here rather than at check time.
    pub fn with_condition(mut self, source: &str) -> Result<Self, AbilityError> {
        self.condition = Some(Predicate::parse(source)?);
        Ok(self)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn condition(&self) -> Option<&Predicate> {
        self.condition.as_ref()
    }

    /// The universal super-rule: unconditional `manage` on `All`.
    pub fn is_unrestricted(&self) -> bool {
        self.action == Action::Manage
            && self.subject == Subject::All
            && self.fields.is_none()
            && self.condition.is_none()
    }

    /// Whether this rule grants `action` on `subject` (and `field`, if one
    /// is being checked), given an optional evaluation context. A rule with
    /// a condition but no supplied context never grants.
    pub(crate) fn grants(
        &self,
        action: Action,
        subject: Subject,
        field: Option<&str>,
        context: Option<&Value>,
    ) -> bool {
        if self.action != Action::Manage && self.action != action {
            return false;
        }
        if self.subject != Subject::All && self.subject != subject {
            return false;
        }
        if let (Some(field), Some(allowed)) = (field, self.fields.as_deref()) {
            if !allowed.iter().any(|f| f == field) {
                return false;
            }
        }
        match (&self.condition, context) {
            (Some(predicate), Some(ctx)) => predicate.matches(ctx),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}
