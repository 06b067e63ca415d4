use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AbilityError {
    #[error("Invalid condition expression: {0}")]
    #[diagnostic(
        code(tillgate::ability::invalid_condition),
        help("Supported operators: ==, !=, >, <, >=, <=, &&, ||, !, in. Paths use dot notation (e.g. actor.branch_id)")
    )]
    InvalidCondition(String),

    #[error("Field restriction on `{subject}` must list at least one field")]
    #[diagnostic(
        code(tillgate::ability::empty_field_list),
        help("Omit the field list entirely to grant the whole subject")
    )]
    EmptyFieldList { subject: String },
}
