//! Capability checks over the `{action, subject, conditions}` grants the
//! backend attaches to a login session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::UserId;

/// One granted permission. `conditions` restrict entity-level checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub action: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Map<String, Value>>,
}

impl Grant {
    pub fn new(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self { action: action.into(), subject: subject.into(), conditions: None }
    }

    pub fn with_condition(mut self, key: impl Into<String>, value: Value) -> Self {
        self.conditions
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    fn matches_action(&self, action: &str) -> bool {
        self.action == action || self.action == "manage"
    }

    fn matches_kind(&self, kind: &str) -> bool {
        self.subject == kind || self.subject == "all"
    }
}

/// The user a check runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
}

/// What is being acted on: a type name, or a concrete record.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Type(&'a str),
    Entity { kind: &'a str, fields: &'a Value },
}

impl Subject<'_> {
    pub fn kind(&self) -> &str {
        match self {
            Subject::Type(kind) => kind,
            Subject::Entity { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ability {
    grants: Vec<Grant>,
}

impl Ability {
    pub fn new(grants: Vec<Grant>) -> Self {
        Self { grants }
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    /// Evaluate `action` on `subject`. Unknown actions or subjects are
    /// simply not permitted.
    ///
    /// Type-level checks ignore conditions. Entity checks require every
    /// condition to hold; the `owner_field` condition holds when the
    /// entity's field is truthy or equals the actor's id.
    pub fn can(
        &self,
        action: &str,
        subject: &Subject,
        owner_field: &str,
        actor: Option<&Actor>,
    ) -> bool {
        self.grants
            .iter()
            .filter(|g| g.matches_action(action) && g.matches_kind(subject.kind()))
            .any(|g| match (subject, &g.conditions) {
                (Subject::Type(_), _) | (_, None) => true,
                (Subject::Entity { fields, .. }, Some(conditions)) => {
                    conditions.iter().all(|(key, expected)| {
                        condition_holds(key, expected, fields, owner_field, actor)
                    })
                }
            })
    }

    /// Run `f` only when the check passes.
    pub fn gate<T>(
        &self,
        action: &str,
        subject: &Subject,
        owner_field: &str,
        actor: Option<&Actor>,
        f: impl FnOnce() -> T,
    ) -> Option<T> {
        self.can(action, subject, owner_field, actor).then(f)
    }
}

fn condition_holds(
    key: &str,
    expected: &Value,
    fields: &Value,
    owner_field: &str,
    actor: Option<&Actor>,
) -> bool {
    let actual = fields.get(key).unwrap_or(&Value::Null);
    if key == owner_field && is_truthy(expected) {
        return is_truthy(actual)
            || actor.is_some_and(|a| loose_eq(actual, &Value::from(a.id)));
    }
    loose_eq(actual, expected)
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Scalar equality across JSON types: `true` == `"true"`, `1` == `"1"`.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::String(s), other) | (other, Value::String(s)) => match other {
            Value::Bool(_) | Value::Number(_) => s.eq_ignore_ascii_case(&other.to_string()),
            _ => false,
        },
        _ => a == b,
    }
}
