use serde::{Deserialize, Serialize};

use super::{non_empty, AggregateMeta, AggregateType, ValidationError};
use crate::eventstore::{Aggregate, Event, RepositoryError};

pub const DEFAULT_CURRENCY: &str = "€";

/// Full snapshot carried by the created and updated events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckingAccountFields {
    pub name: String,
    pub currency: String,
    /// Users allowed to access the account (never empty)
    pub users: Vec<String>,
    pub monthly: bool,
    pub savings: bool,
}

impl CheckingAccountFields {
    /// A new account owned by a single user, with default settings
    pub fn new(name: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: DEFAULT_CURRENCY.to_string(),
            users: vec![user.into()],
            monthly: false,
            savings: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("name", &self.name)?;
        non_empty("currency", &self.currency)?;
        if self.users.is_empty() {
            return Err(ValidationError("users must not be empty".to_string()));
        }
        for user in &self.users {
            non_empty("user", user)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CheckingAccountEvent {
    Created(CheckingAccountFields),
    Updated(CheckingAccountFields),
    Deleted,
}

impl CheckingAccountEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CheckingAccountEvent::Created(_) => "CheckingAccountCreated",
            CheckingAccountEvent::Updated(_) => "CheckingAccountUpdated",
            CheckingAccountEvent::Deleted => "CheckingAccountDeleted",
        }
    }
}

/// Properties that may be changed on an existing account. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckingAccountChanges {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub users: Option<Vec<String>>,
    pub monthly: Option<bool>,
    pub savings: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckingAccount {
    #[serde(flatten)]
    pub meta: AggregateMeta,
    pub name: String,
    pub currency: String,
    pub users: Vec<String>,
    pub monthly: bool,
    pub savings: bool,
}

impl CheckingAccount {
    pub fn has_user(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }

    pub fn fields(&self) -> CheckingAccountFields {
        CheckingAccountFields {
            name: self.name.clone(),
            currency: self.currency.clone(),
            users: self.users.clone(),
            monthly: self.monthly,
            savings: self.savings,
        }
    }

    /// Build the update event, merging `changes` over the current state
    pub fn update(&self, changes: CheckingAccountChanges) -> Result<CheckingAccountEvent, ValidationError> {
        let current = self.fields();
        let fields = CheckingAccountFields {
            name: changes.name.unwrap_or(current.name),
            currency: changes.currency.unwrap_or(current.currency),
            users: changes.users.unwrap_or(current.users),
            monthly: changes.monthly.unwrap_or(current.monthly),
            savings: changes.savings.unwrap_or(current.savings),
        };
        fields.validate()?;
        Ok(CheckingAccountEvent::Updated(fields))
    }

    pub fn delete(&self) -> CheckingAccountEvent {
        CheckingAccountEvent::Deleted
    }

    fn from_fields(meta: AggregateMeta, fields: &CheckingAccountFields) -> Self {
        Self {
            meta,
            name: fields.name.clone(),
            currency: fields.currency.clone(),
            users: fields.users.clone(),
            monthly: fields.monthly,
            savings: fields.savings,
        }
    }
}

impl Aggregate for CheckingAccount {
    const TYPE: AggregateType = AggregateType::CheckingAccount;
    type Payload = CheckingAccountEvent;

    fn apply(state: Option<Self>, event: &Event<Self::Payload>) -> Result<Self, RepositoryError> {
        match (state, &event.payload) {
            (None, CheckingAccountEvent::Created(fields)) => Ok(Self::from_fields(
                AggregateMeta::new(&event.aggregate_id, event.created_at),
                fields,
            )),
            (Some(account), CheckingAccountEvent::Updated(fields)) => Ok(Self::from_fields(
                account.meta.updated(event.created_at),
                fields,
            )),
            (Some(account), CheckingAccountEvent::Deleted) => Ok(Self {
                meta: account.meta.deleted(event.created_at),
                ..account
            }),
            (_, payload) => Err(RepositoryError::UnhandledEvent {
                aggregate_type: Self::TYPE,
                aggregate_id: event.aggregate_id.clone(),
                event: payload.name().to_string(),
            }),
        }
    }

    fn meta(&self) -> &AggregateMeta {
        &self.meta
    }
}
