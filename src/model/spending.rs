use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{non_empty, AggregateMeta, AggregateType, ValidationError};
use crate::eventstore::{Aggregate, Event, RepositoryError};

/// Snapshot carried by the created and updated events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingFields {
    pub checking_account: String,
    pub category: String,
    pub title: String,
    /// Minor units; negative amounts are outflows
    pub amount: i64,
    pub booked: bool,
    pub booked_at: Option<DateTime<Utc>>,
    pub saving: bool,
}

impl SpendingFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("checkingAccount", &self.checking_account)?;
        non_empty("category", &self.category)?;
        non_empty("title", &self.title)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpendingEvent {
    Created(SpendingFields),
    Updated(SpendingFields),
    Deleted,
}

impl SpendingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SpendingEvent::Created(_) => "SpendingCreated",
            SpendingEvent::Updated(_) => "SpendingUpdated",
            SpendingEvent::Deleted => "SpendingDeleted",
        }
    }
}

/// Changes to an existing spending. The checking account cannot change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingChanges {
    pub category: Option<String>,
    pub title: Option<String>,
    pub amount: Option<i64>,
    pub booked: Option<bool>,
    pub booked_at: Option<DateTime<Utc>>,
    pub saving: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spending {
    #[serde(flatten)]
    pub meta: AggregateMeta,
    pub checking_account: String,
    pub category: String,
    pub title: String,
    pub amount: i64,
    pub booked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<DateTime<Utc>>,
    pub saving: bool,
}

impl Spending {
    pub fn fields(&self) -> SpendingFields {
        SpendingFields {
            checking_account: self.checking_account.clone(),
            category: self.category.clone(),
            title: self.title.clone(),
            amount: self.amount,
            booked: self.booked,
            booked_at: self.booked_at,
            saving: self.saving,
        }
    }

    /// Build the update event, merging only the provided `changes`
    pub fn update(&self, changes: SpendingChanges) -> Result<SpendingEvent, ValidationError> {
        let current = self.fields();
        let fields = SpendingFields {
            checking_account: current.checking_account,
            category: changes.category.unwrap_or(current.category),
            title: changes.title.unwrap_or(current.title),
            amount: changes.amount.unwrap_or(current.amount),
            booked: changes.booked.unwrap_or(current.booked),
            booked_at: changes.booked_at.or(current.booked_at),
            saving: changes.saving.unwrap_or(current.saving),
        };
        fields.validate()?;
        Ok(SpendingEvent::Updated(fields))
    }

    pub fn delete(&self) -> SpendingEvent {
        SpendingEvent::Deleted
    }

    fn from_fields(meta: AggregateMeta, fields: &SpendingFields) -> Self {
        Self {
            meta,
            checking_account: fields.checking_account.clone(),
            category: fields.category.clone(),
            title: fields.title.clone(),
            amount: fields.amount,
            booked: fields.booked,
            booked_at: fields.booked_at,
            saving: fields.saving,
        }
    }
}

impl Aggregate for Spending {
    const TYPE: AggregateType = AggregateType::Spending;
    type Payload = SpendingEvent;

    fn apply(state: Option<Self>, event: &Event<Self::Payload>) -> Result<Self, RepositoryError> {
        match (state, &event.payload) {
            (None, SpendingEvent::Created(fields)) => Ok(Self::from_fields(
                AggregateMeta::new(&event.aggregate_id, event.created_at),
                fields,
            )),
            (Some(spending), SpendingEvent::Updated(fields)) => Ok(Self::from_fields(
                spending.meta.updated(event.created_at),
                fields,
            )),
            (Some(spending), SpendingEvent::Deleted) => Ok(Self {
                meta: spending.meta.deleted(event.created_at),
                ..spending
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
