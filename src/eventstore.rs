//! Event-sourced aggregate repository on top of the event log tables.
//!
//! Aggregates are rebuilt by folding their events in version order. Writes
//! are guarded by optimistic concurrency: an event is only appended when the
//! stored version still equals the version the caller read.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AggregateMeta, AggregateType};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{aggregate_type} \"{aggregate_id}\" not found")]
    NotFound {
        aggregate_type: AggregateType,
        aggregate_id: String,
    },
    #[error("{aggregate_type} \"{aggregate_id}\" has been deleted")]
    Deleted {
        aggregate_type: AggregateType,
        aggregate_id: String,
    },
    #[error("{aggregate_type} \"{aggregate_id}\" has been modified: expected version {expected}, found {actual}")]
    Conflict {
        aggregate_type: AggregateType,
        aggregate_id: String,
        expected: u64,
        actual: u64,
    },
    #[error("Unhandled event {event} for {aggregate_type} \"{aggregate_id}\"")]
    UnhandledEvent {
        aggregate_type: AggregateType,
        aggregate_id: String,
        event: String,
    },
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        RepositoryError::Database(err)
    }
}

/// A persisted domain event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<P> {
    pub aggregate_id: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub payload: P,
}

/// An entity reconstructed from its event history
pub trait Aggregate: Sized {
    const TYPE: AggregateType;
    type Payload: Serialize + DeserializeOwned;

    /// Fold one event into the current state (`None` before the first event)
    fn apply(state: Option<Self>, event: &Event<Self::Payload>) -> Result<Self, RepositoryError>;

    fn meta(&self) -> &AggregateMeta;
}

/// Start a new aggregate with a random id. Returns the first event.
pub fn create<A: Aggregate>(
    db: &Database,
    payload: A::Payload,
) -> Result<Event<A::Payload>, RepositoryError> {
    let aggregate_id = uuid::Uuid::new_v4().to_string();
    append::<A>(db, aggregate_id, 0, payload)
}

/// Append an event to an existing aggregate, expecting its stored version to
/// be `aggregate.meta().version`.
pub fn persist<A: Aggregate>(
    db: &Database,
    aggregate: &A,
    payload: A::Payload,
) -> Result<Event<A::Payload>, RepositoryError> {
    let meta = aggregate.meta();
    append::<A>(db, meta.id.clone(), meta.version, payload)
}

fn append<A: Aggregate>(
    db: &Database,
    aggregate_id: String,
    expected_version: u64,
    payload: A::Payload,
) -> Result<Event<A::Payload>, RepositoryError> {
    let event = Event {
        aggregate_id,
        version: expected_version + 1,
        created_at: Utc::now(),
        payload,
    };
    let data = rmp_serde::to_vec_named(&event).map_err(DatabaseError::from)?;

    match db.append_event(A::TYPE.as_str(), &event.aggregate_id, expected_version, &data) {
        Ok(_) => Ok(event),
        Err(DatabaseError::VersionConflict { expected, actual, .. }) => {
            Err(RepositoryError::Conflict {
                aggregate_type: A::TYPE,
                aggregate_id: event.aggregate_id,
                expected,
                actual,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Rebuild an aggregate, including deleted ones. `None` if it never existed.
pub fn load<A: Aggregate>(db: &Database, aggregate_id: &str) -> Result<Option<A>, RepositoryError> {
    let mut state = None;
    for data in db.load_events(A::TYPE.as_str(), aggregate_id)? {
        let event: Event<A::Payload> = rmp_serde::from_slice(&data).map_err(DatabaseError::from)?;
        state = Some(A::apply(state, &event)?);
    }
    Ok(state)
}

/// Fetch a live aggregate
pub fn get_by_id<A: Aggregate>(db: &Database, aggregate_id: &str) -> Result<A, RepositoryError> {
    match load::<A>(db, aggregate_id)? {
        None => Err(RepositoryError::NotFound {
            aggregate_type: A::TYPE,
            aggregate_id: aggregate_id.to_string(),
        }),
        Some(aggregate) if aggregate.meta().is_deleted() => Err(RepositoryError::Deleted {
            aggregate_type: A::TYPE,
            aggregate_id: aggregate_id.to_string(),
        }),
        Some(aggregate) => Ok(aggregate),
    }
}

/// Every live aggregate of the type, in id order
pub fn find_all<A: Aggregate>(db: &Database) -> Result<Vec<A>, RepositoryError> {
    let mut aggregates = Vec::new();
    for id in db.get_aggregate_ids(A::TYPE.as_str())? {
        if let Some(aggregate) = load::<A>(db, &id)? {
            if !aggregate.meta().is_deleted() {
                aggregates.push(aggregate);
            }
        }
    }
    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckingAccount, CheckingAccountChanges, CheckingAccountEvent, CheckingAccountFields};
    use crate::testutil::setup_db;

    fn create_account(db: &Database, name: &str) -> CheckingAccount {
        let event = create::<CheckingAccount>(
            db,
            CheckingAccountEvent::Created(CheckingAccountFields::new(name, "alice")),
        )
        .unwrap();
        get_by_id(db, &event.aggregate_id).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let (db, _temp) = setup_db();
        let account = create_account(&db, "Private");

        assert_eq!(account.meta.version, 1);
        assert_eq!(account.name, "Private");
        assert_eq!(account.meta.id.len(), 36);
    }

    #[test]
    fn test_persist_increments_version() {
        let (db, _temp) = setup_db();
        let account = create_account(&db, "Private");

        let update = account
            .update(CheckingAccountChanges {
                name: Some("Shared".to_string()),
                ..Default::default()
            })
            .unwrap();
        let event = persist(&db, &account, update).unwrap();
        assert_eq!(event.version, 2);

        let account: CheckingAccount = get_by_id(&db, &account.meta.id).unwrap();
        assert_eq!(account.meta.version, 2);
        assert_eq!(account.name, "Shared");
    }

    #[test]
    fn test_persist_with_stale_aggregate_conflicts() {
        let (db, _temp) = setup_db();
        let stale = create_account(&db, "Private");

        persist(&db, &stale, stale.update(CheckingAccountChanges::default()).unwrap()).unwrap();
        let result = persist(&db, &stale, stale.delete());

        assert!(matches!(
            result,
            Err(RepositoryError::Conflict { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn test_get_missing_and_deleted() {
        let (db, _temp) = setup_db();

        let result = get_by_id::<CheckingAccount>(&db, "nope");
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

        let account = create_account(&db, "Private");
        persist(&db, &account, account.delete()).unwrap();

        let result = get_by_id::<CheckingAccount>(&db, &account.meta.id);
        assert!(matches!(result, Err(RepositoryError::Deleted { .. })));
        assert!(load::<CheckingAccount>(&db, &account.meta.id).unwrap().is_some());
    }

    #[test]
    fn test_find_all_skips_deleted() {
        let (db, _temp) = setup_db();
        let kept = create_account(&db, "Kept");
        let gone = create_account(&db, "Gone");
        persist(&db, &gone, gone.delete()).unwrap();

        let all: Vec<CheckingAccount> = find_all(&db).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].meta.id, kept.meta.id);
    }
}
