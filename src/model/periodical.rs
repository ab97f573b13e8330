use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{non_empty, AggregateMeta, AggregateType, ValidationError};
use crate::eventstore::{Aggregate, Event, RepositoryError};

/// 12-bit set of calendar months, bit 0 = January
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthMask(u16);

impl MonthMask {
    pub const ALL: MonthMask = MonthMask(0x0FFF);

    /// An empty mask means every month
    pub fn new(bits: u16) -> Self {
        match bits & Self::ALL.0 {
            0 => Self::ALL,
            bits => MonthMask(bits),
        }
    }

    /// Mask for a list of 1-based months
    pub fn from_months(months: &[u32]) -> Result<Self, ValidationError> {
        let mut bits = 0;
        for &month in months {
            bits |= Self::for_month(month)?.0;
        }
        Ok(Self::new(bits))
    }

    /// Single-month mask for a 1-based month
    pub fn for_month(month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError(format!("month {month} is out of range")));
        }
        Ok(MonthMask(1 << (month - 1)))
    }

    /// Single-month mask for the calendar month of `date`
    pub fn of(date: &DateTime<Utc>) -> Self {
        MonthMask(1 << date.month0())
    }

    pub fn intersects(&self, other: MonthMask) -> bool {
        self.0 & other.0 != 0
    }

    /// 1-based months contained in the mask
    pub fn months(&self) -> Vec<u32> {
        (1..=12).filter(|m| self.0 & (1 << (m - 1)) != 0).collect()
    }
}

impl Default for MonthMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Payload of the created event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicalFields {
    pub checking_account: String,
    pub category: String,
    pub title: String,
    pub amount: i64,
    pub estimate: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub enabled_in: MonthMask,
    pub saving: bool,
}

impl PeriodicalFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("checkingAccount", &self.checking_account)?;
        non_empty("category", &self.category)?;
        non_empty("title", &self.title)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PeriodicalEvent {
    Created(PeriodicalFields),
}

impl PeriodicalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PeriodicalEvent::Created(_) => "PeriodicalCreated",
        }
    }
}

/// Recurring spending template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Periodical {
    #[serde(flatten)]
    pub meta: AggregateMeta,
    pub checking_account: String,
    pub category: String,
    pub title: String,
    pub amount: i64,
    pub estimate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    pub enabled_in: MonthMask,
    pub saving: bool,
}

impl Periodical {
    pub fn is_enabled_in(&self, month: MonthMask) -> bool {
        self.enabled_in.intersects(month)
    }
}

impl Aggregate for Periodical {
    const TYPE: AggregateType = AggregateType::Periodical;
    type Payload = PeriodicalEvent;

    fn apply(state: Option<Self>, event: &Event<Self::Payload>) -> Result<Self, RepositoryError> {
        match (state, &event.payload) {
            (None, PeriodicalEvent::Created(fields)) => Ok(Self {
                meta: AggregateMeta::new(&event.aggregate_id, event.created_at),
                checking_account: fields.checking_account.clone(),
                category: fields.category.clone(),
                title: fields.title.clone(),
                amount: fields.amount,
                estimate: fields.estimate,
                starts_at: fields.starts_at,
                enabled_in: fields.enabled_in,
                saving: fields.saving,
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_bits() {
        assert_eq!(MonthMask::for_month(1).unwrap(), MonthMask(1));
        assert_eq!(MonthMask::for_month(12).unwrap(), MonthMask(2048));
        assert!(MonthMask::for_month(0).is_err());
        assert!(MonthMask::for_month(13).is_err());

        let march = Utc.with_ymd_and_hms(2017, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(MonthMask::of(&march), MonthMask(4));
    }

    #[test]
    fn test_empty_mask_means_every_month() {
        assert_eq!(MonthMask::new(0), MonthMask::ALL);
        assert_eq!(MonthMask::from_months(&[]).unwrap(), MonthMask::ALL);
        assert_eq!(MonthMask::ALL.months().len(), 12);
    }

    #[test]
    fn test_intersects() {
        let quarterly = MonthMask::from_months(&[1, 4, 7, 10]).unwrap();
        assert_eq!(quarterly.months(), vec![1, 4, 7, 10]);
        assert!(quarterly.intersects(MonthMask::for_month(4).unwrap()));
        assert!(!quarterly.intersects(MonthMask::for_month(5).unwrap()));
    }
}
