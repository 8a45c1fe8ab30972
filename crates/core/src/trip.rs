//! Trip and participant rules.
//!
//! A trip spans an inclusive date range. Each participant may narrow that to
//! a presence range, which must stay inside the trip range. A participant is
//! invited first and moves to accepted exactly once; declining removes the
//! invitation and there is no way back from accepted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use splittrip_shared::{AppError, Currency, Money};
use thiserror::Error;

/// Errors raised by trip and participant rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripRuleError {
    /// A range ends before it starts.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },

    /// A presence range leaves the trip range.
    #[error("presence dates must lie within the trip dates {trip_start}..={trip_end}")]
    PresenceOutsideTrip {
        /// Trip start.
        trip_start: NaiveDate,
        /// Trip end.
        trip_end: NaiveDate,
    },

    /// A required text field is blank.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Amount is zero or negative.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    /// Amount is not in the trip currency.
    #[error("trip uses {expected}, got {actual}")]
    WrongCurrency {
        /// Trip currency.
        expected: Currency,
        /// Supplied currency.
        actual: Currency,
    },

    /// Actor has not accepted the trip.
    #[error("user is not an accepted participant of this trip")]
    NotAccepted,

    /// Invitation already exists.
    #[error("user is already a participant of this trip")]
    AlreadyParticipant,

    /// Invitation was already accepted.
    #[error("invitation already accepted")]
    AlreadyAccepted,
}

impl From<TripRuleError> for AppError {
    fn from(err: TripRuleError) -> Self {
        match err {
            TripRuleError::NotAccepted => Self::Forbidden(err.to_string()),
            TripRuleError::AlreadyParticipant | TripRuleError::AlreadyAccepted => {
                Self::Conflict(err.to_string())
            }
            TripRuleError::InvalidDateRange { .. }
            | TripRuleError::PresenceOutsideTrip { .. }
            | TripRuleError::EmptyField(_)
            | TripRuleError::NonPositiveAmount(_)
            | TripRuleError::WrongCurrency { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

/// Inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates an ordered range.
    ///
    /// # Errors
    ///
    /// Returns `TripRuleError::InvalidDateRange` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TripRuleError> {
        if start > end {
            return Err(TripRuleError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Optional presence bounds of one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// First day present.
    pub start: Option<NaiveDate>,
    /// Last day present.
    pub end: Option<NaiveDate>,
}

impl Presence {
    /// Checks the bounds against a trip range.
    ///
    /// A missing bound defaults to the matching trip bound.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound leaves the trip or the bounds are reversed.
    pub fn validate_within(&self, trip: &DateRange) -> Result<(), TripRuleError> {
        let start = self.start.unwrap_or(trip.start);
        let end = self.end.unwrap_or(trip.end);
        if !trip.contains_date(start) || !trip.contains_date(end) {
            return Err(TripRuleError::PresenceOutsideTrip {
                trip_start: trip.start,
                trip_end: trip.end,
            });
        }
        DateRange::new(start, end).map(|_| ())
    }
}

/// Participant state before deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    /// Invited, not yet answered.
    Invited,
    /// Accepted the invitation.
    Accepted,
}

impl ParticipantStatus {
    /// Maps the stored acceptance flag.
    #[must_use]
    pub const fn from_accepted(is_accepted: bool) -> Self {
        if is_accepted {
            Self::Accepted
        } else {
            Self::Invited
        }
    }

    /// Validates `Invited -> Accepted`.
    ///
    /// # Errors
    ///
    /// Returns `TripRuleError::AlreadyAccepted` from the accepted state.
    pub fn accept(self) -> Result<Self, TripRuleError> {
        match self {
            Self::Invited => Ok(Self::Accepted),
            Self::Accepted => Err(TripRuleError::AlreadyAccepted),
        }
    }

    /// Validates declining, which deletes the invitation.
    ///
    /// # Errors
    ///
    /// Returns `TripRuleError::AlreadyAccepted` from the accepted state.
    pub fn decline(self) -> Result<(), TripRuleError> {
        match self {
            Self::Invited => Ok(()),
            Self::Accepted => Err(TripRuleError::AlreadyAccepted),
        }
    }
}

/// Editable trip fields after a patch has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripFields {
    /// Trip name.
    pub name: String,
    /// Where the trip happens.
    pub location: String,
    /// Free text.
    pub description: Option<String>,
    /// Trip dates.
    pub dates: DateRange,
}

/// A partial update; blank strings count as not supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripPatch {
    /// New name.
    pub name: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
}

fn supplied(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TripPatch {
    /// Overlays the patch on `current` and re-checks every range.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting dates are reversed or no longer
    /// contain one of `presences`.
    pub fn apply(
        self,
        current: &TripFields,
        presences: &[Presence],
    ) -> Result<TripFields, TripRuleError> {
        let dates = DateRange::new(
            self.start_date.unwrap_or(current.dates.start),
            self.end_date.unwrap_or(current.dates.end),
        )?;
        for presence in presences {
            presence.validate_within(&dates)?;
        }
        Ok(TripFields {
            name: supplied(self.name).unwrap_or_else(|| current.name.clone()),
            location: supplied(self.location).unwrap_or_else(|| current.location.clone()),
            description: supplied(self.description).or_else(|| current.description.clone()),
            dates,
        })
    }
}

/// Requires a non-blank text field.
///
/// # Errors
///
/// Returns `TripRuleError::EmptyField` for blank input.
pub fn require_text(field: &'static str, value: &str) -> Result<String, TripRuleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TripRuleError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Checks that an amount recorded in a trip is positive and in its currency.
///
/// # Errors
///
/// Returns `NonPositiveAmount` or `WrongCurrency`.
pub fn validate_trip_amount(amount: &Money, trip_currency: Currency) -> Result<(), TripRuleError> {
    if amount.currency() != trip_currency {
        return Err(TripRuleError::WrongCurrency {
            expected: trip_currency,
            actual: amount.currency(),
        });
    }
    if !amount.is_positive() {
        return Err(TripRuleError::NonPositiveAmount(*amount));
    }
    Ok(())
}

/// Requires the actor to be an accepted participant.
///
/// # Errors
///
/// Returns `TripRuleError::NotAccepted` for invited or absent actors.
pub fn ensure_accepted(status: Option<ParticipantStatus>) -> Result<(), TripRuleError> {
    match status {
        Some(ParticipantStatus::Accepted) => Ok(()),
        _ => Err(TripRuleError::NotAccepted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use splittrip_shared::ErrorKind;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn july() -> DateRange {
        DateRange::new(d(7, 1), d(7, 31)).unwrap()
    }

    fn fields() -> TripFields {
        TripFields {
            name: "Alps".into(),
            location: "Chamonix".into(),
            description: None,
            dates: july(),
        }
    }

    #[test]
    fn test_date_range_requires_order() {
        assert!(DateRange::new(d(7, 1), d(7, 1)).is_ok());
        assert!(matches!(
            DateRange::new(d(7, 2), d(7, 1)),
            Err(TripRuleError::InvalidDateRange { .. })
        ));
    }

    #[rstest]
    #[case(None, None, true)]
    #[case(Some(d(7, 1)), Some(d(7, 31)), true)]
    #[case(Some(d(7, 10)), None, true)]
    #[case(None, Some(d(7, 5)), true)]
    #[case(Some(d(6, 30)), Some(d(7, 5)), false)]
    #[case(Some(d(7, 5)), Some(d(8, 1)), false)]
    #[case(Some(d(7, 10)), Some(d(7, 5)), false)]
    fn test_presence_within_trip(
        #[case] start: Option<NaiveDate>,
        #[case] end: Option<NaiveDate>,
        #[case] ok: bool,
    ) {
        let presence = Presence { start, end };
        assert_eq!(presence.validate_within(&july()).is_ok(), ok);
    }

    #[test]
    fn test_participant_transitions() {
        assert_eq!(
            ParticipantStatus::Invited.accept(),
            Ok(ParticipantStatus::Accepted)
        );
        assert_eq!(
            ParticipantStatus::Accepted.accept(),
            Err(TripRuleError::AlreadyAccepted)
        );
        assert!(ParticipantStatus::Invited.decline().is_ok());
        assert!(ParticipantStatus::Accepted.decline().is_err());
    }

    #[test]
    fn test_patch_ignores_blank_fields() {
        let patch = TripPatch {
            name: Some("  ".into()),
            location: Some("Zermatt".into()),
            description: Some(String::new()),
            ..TripPatch::default()
        };
        let updated = patch.apply(&fields(), &[]).unwrap();
        assert_eq!(updated.name, "Alps");
        assert_eq!(updated.location, "Zermatt");
        assert_eq!(updated.description, None);
        assert_eq!(updated.dates, july());
    }

    #[test]
    fn test_patch_rejects_reversed_dates() {
        let patch = TripPatch {
            start_date: Some(d(8, 5)),
            ..TripPatch::default()
        };
        assert!(matches!(
            patch.apply(&fields(), &[]),
            Err(TripRuleError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_patch_must_keep_presence_ranges() {
        let presence = Presence {
            start: Some(d(7, 20)),
            end: Some(d(7, 25)),
        };
        let shrink = TripPatch {
            end_date: Some(d(7, 22)),
            ..TripPatch::default()
        };
        assert!(matches!(
            shrink.apply(&fields(), &[presence]),
            Err(TripRuleError::PresenceOutsideTrip { .. })
        ));

        let ok = TripPatch {
            end_date: Some(d(7, 25)),
            ..TripPatch::default()
        };
        assert_eq!(ok.apply(&fields(), &[presence]).unwrap().dates.end(), d(7, 25));
    }

    #[test]
    fn test_trip_amount_rules() {
        let eur = |minor| Money::from_minor(minor, Currency::EUR);
        assert!(validate_trip_amount(&eur(1), Currency::EUR).is_ok());
        assert!(matches!(
            validate_trip_amount(&eur(0), Currency::EUR),
            Err(TripRuleError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            validate_trip_amount(&eur(-100), Currency::EUR),
            Err(TripRuleError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            validate_trip_amount(&eur(100), Currency::USD),
            Err(TripRuleError::WrongCurrency { .. })
        ));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::from(TripRuleError::NotAccepted).kind(), ErrorKind::Forbidden);
        assert_eq!(
            AppError::from(TripRuleError::AlreadyParticipant).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(TripRuleError::EmptyField("name")).kind(),
            ErrorKind::BadRequest
        );
        assert!(ensure_accepted(Some(ParticipantStatus::Invited)).is_err());
        assert!(ensure_accepted(None).is_err());
        assert!(ensure_accepted(Some(ParticipantStatus::Accepted)).is_ok());
    }
}
