//! Stay segments derived for each encounter.
//!
//! Under [`LocationPolicy::Direct`] an encounter stays at its service
//! provider for its whole period. Under
//! [`LocationPolicy::DurationHeuristic`] the stay length picks a fixed
//! route through synthetic wards:
//!
//! | stay          | segments                                          |
//! |---------------|---------------------------------------------------|
//! | > 10 hours    | ER 2h, gap 1h, ICU 3h, gap 1h, hospital unit rest |
//! | > 5 hours     | trauma unit 3h, gap 1h, rehabilitation unit rest  |
//! | otherwise     | service provider, whole period                    |
//!
//! Gaps are transit time and belong to no location.

use chrono::{DateTime, FixedOffset, TimeDelta};

use fhirmap_model::LocationPolicy;

/// A ward that exists only in the mapped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticLocation {
    /// Stable natural id registered in the location sequence.
    pub natural_id: &'static str,
    pub name: &'static str,
    pub type_code: &'static str,
    pub type_display: &'static str,
}

/// Code system of [`SyntheticLocation::type_code`].
pub const ROLE_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-RoleCode";

pub const EMERGENCY_ROOM: SyntheticLocation = SyntheticLocation {
    natural_id: "fhirmap:location:emergency-room",
    name: "Emergency room",
    type_code: "ER",
    type_display: "Emergency room",
};

pub const INTENSIVE_CARE_UNIT: SyntheticLocation = SyntheticLocation {
    natural_id: "fhirmap:location:intensive-care-unit",
    name: "Intensive care unit",
    type_code: "ICU",
    type_display: "Intensive care unit",
};

pub const HOSPITAL_UNIT: SyntheticLocation = SyntheticLocation {
    natural_id: "fhirmap:location:hospital-unit",
    name: "Hospital unit",
    type_code: "HU",
    type_display: "Hospital unit",
};

pub const EMERGENCY_TRAUMA_UNIT: SyntheticLocation = SyntheticLocation {
    natural_id: "fhirmap:location:emergency-trauma-unit",
    name: "Emergency trauma unit",
    type_code: "ETU",
    type_display: "Emergency trauma unit",
};

pub const REHABILITATION_UNIT: SyntheticLocation = SyntheticLocation {
    natural_id: "fhirmap:location:rehabilitation-hospital-unit",
    name: "Rehabilitation hospital unit",
    type_code: "RHU",
    type_display: "Rehabilitation hospital unit",
};

/// Where a segment takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayLocation {
    /// The encounter's own service-provider organization.
    ServiceProvider,
    Synthetic(SyntheticLocation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaySegment {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub location: StayLocation,
}

impl StaySegment {
    fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        location: StayLocation,
    ) -> Self {
        Self {
            start,
            end,
            location,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Derives the stay segments of one encounter.
///
/// Without a start there is nothing to place. A missing end is treated as
/// a zero-length stay.
pub fn synthesize_stay(
    policy: LocationPolicy,
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
) -> Vec<StaySegment> {
    let Some(start) = start else {
        return Vec::new();
    };
    let end = end.unwrap_or(start);
    let whole = StaySegment::new(start, end, StayLocation::ServiceProvider);

    if policy == LocationPolicy::Direct {
        return vec![whole];
    }

    let hours = TimeDelta::hours;
    let stay = end - start;
    if stay > hours(10) {
        vec![
            StaySegment::new(
                start,
                start + hours(2),
                StayLocation::Synthetic(EMERGENCY_ROOM),
            ),
            StaySegment::new(
                start + hours(3),
                start + hours(6),
                StayLocation::Synthetic(INTENSIVE_CARE_UNIT),
            ),
            StaySegment::new(
                start + hours(7),
                end,
                StayLocation::Synthetic(HOSPITAL_UNIT),
            ),
        ]
    } else if stay > hours(5) {
        vec![
            StaySegment::new(
                start,
                start + hours(3),
                StayLocation::Synthetic(EMERGENCY_TRAUMA_UNIT),
            ),
            StaySegment::new(
                start + hours(4),
                end,
                StayLocation::Synthetic(REHABILITATION_UNIT),
            ),
        ]
    } else {
        vec![whole]
    }
}
