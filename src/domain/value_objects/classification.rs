//! Vehicle classification tag

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entity::ValueObject;
use crate::shared::DomainError;

/// Rental class of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleClassification {
    Economy,
    Compact,
    Intermediate,
    Standard,
    FullSize,
    Premium,
    Luxury,
    Suv,
    Van,
}

impl ValueObject for VehicleClassification {}

impl VehicleClassification {
    pub const ALL: [VehicleClassification; 9] = [
        Self::Economy,
        Self::Compact,
        Self::Intermediate,
        Self::Standard,
        Self::FullSize,
        Self::Premium,
        Self::Luxury,
        Self::Suv,
        Self::Van,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economy => "ECONOMY",
            Self::Compact => "COMPACT",
            Self::Intermediate => "INTERMEDIATE",
            Self::Standard => "STANDARD",
            Self::FullSize => "FULL_SIZE",
            Self::Premium => "PREMIUM",
            Self::Luxury => "LUXURY",
            Self::Suv => "SUV",
            Self::Van => "VAN",
        }
    }

    /// Price multiplier applied on top of the base hourly rate when
    /// classification pricing is enabled.
    pub fn rate_multiplier(&self) -> Decimal {
        match self {
            Self::Economy | Self::Compact => Decimal::ONE,
            Self::Intermediate => Decimal::new(11, 1),
            Self::Standard => Decimal::new(12, 1),
            Self::FullSize => Decimal::new(13, 1),
            Self::Suv | Self::Van => Decimal::new(14, 1),
            Self::Premium => Decimal::new(15, 1),
            Self::Luxury => Decimal::TWO,
        }
    }
}

impl Default for VehicleClassification {
    fn default() -> Self {
        Self::Economy
    }
}

impl std::fmt::Display for VehicleClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClassification {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| {
                DomainError::validation(format!("unknown vehicle classification '{}'", s))
            })
    }
}
