//! Subscription plan catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::UnknownVariant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Monthly,
    Annual,
    Lifetime,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Monthly => "monthly",
            PlanTier::Annual => "annual",
            PlanTier::Lifetime => "lifetime",
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(PlanTier::Monthly),
            "annual" => Ok(PlanTier::Annual),
            "lifetime" => Ok(PlanTier::Lifetime),
            other => Err(UnknownVariant::new("plan", other)),
        }
    }
}

/// How the payment provider charges for a plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Subscription,
    Payment,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Plan {
    pub tier: PlanTier,
    pub name: &'static str,
    /// Price in USD
    pub price: Decimal,
    pub interval: Option<&'static str>,
    pub mode: CheckoutMode,
}

/// The plans offered on the pricing page
pub fn plan_catalog() -> [Plan; 3] {
    [
        Plan {
            tier: PlanTier::Monthly,
            name: "Monthly",
            price: Decimal::from(97),
            interval: Some("month"),
            mode: CheckoutMode::Subscription,
        },
        Plan {
            tier: PlanTier::Annual,
            name: "Annual",
            price: Decimal::from(970),
            interval: Some("year"),
            mode: CheckoutMode::Subscription,
        },
        Plan {
            tier: PlanTier::Lifetime,
            name: "Lifetime",
            price: Decimal::from(1997),
            interval: None,
            mode: CheckoutMode::Payment,
        },
    ]
}

pub fn plan(tier: PlanTier) -> Plan {
    let [monthly, annual, lifetime] = plan_catalog();
    match tier {
        PlanTier::Monthly => monthly,
        PlanTier::Annual => annual,
        PlanTier::Lifetime => lifetime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_modes() {
        assert_eq!(plan(PlanTier::Monthly).mode, CheckoutMode::Subscription);
        assert_eq!(plan(PlanTier::Annual).mode, CheckoutMode::Subscription);
        assert_eq!(plan(PlanTier::Lifetime).mode, CheckoutMode::Payment);
        assert!(plan(PlanTier::Lifetime).interval.is_none());
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("annual".parse::<PlanTier>(), Ok(PlanTier::Annual));
        assert!("weekly".parse::<PlanTier>().is_err());
    }
}
