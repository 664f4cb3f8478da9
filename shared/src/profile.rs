//! Business profile completeness
//!
//! A profile may go live in the marketplace only when every required field
//! is filled in. The check is a strict conjunction: one blank field hides
//! the whole profile.

use serde::{Deserialize, Serialize};

use crate::models::{Business, ProfileState};

/// Required text fields of a business profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    ContactName,
    ContactTitle,
    BusinessEmail,
    Phone,
    CompanyName,
    Website,
    LogoUrl,
    City,
    State,
    Country,
    Industry,
    Niche,
    YearsInBusiness,
    TeamSize,
    AnnualRevenue,
    BusinessDescription,
    UniqueValueProposition,
    TargetAudience,
    IdealCustomer,
    OfferName,
    OfferDescription,
    OfferPrice,
    OfferType,
    CommissionRate,
    SalesProcess,
    CalendarLink,
}

pub const REQUIRED_FIELDS: [RequiredField; 26] = [
    RequiredField::ContactName,
    RequiredField::ContactTitle,
    RequiredField::BusinessEmail,
    RequiredField::Phone,
    RequiredField::CompanyName,
    RequiredField::Website,
    RequiredField::LogoUrl,
    RequiredField::City,
    RequiredField::State,
    RequiredField::Country,
    RequiredField::Industry,
    RequiredField::Niche,
    RequiredField::YearsInBusiness,
    RequiredField::TeamSize,
    RequiredField::AnnualRevenue,
    RequiredField::BusinessDescription,
    RequiredField::UniqueValueProposition,
    RequiredField::TargetAudience,
    RequiredField::IdealCustomer,
    RequiredField::OfferName,
    RequiredField::OfferDescription,
    RequiredField::OfferPrice,
    RequiredField::OfferType,
    RequiredField::CommissionRate,
    RequiredField::SalesProcess,
    RequiredField::CalendarLink,
];

/// Fields the short onboarding form collects before the dashboard opens
pub const ONBOARDING_FIELDS: [RequiredField; 5] = [
    RequiredField::ContactName,
    RequiredField::Phone,
    RequiredField::CompanyName,
    RequiredField::Industry,
    RequiredField::Niche,
];

impl RequiredField {
    pub fn name(&self) -> &'static str {
        match self {
            RequiredField::ContactName => "contact_name",
            RequiredField::ContactTitle => "contact_title",
            RequiredField::BusinessEmail => "business_email",
            RequiredField::Phone => "phone",
            RequiredField::CompanyName => "company_name",
            RequiredField::Website => "website",
            RequiredField::LogoUrl => "logo_url",
            RequiredField::City => "city",
            RequiredField::State => "state",
            RequiredField::Country => "country",
            RequiredField::Industry => "industry",
            RequiredField::Niche => "niche",
            RequiredField::YearsInBusiness => "years_in_business",
            RequiredField::TeamSize => "team_size",
            RequiredField::AnnualRevenue => "annual_revenue",
            RequiredField::BusinessDescription => "business_description",
            RequiredField::UniqueValueProposition => "unique_value_proposition",
            RequiredField::TargetAudience => "target_audience",
            RequiredField::IdealCustomer => "ideal_customer",
            RequiredField::OfferName => "offer_name",
            RequiredField::OfferDescription => "offer_description",
            RequiredField::OfferPrice => "offer_price",
            RequiredField::OfferType => "offer_type",
            RequiredField::CommissionRate => "commission_rate",
            RequiredField::SalesProcess => "sales_process",
            RequiredField::CalendarLink => "calendar_link",
        }
    }

    pub fn value<'a>(&self, b: &'a Business) -> &'a str {
        match self {
            RequiredField::ContactName => &b.contact_name,
            RequiredField::ContactTitle => &b.contact_title,
            RequiredField::BusinessEmail => &b.business_email,
            RequiredField::Phone => &b.phone,
            RequiredField::CompanyName => &b.company_name,
            RequiredField::Website => &b.website,
            RequiredField::LogoUrl => &b.logo_url,
            RequiredField::City => &b.city,
            RequiredField::State => &b.state,
            RequiredField::Country => &b.country,
            RequiredField::Industry => &b.industry,
            RequiredField::Niche => &b.niche,
            RequiredField::YearsInBusiness => &b.years_in_business,
            RequiredField::TeamSize => &b.team_size,
            RequiredField::AnnualRevenue => &b.annual_revenue,
            RequiredField::BusinessDescription => &b.business_description,
            RequiredField::UniqueValueProposition => &b.unique_value_proposition,
            RequiredField::TargetAudience => &b.target_audience,
            RequiredField::IdealCustomer => &b.ideal_customer,
            RequiredField::OfferName => &b.offer_name,
            RequiredField::OfferDescription => &b.offer_description,
            RequiredField::OfferPrice => &b.offer_price,
            RequiredField::OfferType => &b.offer_type,
            RequiredField::CommissionRate => &b.commission_rate,
            RequiredField::SalesProcess => &b.sales_process,
            RequiredField::CalendarLink => &b.calendar_link,
        }
    }

    /// Mutable access, used by tests and form resets
    pub fn value_mut<'a>(&self, b: &'a mut Business) -> &'a mut String {
        match self {
            RequiredField::ContactName => &mut b.contact_name,
            RequiredField::ContactTitle => &mut b.contact_title,
            RequiredField::BusinessEmail => &mut b.business_email,
            RequiredField::Phone => &mut b.phone,
            RequiredField::CompanyName => &mut b.company_name,
            RequiredField::Website => &mut b.website,
            RequiredField::LogoUrl => &mut b.logo_url,
            RequiredField::City => &mut b.city,
            RequiredField::State => &mut b.state,
            RequiredField::Country => &mut b.country,
            RequiredField::Industry => &mut b.industry,
            RequiredField::Niche => &mut b.niche,
            RequiredField::YearsInBusiness => &mut b.years_in_business,
            RequiredField::TeamSize => &mut b.team_size,
            RequiredField::AnnualRevenue => &mut b.annual_revenue,
            RequiredField::BusinessDescription => &mut b.business_description,
            RequiredField::UniqueValueProposition => &mut b.unique_value_proposition,
            RequiredField::TargetAudience => &mut b.target_audience,
            RequiredField::IdealCustomer => &mut b.ideal_customer,
            RequiredField::OfferName => &mut b.offer_name,
            RequiredField::OfferDescription => &mut b.offer_description,
            RequiredField::OfferPrice => &mut b.offer_price,
            RequiredField::OfferType => &mut b.offer_type,
            RequiredField::CommissionRate => &mut b.commission_rate,
            RequiredField::SalesProcess => &mut b.sales_process,
            RequiredField::CalendarLink => &mut b.calendar_link,
        }
    }

    pub fn is_filled(&self, b: &Business) -> bool {
        !self.value(b).trim().is_empty()
    }
}

fn has_entries(values: &[String]) -> bool {
    values.iter().any(|v| !v.trim().is_empty())
}

/// Every required field filled, `looking_for` and `partnership_opportunities` non-empty
pub fn is_profile_complete(b: &Business) -> bool {
    REQUIRED_FIELDS.iter().all(|f| f.is_filled(b))
        && has_entries(&b.looking_for)
        && has_entries(&b.partnership_opportunities)
}

/// Names of the fields still blocking the profile from going live
pub fn missing_fields(b: &Business) -> Vec<&'static str> {
    let mut missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .filter(|f| !f.is_filled(b))
        .map(|f| f.name())
        .collect();
    if !has_entries(&b.looking_for) {
        missing.push("looking_for");
    }
    if !has_entries(&b.partnership_opportunities) {
        missing.push("partnership_opportunities");
    }
    missing
}

/// Whether the short onboarding form has been completed
pub fn is_onboarding_complete(b: &Business) -> bool {
    ONBOARDING_FIELDS.iter().all(|f| f.is_filled(b))
}

/// The eight steps of the profile wizard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Contact,
    Company,
    Industry,
    Story,
    Audience,
    Offer,
    Partnerships,
    Scheduling,
}

pub const WIZARD_STEPS: [WizardStep; 8] = [
    WizardStep::Contact,
    WizardStep::Company,
    WizardStep::Industry,
    WizardStep::Story,
    WizardStep::Audience,
    WizardStep::Offer,
    WizardStep::Partnerships,
    WizardStep::Scheduling,
];

impl WizardStep {
    pub fn fields(&self) -> &'static [RequiredField] {
        use RequiredField::*;
        match self {
            WizardStep::Contact => &[ContactName, ContactTitle, BusinessEmail, Phone],
            WizardStep::Company => &[CompanyName, Website, LogoUrl, City, State, Country],
            WizardStep::Industry => &[Industry, Niche, YearsInBusiness, TeamSize, AnnualRevenue],
            WizardStep::Story => &[BusinessDescription, UniqueValueProposition],
            WizardStep::Audience => &[TargetAudience, IdealCustomer],
            WizardStep::Offer => &[OfferName, OfferDescription, OfferPrice, OfferType, CommissionRate],
            WizardStep::Partnerships => &[SalesProcess],
            WizardStep::Scheduling => &[CalendarLink],
        }
    }

    pub fn is_complete(&self, b: &Business) -> bool {
        let fields_done = self.fields().iter().all(|f| f.is_filled(b));
        match self {
            WizardStep::Partnerships => {
                fields_done && has_entries(&b.looking_for) && has_entries(&b.partnership_opportunities)
            }
            _ => fields_done,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepCompletion {
    pub step: WizardStep,
    pub complete: bool,
}

pub fn step_completion(b: &Business) -> Vec<StepCompletion> {
    WIZARD_STEPS
        .iter()
        .map(|step| StepCompletion {
            step: *step,
            complete: step.is_complete(b),
        })
        .collect()
}

/// Dashboard view of a profile's marketplace readiness
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileStatus {
    pub complete: bool,
    pub state: ProfileState,
    /// Drives the "your profile is hidden" banner; cleared as soon as the
    /// required fields are all filled
    pub hidden: bool,
    pub missing_fields: Vec<&'static str>,
    pub steps: Vec<StepCompletion>,
}

impl ProfileStatus {
    pub fn of(b: &Business) -> Self {
        let complete = is_profile_complete(b);
        Self {
            complete,
            state: b.profile_state,
            hidden: !complete,
            missing_fields: missing_fields(b),
            steps: step_completion(b),
        }
    }
}

/// State a profile should hold after an edit: a live profile that loses a
/// required field drops back to draft, a draft stays draft until published.
pub fn state_after_edit(b: &Business) -> ProfileState {
    match b.profile_state {
        ProfileState::Live if is_profile_complete(b) => ProfileState::Live,
        _ => ProfileState::Draft,
    }
}
