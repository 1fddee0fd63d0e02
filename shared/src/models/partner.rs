//! Partner registration (individual sellers and businesses)

use serde::{Deserialize, Serialize};

use crate::types::MediaAsset;
use crate::validation::validate_email;

/// Kind of partner account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    Individual,
    Business,
}

impl PartnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerType::Individual => "individual",
            PartnerType::Business => "business",
        }
    }
}

/// Review status of a partner application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PartnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerStatus::Pending => "pending",
            PartnerStatus::Approved => "approved",
            PartnerStatus::Rejected => "rejected",
        }
    }
}

/// Identity document accepted for individual KYC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KycIdType {
    Aadhaar,
    Passport,
    DrivingLicense,
    VoterId,
}

/// What a business intends to list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingPreference {
    Rent,
    Sell,
    Both,
}

/// Individual KYC details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndividualKyc {
    pub full_name: String,
    pub kyc_id_type: KycIdType,
    pub kyc_id_number: String,
    pub kyc_document: Option<MediaAsset>,
}

/// A document attached to a business application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDocument {
    pub document: MediaAsset,
    pub id_type: Option<String>,
}

/// Business details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetails {
    pub listing_preference: ListingPreference,
    pub business_name: String,
    pub years_operation: String,
    pub business_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub contact_name: String,
    pub email: String,
    pub number: String,
    pub documents: Vec<BusinessDocument>,
}

/// Partner application as submitted by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRegistration {
    pub partner_type: PartnerType,
    pub individual_kyc: Option<IndividualKyc>,
    pub business_details: Option<BusinessDetails>,
    #[serde(default)]
    pub terms_accepted: bool,
}

/// The details kept for a partner: exactly one branch per partner type
#[derive(Debug, Clone, PartialEq)]
pub enum PartnerDetails {
    Individual(IndividualKyc),
    Business(BusinessDetails),
}

impl PartnerRegistration {
    /// Validate the application and keep only the branch matching the type
    pub fn into_details(self) -> Result<PartnerDetails, &'static str> {
        match self.partner_type {
            PartnerType::Individual => {
                let kyc = self
                    .individual_kyc
                    .ok_or("Individual KYC details are required")?;
                if kyc.full_name.trim().is_empty() {
                    return Err("KYC full name is required");
                }
                if kyc.kyc_id_number.trim().is_empty() {
                    return Err("KYC ID number is required");
                }
                Ok(PartnerDetails::Individual(kyc))
            }
            PartnerType::Business => {
                let details = self
                    .business_details
                    .ok_or("Business details are required")?;
                let required = [
                    &details.business_name,
                    &details.years_operation,
                    &details.business_address,
                    &details.city,
                    &details.state,
                    &details.postal_code,
                    &details.country,
                    &details.contact_name,
                    &details.number,
                ];
                if required.iter().any(|field| field.trim().is_empty()) {
                    return Err("All business details are required");
                }
                validate_email(&details.email)?;
                if details.documents.is_empty() {
                    return Err("At least one business document is required");
                }
                Ok(PartnerDetails::Business(details))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kyc() -> IndividualKyc {
        IndividualKyc {
            full_name: "Asha Rao".into(),
            kyc_id_type: KycIdType::Passport,
            kyc_id_number: "P1234567".into(),
            kyc_document: None,
        }
    }

    #[test]
    fn test_individual_keeps_only_kyc() {
        let reg = PartnerRegistration {
            partner_type: PartnerType::Individual,
            individual_kyc: Some(kyc()),
            business_details: None,
            terms_accepted: true,
        };
        assert_eq!(reg.into_details().unwrap(), PartnerDetails::Individual(kyc()));
    }

    #[test]
    fn test_business_requires_details() {
        let reg = PartnerRegistration {
            partner_type: PartnerType::Business,
            individual_kyc: Some(kyc()),
            business_details: None,
            terms_accepted: true,
        };
        assert_eq!(reg.into_details(), Err("Business details are required"));
    }

    #[test]
    fn test_kyc_id_type_wire_names() {
        let json = serde_json::to_string(&KycIdType::DrivingLicense).unwrap();
        assert_eq!(json, "\"driving_license\"");
    }
}
