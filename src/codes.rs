use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Monetary amount. Units are whatever the seed data uses; nothing is rounded.
pub type Amount = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SiteOfService {
    #[serde(rename = "IPPS")]
    Ipps,
    #[serde(rename = "HOPD")]
    Hopd,
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "OBL")]
    Obl,
}

impl SiteOfService {
    pub const ALL: [SiteOfService; 4] = [Self::Ipps, Self::Hopd, Self::Asc, Self::Obl];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ipps => "IPPS",
            Self::Hopd => "HOPD",
            Self::Asc => "ASC",
            Self::Obl => "OBL",
        }
    }
}

impl fmt::Display for SiteOfService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown site of service {0:?}; expected one of IPPS, HOPD, ASC, OBL")]
pub struct UnknownSite(pub String);

impl FromStr for SiteOfService {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|site| site.as_str() == s)
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}

/// Payment schedule for one procedure. Zero means the procedure is not paid at that site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payments {
    #[serde(rename = "IPPS")]
    pub ipps: Amount,
    #[serde(rename = "HOPD")]
    pub hopd: Amount,
    #[serde(rename = "ASC")]
    pub asc: Amount,
    #[serde(rename = "OBL")]
    pub obl: Amount,
}

impl Payments {
    pub fn new(ipps: Amount, hopd: Amount, asc: Amount, obl: Amount) -> Self {
        Self {
            ipps,
            hopd,
            asc,
            obl,
        }
    }

    pub fn get(&self, site: SiteOfService) -> Amount {
        match site {
            SiteOfService::Ipps => self.ipps,
            SiteOfService::Hopd => self.hopd,
            SiteOfService::Asc => self.asc,
            SiteOfService::Obl => self.obl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureCode {
    code: String,
    description: String,
    category: String,
    payments: Payments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    drg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    apc: Option<String>,
}

impl ProcedureCode {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        payments: Payments,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            category: category.into(),
            payments,
            drg: None,
            apc: None,
        }
    }

    pub fn with_drg(mut self, drg: impl Into<String>) -> Self {
        self.drg = Some(drg.into());
        self
    }

    pub fn with_apc(mut self, apc: impl Into<String>) -> Self {
        self.apc = Some(apc.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn payments(&self) -> &Payments {
        &self.payments
    }

    pub fn drg(&self) -> Option<&str> {
        self.drg.as_deref()
    }

    pub fn apc(&self) -> Option<&str> {
        self.apc.as_deref()
    }

    pub fn summary(&self) -> CodeSummary {
        CodeSummary {
            code: self.code.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
        }
    }

    /// Checks the invariants a stored record must hold: non-empty text fields and
    /// finite, non-negative payments at every site.
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            code: self.code.clone(),
            reason,
        };

        if self.code.trim().is_empty() {
            return Err(invalid("code is empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(invalid("description is empty".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(invalid("category is empty".to_string()));
        }
        for site in SiteOfService::ALL {
            let amount = self.payments.get(site);
            if !amount.is_finite() || amount < 0.0 {
                return Err(invalid(format!(
                    "{site} payment {amount} is not a non-negative amount"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSummary {
    pub code: String,
    pub description: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_parses_exact_names_only() {
        assert_eq!("HOPD".parse::<SiteOfService>(), Ok(SiteOfService::Hopd));
        assert_eq!("OBL".parse::<SiteOfService>(), Ok(SiteOfService::Obl));
        assert!("hopd".parse::<SiteOfService>().is_err());
        assert!("ER".parse::<SiteOfService>().is_err());
    }

    #[test]
    fn record_json_requires_all_four_payments() {
        let missing_obl = serde_json::json!({
            "code": "1",
            "description": "d",
            "category": "c",
            "payments": {"IPPS": 1, "HOPD": 2, "ASC": 3}
        });
        assert!(serde_json::from_value::<ProcedureCode>(missing_obl).is_err());
    }

    #[test]
    fn record_json_omits_absent_classifications() {
        let rec = ProcedureCode::new(
            "27447",
            "Total knee arthroplasty",
            "Orthopedic",
            Payments::new(1.0, 2.0, 3.0, 0.0),
        )
        .with_drg("470");
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["drg"], "470");
        assert!(v.get("apc").is_none());
        assert_eq!(v["payments"]["OBL"], 0.0);
    }

    #[test]
    fn validate_rejects_negative_payment() {
        let rec = ProcedureCode::new("X1", "desc", "cat", Payments::new(1.0, -2.0, 3.0, 0.0));
        assert!(matches!(rec.validate(), Err(StoreError::InvalidRecord { .. })));
    }

    #[test]
    fn validate_rejects_blank_description() {
        let rec = ProcedureCode::new("X1", "  ", "cat", Payments::new(1.0, 2.0, 3.0, 0.0));
        assert!(rec.validate().is_err());
    }
}
