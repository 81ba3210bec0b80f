//! Validation of untrusted scenario input. Every bad field is reported, not just the first.

use serde_json::{Map, Value};

use crate::codes::{Amount, SiteOfService};
use crate::error::{ValidationError, ValidationIssue};
use crate::scenario::ScenarioRequest;

pub const INVALID_REQUEST: &str = "Invalid request data";

const REQUIRED: &str = "Required";
const EXPECTED_OBJECT: &str = "Expected object";
const EXPECTED_STRING: &str = "Expected string";
const EXPECTED_NUMBER: &str = "Expected number";
const EMPTY_STRING: &str = "String must contain at least 1 character(s)";
const NEGATIVE_NUMBER: &str = "Number must be greater than or equal to 0";
const INVALID_SITE: &str = "Invalid enum value. Expected 'IPPS' | 'HOPD' | 'ASC' | 'OBL'";

impl ScenarioRequest {
    pub fn new(
        code: impl Into<String>,
        site_of_service: SiteOfService,
        device_cost: Amount,
        ntap_add_on: Option<Amount>,
    ) -> Result<Self, ValidationError> {
        let code = code.into();
        let mut issues = Vec::new();
        if code.is_empty() {
            issues.push(ValidationIssue::new("code", EMPTY_STRING));
        }
        check_amount("deviceCost", device_cost, &mut issues);
        if let Some(v) = ntap_add_on {
            check_amount("ntapAddOn", v, &mut issues);
        }
        if !issues.is_empty() {
            return Err(ValidationError::with_details(INVALID_REQUEST, issues));
        }
        Ok(Self {
            code,
            site_of_service,
            device_cost,
            ntap_add_on,
        })
    }

    /// Parses a JSON request body `{code, siteOfService, deviceCost, ntapAddOn?}`.
    /// Unknown fields are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = body.as_object() else {
            return Err(ValidationError::with_details(
                INVALID_REQUEST,
                vec![ValidationIssue::new("", EXPECTED_OBJECT)],
            ));
        };

        let mut issues = Vec::new();
        let code = required_code(obj, &mut issues);
        let site = required_site(obj, &mut issues);
        let device_cost = match obj.get("deviceCost") {
            None => {
                issues.push(ValidationIssue::new("deviceCost", REQUIRED));
                None
            }
            Some(v) => amount("deviceCost", v, &mut issues),
        };
        let ntap_add_on = obj
            .get("ntapAddOn")
            .and_then(|v| amount("ntapAddOn", v, &mut issues));

        match (code, site, device_cost) {
            (Some(code), Some(site_of_service), Some(device_cost)) if issues.is_empty() => {
                Ok(Self {
                    code,
                    site_of_service,
                    device_cost,
                    ntap_add_on,
                })
            }
            _ => Err(ValidationError::with_details(INVALID_REQUEST, issues)),
        }
    }
}

fn required_code(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    match obj.get("code") {
        None => {
            issues.push(ValidationIssue::new("code", REQUIRED));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            issues.push(ValidationIssue::new("code", EMPTY_STRING));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new("code", EXPECTED_STRING));
            None
        }
    }
}

fn required_site(
    obj: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<SiteOfService> {
    match obj.get("siteOfService") {
        None => {
            issues.push(ValidationIssue::new("siteOfService", REQUIRED));
            None
        }
        Some(v) => match v.as_str().map(str::parse::<SiteOfService>) {
            Some(Ok(site)) => Some(site),
            _ => {
                issues.push(ValidationIssue::new("siteOfService", INVALID_SITE));
                None
            }
        },
    }
}

fn amount(path: &str, v: &Value, issues: &mut Vec<ValidationIssue>) -> Option<Amount> {
    let Some(n) = v.as_f64() else {
        issues.push(ValidationIssue::new(path, EXPECTED_NUMBER));
        return None;
    };
    if check_amount(path, n, issues) {
        Some(n)
    } else {
        None
    }
}

fn check_amount(path: &str, n: Amount, issues: &mut Vec<ValidationIssue>) -> bool {
    if !n.is_finite() {
        issues.push(ValidationIssue::new(path, EXPECTED_NUMBER));
        return false;
    }
    if n < 0.0 {
        issues.push(ValidationIssue::new(path, NEGATIVE_NUMBER));
        return false;
    }
    true
}
