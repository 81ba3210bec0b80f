use serde::{Deserialize, Serialize};

use crate::codes::{Amount, Payments, SiteOfService};
use crate::error::LookupError;
use crate::store::CodeRepository;

/// Lowest margin classified as profitable.
pub const PROFITABLE_MIN: Amount = 1000.0;
/// Lowest margin classified as break-even; anything below is a loss.
pub const BREAK_EVEN_MIN: Amount = -500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Profitable,
    BreakEven,
    Loss,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profitable => "profitable",
            Self::BreakEven => "break-even",
            Self::Loss => "loss",
        }
    }
}

/// A scenario request that has passed validation. Only `ScenarioRequest::new` and
/// `ScenarioRequest::from_json` construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRequest {
    pub(crate) code: String,
    pub(crate) site_of_service: SiteOfService,
    pub(crate) device_cost: Amount,
    pub(crate) ntap_add_on: Option<Amount>,
}

impl ScenarioRequest {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn site_of_service(&self) -> SiteOfService {
        self.site_of_service
    }

    pub fn device_cost(&self) -> Amount {
        self.device_cost
    }

    pub fn ntap_add_on(&self) -> Option<Amount> {
        self.ntap_add_on
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResponse {
    pub base_payment: Amount,
    pub add_on_payment: Amount,
    pub total_payment: Amount,
    pub margin: Amount,
    pub classification: Classification,
}

pub fn classify(margin: Amount) -> Classification {
    if margin >= PROFITABLE_MIN {
        Classification::Profitable
    } else if margin >= BREAK_EVEN_MIN {
        Classification::BreakEven
    } else {
        Classification::Loss
    }
}

/// Pure margin calculation. Inputs are assumed validated; nothing is rounded.
pub fn calculate_scenario(
    payments: &Payments,
    site: SiteOfService,
    device_cost: Amount,
    ntap_add_on: Option<Amount>,
) -> ScenarioResponse {
    let base_payment = payments.get(site);
    let add_on_payment = ntap_add_on.unwrap_or(0.0);
    let total_payment = base_payment + add_on_payment;
    let margin = total_payment - device_cost;

    ScenarioResponse {
        base_payment,
        add_on_payment,
        total_payment,
        margin,
        classification: classify(margin),
    }
}

/// Resolves the request's code and runs the calculator on its payment table.
pub fn run_scenario<R>(
    repo: &R,
    request: &ScenarioRequest,
) -> Result<ScenarioResponse, LookupError>
where
    R: CodeRepository + ?Sized,
{
    let record = repo
        .get_by_code(&request.code)?
        .ok_or_else(|| LookupError::NotFound(request.code.clone()))?;

    Ok(calculate_scenario(
        record.payments(),
        request.site_of_service,
        request.device_cost,
        request.ntap_add_on,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::builtin_records;
    use crate::store::InMemoryCodeRepository;
    use proptest::prelude::*;

    fn dialysis() -> Payments {
        Payments::new(12485.0, 11639.0, 7650.0, 3845.0)
    }

    fn hopd_9000() -> Payments {
        Payments::new(10000.0, 9000.0, 7000.0, 4000.0)
    }

    #[test]
    fn hopd_with_add_on() {
        let r = calculate_scenario(&dialysis(), SiteOfService::Hopd, 5800.0, Some(3770.0));
        assert_eq!(r.base_payment, 11639.0);
        assert_eq!(r.add_on_payment, 3770.0);
        assert_eq!(r.total_payment, 15409.0);
        assert_eq!(r.margin, 9609.0);
        assert_eq!(r.classification, Classification::Profitable);
    }

    #[test]
    fn asc_without_add_on() {
        let r = calculate_scenario(&dialysis(), SiteOfService::Asc, 4000.0, None);
        assert_eq!(r.base_payment, 7650.0);
        assert_eq!(r.add_on_payment, 0.0);
        assert_eq!(r.total_payment, 7650.0);
        assert_eq!(r.margin, 3650.0);
        assert_eq!(r.classification, Classification::Profitable);
    }

    #[test]
    fn margin_at_break_even_floor() {
        let r = calculate_scenario(&hopd_9000(), SiteOfService::Hopd, 9500.0, None);
        assert_eq!(r.margin, -500.0);
        assert_eq!(r.classification, Classification::BreakEven);
    }

    #[test]
    fn margin_below_break_even_floor_is_loss() {
        let r = calculate_scenario(&hopd_9000(), SiteOfService::Hopd, 10000.0, None);
        assert_eq!(r.margin, -1000.0);
        assert_eq!(r.classification, Classification::Loss);
    }

    #[test]
    fn add_on_lifts_margin_to_profitable_floor() {
        let r = calculate_scenario(&hopd_9000(), SiteOfService::Hopd, 10000.0, Some(2000.0));
        assert_eq!(r.total_payment, 11000.0);
        assert_eq!(r.margin, PROFITABLE_MIN);
        assert_eq!(r.classification, Classification::Profitable);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(PROFITABLE_MIN), Classification::Profitable);
        assert_eq!(classify(PROFITABLE_MIN - 1.0), Classification::BreakEven);
        assert_eq!(classify(0.0), Classification::BreakEven);
        assert_eq!(classify(BREAK_EVEN_MIN), Classification::BreakEven);
        assert_eq!(classify(BREAK_EVEN_MIN - 1.0), Classification::Loss);
    }

    #[test]
    fn response_serializes_camel_case() {
        let r = calculate_scenario(&hopd_9000(), SiteOfService::Hopd, 9500.0, None);
        let v = serde_json::to_value(r).unwrap();
        assert_eq!(v["basePayment"], 9000.0);
        assert_eq!(v["addOnPayment"], 0.0);
        assert_eq!(v["classification"], "break-even");
    }

    #[test]
    fn run_scenario_resolves_code() {
        let repo = InMemoryCodeRepository::new(builtin_records().unwrap()).unwrap();
        let req =
            ScenarioRequest::new("36903", SiteOfService::Hopd, 5800.0, Some(3770.0)).unwrap();
        let r = run_scenario(&repo, &req).unwrap();
        assert_eq!(r.margin, 9609.0);
    }

    #[test]
    fn run_scenario_unknown_code_is_not_found() {
        let repo = InMemoryCodeRepository::new(builtin_records().unwrap()).unwrap();
        let req = ScenarioRequest::new("00000", SiteOfService::Asc, 1.0, None).unwrap();
        match run_scenario(&repo, &req) {
            Err(LookupError::NotFound(code)) => assert_eq!(code, "00000"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    fn site() -> impl Strategy<Value = SiteOfService> {
        prop::sample::select(SiteOfService::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn zero_cost_margin_is_site_payment(
            ipps in 0u32..1_000_000,
            hopd in 0u32..1_000_000,
            asc in 0u32..1_000_000,
            obl in 0u32..1_000_000,
            site in site(),
        ) {
            let p = Payments::new(ipps.into(), hopd.into(), asc.into(), obl.into());
            let r = calculate_scenario(&p, site, 0.0, Some(0.0));
            prop_assert_eq!(r.base_payment, p.get(site));
            prop_assert_eq!(r.margin, p.get(site));
        }

        #[test]
        fn totals_are_consistent(
            base in 0u32..1_000_000,
            cost in 0u32..1_000_000,
            add_on in proptest::option::of(0u32..100_000),
            site in site(),
        ) {
            let b = f64::from(base);
            let p = Payments::new(b, b, b, b);
            let r = calculate_scenario(&p, site, cost.into(), add_on.map(f64::from));
            prop_assert_eq!(r.add_on_payment, add_on.map(f64::from).unwrap_or(0.0));
            prop_assert_eq!(r.total_payment, r.base_payment + r.add_on_payment);
            prop_assert_eq!(r.margin, r.total_payment - f64::from(cost));
            prop_assert_eq!(r.classification, classify(r.margin));
        }
    }
}
