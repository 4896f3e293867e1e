//! Unit and currency converter controller.
//!
//! The result is recomputed synchronously on every input or unit change.
//! Switching family resets both selectors to that family's first two units
//! and clears the input, so a result is never shown against the wrong
//! family. Currency starts empty and fills in once rates arrive.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use serde::Serialize;

use super::{Outcome, RequestGuard};
use crate::clients::{BASE_CURRENCY, RateSource};
use crate::conversion::{self, Catalog, ConversionError, FamilyKind, display_name};

pub const INVALID_INPUT: &str = "Invalid input";
pub const INVALID_UNITS: &str = "Invalid units selected";

/// Preferred counter-currency once rates are known.
const DEFAULT_QUOTE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyOption {
    pub kind: FamilyKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOption {
    pub name: String,
    pub label: String,
}

/// Everything the converter view renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterView {
    pub family: FamilyKind,
    pub families: Vec<FamilyOption>,
    pub units: Vec<UnitOption>,
    pub input: String,
    pub from: String,
    pub to: String,
    pub result: String,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct ConverterState {
    catalog: Catalog,
    kind: FamilyKind,
    input: String,
    from: String,
    to: String,
    result: String,
    loading: bool,
    error: Option<String>,
}

impl ConverterState {
    fn recompute(&mut self) {
        self.result = if self.input.trim().is_empty() {
            String::new()
        } else {
            let family = self.catalog.family(self.kind);
            match conversion::parse_value(&self.input)
                .and_then(|value| conversion::convert(value, family, &self.from, &self.to))
            {
                Ok(value) => conversion::format_result(value),
                Err(ConversionError::InvalidInput) => INVALID_INPUT.to_string(),
                Err(ConversionError::UnknownUnit(_)) => INVALID_UNITS.to_string(),
            }
        };
    }

    fn reset_units(&mut self) {
        let (from, to) = self.catalog.family(self.kind).default_pair().unwrap_or_default();
        self.from = from.to_string();
        self.to = to.to_string();
    }

    /// First selection once rates arrive: base to USD when both are listed.
    fn select_initial_currency(&mut self) {
        let family = self.catalog.family(FamilyKind::Currency);
        if family.unit(BASE_CURRENCY).is_some() && family.unit(DEFAULT_QUOTE_CURRENCY).is_some() {
            self.from = BASE_CURRENCY.to_string();
            self.to = DEFAULT_QUOTE_CURRENCY.to_string();
        } else {
            self.reset_units();
        }
    }

    fn selection_valid(&self) -> bool {
        let family = self.catalog.family(self.kind);
        family.unit(&self.from).is_some() && family.unit(&self.to).is_some()
    }

    fn view(&self) -> ConverterView {
        let family = self.catalog.family(self.kind);
        ConverterView {
            family: self.kind,
            families: FamilyKind::ALL
                .iter()
                .map(|&kind| FamilyOption {
                    kind,
                    label: self.catalog.family(kind).label().to_string(),
                })
                .collect(),
            units: family
                .unit_names()
                .map(|name| UnitOption {
                    name: name.to_string(),
                    label: display_name(name),
                })
                .collect(),
            input: self.input.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            result: self.result.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ConverterController {
    rates: Arc<dyn RateSource>,
    state: RwLock<ConverterState>,
    guard: RequestGuard,
}

impl ConverterController {
    /// Starts on the Currency family with no rates loaded.
    #[must_use]
    pub fn new(rates: Arc<dyn RateSource>) -> Self {
        let mut state = ConverterState {
            catalog: Catalog::standard(),
            kind: FamilyKind::Currency,
            input: String::new(),
            from: String::new(),
            to: String::new(),
            result: String::new(),
            loading: false,
            error: None,
        };
        state.reset_units();
        Self {
            rates,
            state: RwLock::new(state),
            guard: RequestGuard::new(),
        }
    }

    /// Load currency rates for the first time.
    pub async fn start(&self) -> Outcome {
        self.refresh().await
    }

    /// Fetch fresh currency rates into the Currency family.
    pub async fn refresh(&self) -> Outcome {
        self.guard.resume();
        let ticket = self.guard.begin();
        {
            let mut state = self.write();
            state.loading = true;
            state.error = None;
        }

        let result = self.rates.latest_rates().await;

        if !self.guard.is_current(ticket) {
            tracing::debug!(name: "converter.rates.superseded", ticket, "Dropped stale currency rates");
            return Outcome::Superseded;
        }

        let mut state = self.write();
        state.loading = false;
        match result {
            Ok(table) => {
                tracing::info!(
                    name: "converter.rates.loaded",
                    base = %table.base,
                    count = table.rates.len(),
                    "Currency rates loaded"
                );
                state.catalog.set_rates(&table);
                if state.kind == FamilyKind::Currency && !state.selection_valid() {
                    state.select_initial_currency();
                }
                state.recompute();
                Outcome::Applied
            }
            Err(e) => {
                tracing::warn!(name: "converter.rates.failed", error = %e, "Error fetching currency rates");
                state.error = Some(e.user_message());
                Outcome::Failed
            }
        }
    }

    pub fn set_input(&self, input: impl Into<String>) {
        let mut state = self.write();
        state.input = input.into();
        state.recompute();
    }

    pub fn set_from(&self, unit: impl Into<String>) {
        let mut state = self.write();
        state.from = unit.into();
        state.recompute();
    }

    pub fn set_to(&self, unit: impl Into<String>) {
        let mut state = self.write();
        state.to = unit.into();
        state.recompute();
    }

    /// Switch family; resets unit selection and clears input and result.
    pub fn select_family(&self, kind: FamilyKind) {
        let mut state = self.write();
        state.kind = kind;
        state.reset_units();
        state.input.clear();
        state.result.clear();
    }

    /// Drop any in-flight rate fetch.
    pub fn stop(&self) {
        self.guard.stop();
        self.write().loading = false;
    }

    #[must_use]
    pub fn view(&self) -> ConverterView {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .view()
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConverterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
