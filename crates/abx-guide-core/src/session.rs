//! Per-client display and patient context.
//!
//! One writer, many readers: every update replaces the whole context, so a
//! reader always sees a consistent snapshot.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{AgeGroup, UnitPreferences, UnitSystem};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("session lock poisoned")]
    LockPoisoned,

    #[error("weight must be a positive number of kg, got {0}")]
    InvalidWeight(f64),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Unit preferences, pediatric mode and the current patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub units: UnitPreferences,
    pub pediatric_mode: bool,
    /// Patient weight in kg
    pub weight_kg: Option<f64>,
    pub age_group: Option<AgeGroup>,
}

impl SessionContext {
    pub fn with_units(system: UnitSystem) -> Self {
        Self {
            units: UnitPreferences::for_system(system),
            ..Self::default()
        }
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.units.system
    }

    /// Weight to dose against, only while pediatric mode is on.
    pub fn pediatric_weight(&self) -> Option<f64> {
        self.weight_kg.filter(|_| self.pediatric_mode)
    }
}

/// Shared holder for a [`SessionContext`].
#[derive(Debug, Default)]
pub struct Session {
    context: RwLock<SessionContext>,
}

impl Session {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context: RwLock::new(context),
        }
    }

    /// Copy of the current context.
    pub fn snapshot(&self) -> SessionResult<SessionContext> {
        self.context
            .read()
            .map(|guard| *guard)
            .map_err(|_| SessionError::LockPoisoned)
    }

    /// Replace the whole context.
    pub fn replace(&self, context: SessionContext) -> SessionResult<()> {
        let mut guard = self.context.write().map_err(|_| SessionError::LockPoisoned)?;
        *guard = context;
        Ok(())
    }

    /// Derive a new context from the current one and store it.
    pub fn update<F>(&self, f: F) -> SessionResult<SessionContext>
    where
        F: FnOnce(SessionContext) -> SessionContext,
    {
        let mut guard = self.context.write().map_err(|_| SessionError::LockPoisoned)?;
        let next = f(*guard);
        *guard = next;
        debug!(?next, "Session updated");
        Ok(next)
    }

    pub fn toggle_units(&self) -> SessionResult<UnitSystem> {
        self.update(|mut ctx| {
            ctx.units.toggle();
            ctx
        })
        .map(|ctx| ctx.units.system)
    }

    pub fn toggle_pediatric(&self) -> SessionResult<bool> {
        self.update(|ctx| SessionContext {
            pediatric_mode: !ctx.pediatric_mode,
            ..ctx
        })
        .map(|ctx| ctx.pediatric_mode)
    }

    /// Set or clear the patient weight in kg.
    pub fn set_weight(&self, weight_kg: Option<f64>) -> SessionResult<()> {
        check_weight(weight_kg)?;
        self.update(|ctx| SessionContext { weight_kg, ..ctx })?;
        Ok(())
    }

    pub fn set_age_group(&self, age_group: Option<AgeGroup>) -> SessionResult<()> {
        self.update(|ctx| SessionContext { age_group, ..ctx })?;
        Ok(())
    }

    /// Set weight and age group in one replacement. An invalid weight leaves
    /// the context untouched.
    pub fn set_patient(
        &self,
        weight_kg: Option<f64>,
        age_group: Option<AgeGroup>,
    ) -> SessionResult<SessionContext> {
        check_weight(weight_kg)?;
        self.update(|ctx| SessionContext {
            weight_kg,
            age_group,
            ..ctx
        })
    }
}

fn check_weight(weight_kg: Option<f64>) -> SessionResult<()> {
    match weight_kg {
        Some(weight) if !weight.is_finite() || weight <= 0.0 => {
            Err(SessionError::InvalidWeight(weight))
        }
        _ => Ok(()),
    }
}
