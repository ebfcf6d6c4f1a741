//! Storage port for entities and their waste logs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;
use waste_forecast::Observation;

/// Cities with site data available
pub const SUPPORTED_CITIES: [&str; 8] = [
    "Ahmedabad",
    "Gandhinagar",
    "Indore",
    "Delhi",
    "Mumbai",
    "Pune",
    "Bengaluru",
    "Chennai",
];

/// Largest single daily log accepted, in tons
pub const MAX_DAILY_TONS: f64 = 1000.0;

/// Errors raised by a [`LogStore`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Entity already exists: {0}")]
    DuplicateEntity(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Kind of waste an entity produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    Organic,
    Industrial,
    Agricultural,
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WasteType::Organic => write!(f, "organic"),
            WasteType::Industrial => write!(f, "industrial"),
            WasteType::Agricultural => write!(f, "agricultural"),
        }
    }
}

impl FromStr for WasteType {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "organic" => Ok(WasteType::Organic),
            "industrial" => Ok(WasteType::Industrial),
            "agricultural" => Ok(WasteType::Agricultural),
            other => Err(StoreError::InvalidRecord(format!(
                "Waste type must be one of organic, industrial, agricultural; got {}",
                other
            ))),
        }
    }
}

/// A registered waste producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    /// Unique login-style identifier
    pub name: String,
    /// Display name of the organisation
    pub entity_name: String,
    pub city: String,
    pub waste_type: WasteType,
}

impl EntityProfile {
    /// Create a profile, checking name lengths and the city
    pub fn new(
        name: &str,
        entity_name: &str,
        city: &str,
        waste_type: WasteType,
    ) -> StoreResult<Self> {
        let name_len = name.chars().count();
        if !(3..=50).contains(&name_len) {
            return Err(StoreError::InvalidRecord(format!(
                "Name must be 3 to 50 characters, got {}",
                name_len
            )));
        }
        let entity_len = entity_name.chars().count();
        if !(2..=100).contains(&entity_len) {
            return Err(StoreError::InvalidRecord(format!(
                "Entity name must be 2 to 100 characters, got {}",
                entity_len
            )));
        }
        if !SUPPORTED_CITIES.contains(&city) {
            return Err(StoreError::InvalidRecord(format!(
                "City must be one of: {}",
                SUPPORTED_CITIES.join(", ")
            )));
        }

        Ok(Self {
            name: name.to_string(),
            entity_name: entity_name.to_string(),
            city: city.to_string(),
            waste_type,
        })
    }
}

/// One day's waste for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteLog {
    pub entity: String,
    pub date: NaiveDate,
    pub waste_tons: f64,
}

impl WasteLog {
    /// Create a log; the amount must lie in (0, 1000] tons
    pub fn new(entity: &str, date: NaiveDate, waste_tons: f64) -> StoreResult<Self> {
        if !(waste_tons > 0.0 && waste_tons <= MAX_DAILY_TONS) {
            return Err(StoreError::InvalidRecord(format!(
                "Waste amount must be in (0, {}] tons, got {}",
                MAX_DAILY_TONS, waste_tons
            )));
        }

        Ok(Self {
            entity: entity.to_string(),
            date,
            waste_tons,
        })
    }
}

impl From<&WasteLog> for Observation {
    fn from(log: &WasteLog) -> Self {
        Observation::new(log.date, log.waste_tons)
    }
}

/// Persistence boundary for entities and logs
pub trait LogStore: Send + Sync {
    /// Register an entity; names are unique
    fn add_entity(&self, profile: EntityProfile) -> StoreResult<()>;

    /// Look up an entity by name
    fn find_entity(&self, name: &str) -> StoreResult<Option<EntityProfile>>;

    /// Append a log for a registered entity
    fn add_log(&self, log: WasteLog) -> StoreResult<()>;

    /// All logs of one entity, in insertion order
    fn logs_for(&self, name: &str) -> StoreResult<Vec<WasteLog>>;

    /// Logs of one entity as forecasting observations
    fn observations_for(&self, name: &str) -> StoreResult<Vec<Observation>> {
        Ok(self.logs_for(name)?.iter().map(Observation::from).collect())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    entities: HashMap<String, EntityProfile>,
    logs: Vec<WasteLog>,
}

/// Process-local [`LogStore`]; contents are lost on drop
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    state: RwLock<StoreState>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for InMemoryLogStore {
    fn add_entity(&self, profile: EntityProfile) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        if state.entities.contains_key(&profile.name) {
            return Err(StoreError::DuplicateEntity(profile.name));
        }

        debug!(entity = %profile.name, city = %profile.city, "registered entity");
        state.entities.insert(profile.name.clone(), profile);
        Ok(())
    }

    fn find_entity(&self, name: &str) -> StoreResult<Option<EntityProfile>> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.entities.get(name).cloned())
    }

    fn add_log(&self, log: WasteLog) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        if !state.entities.contains_key(&log.entity) {
            return Err(StoreError::UnknownEntity(log.entity));
        }

        state.logs.push(log);
        Ok(())
    }

    fn logs_for(&self, name: &str) -> StoreResult<Vec<WasteLog>> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        if !state.entities.contains_key(name) {
            return Err(StoreError::UnknownEntity(name.to_string()));
        }

        Ok(state
            .logs
            .iter()
            .filter(|log| log.entity == name)
            .cloned()
            .collect())
    }
}
