//! Example `User` aggregate whose personal data is crypto-shredded.
//!
//! Names and the day and month of birth are encrypted with a key owned by the
//! user id. The year of birth stays in plaintext. Deleting that key leaves the
//! events readable, with the personal fields reduced to opaque ciphertext and
//! the birth date to the first of January of the birth year.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use strata::{
    Aggregate, Apply, Codec, ConfigError, Event, EventRegistry, Handlers, KeyRepository, Protected,
    Record,
};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Record, Event)]
pub struct UserCreated {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub year_of_birth: u32,
    pub month_of_birth: Protected<u32>,
    pub day_of_birth: Protected<u32>,
}

#[derive(Clone, Debug, PartialEq, Record, Event)]
pub struct UserRenamed {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

impl Aggregate for User {
    fn aggregate_type() -> &'static str {
        "user"
    }

    fn handlers() -> &'static Handlers<Self> {
        static HANDLERS: OnceLock<Handlers<User>> = OnceLock::new();
        HANDLERS.get_or_init(|| Handlers::new().on::<UserCreated>().on::<UserRenamed>())
    }
}

impl Apply<UserCreated> for User {
    fn apply(&mut self, event: &UserCreated) {
        self.id = event.id.clone();
        self.first_name = event.first_name.clone();
        self.last_name = event.last_name.clone();
        // Shredded dates fall back to the first of January.
        let month = event.month_of_birth.as_plain().copied().unwrap_or(1);
        let day = event.day_of_birth.as_plain().copied().unwrap_or(1);
        self.birth_date = i32::try_from(event.year_of_birth)
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, month, day))
            .unwrap_or_default();
    }
}

impl Apply<UserRenamed> for User {
    fn apply(&mut self, event: &UserRenamed) {
        self.first_name = event.first_name.clone();
        self.last_name = event.last_name.clone();
    }
}

impl User {
    pub fn register(
        id: String,
        first_name: String,
        last_name: String,
        birth_date: NaiveDate,
    ) -> Result<UserCreated, UserError> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(UserError::EmptyName);
        }
        let year_of_birth = u32::try_from(birth_date.year())
            .map_err(|_| UserError::InvalidBirthDate(birth_date))?;

        Ok(UserCreated {
            id,
            first_name,
            last_name,
            year_of_birth,
            month_of_birth: Protected::Plain(birth_date.month()),
            day_of_birth: Protected::Plain(birth_date.day()),
        })
    }

    pub fn rename(&self, first_name: String, last_name: String) -> Result<UserRenamed, UserError> {
        if self.id.is_empty() {
            return Err(UserError::NotRegistered);
        }
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(UserError::EmptyName);
        }
        if first_name == self.first_name && last_name == self.last_name {
            return Err(UserError::Unchanged);
        }

        Ok(UserRenamed {
            id: self.id.clone(),
            first_name,
            last_name,
        })
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("first and last name must not be empty")]
    EmptyName,
    #[error("invalid birth date {0}")]
    InvalidBirthDate(NaiveDate),
    #[error("user is not registered")]
    NotRegistered,
    #[error("user already has this name")]
    Unchanged,
}

/// Registry of every user event.
pub fn registry() -> Result<EventRegistry, ConfigError> {
    let mut registry = EventRegistry::new();
    registry
        .register_event::<UserCreated>()?
        .register_event::<UserRenamed>()?;
    Ok(registry)
}

/// Codec encrypting personal data with the key of the user id.
pub fn codec(keys: KeyRepository) -> Result<Codec, ConfigError> {
    Ok(Codec::builder(keys)
        .encrypt::<UserCreated>(
            "id",
            &["first_name", "last_name", "month_of_birth", "day_of_birth"],
        )?
        .encrypt::<UserRenamed>("id", &["first_name", "last_name"])?
        .build())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use strata::{EventStore, KeyRepository, Root};
    use strata_inmemory::{InMemoryEventStore, InMemoryKeyStore};

    use super::{codec, registry, User, UserError};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn store(keys: KeyRepository) -> InMemoryEventStore {
        InMemoryEventStore::new(codec(keys).unwrap(), registry().unwrap())
    }

    fn register() -> Root<User> {
        Root::create(
            User::register(
                "u-1".to_string(),
                "Ada".to_string(),
                "Lovelace".to_string(),
                date(1815, 12, 10),
            )
            .unwrap(),
        )
    }

    #[test]
    fn registration_is_validated() {
        assert!(matches!(
            User::register("u-1".to_string(), " ".to_string(), "L".to_string(), date(1990, 1, 1)),
            Err(UserError::EmptyName)
        ));
        assert!(matches!(
            User::register("u-1".to_string(), "A".to_string(), "L".to_string(), date(-44, 3, 15)),
            Err(UserError::InvalidBirthDate(_))
        ));
    }

    #[test]
    fn rename_requires_a_change() {
        let user = register();

        assert!(matches!(
            user.rename("Ada".to_string(), "Lovelace".to_string()),
            Err(UserError::Unchanged)
        ));
        assert!(matches!(
            User::default().rename("Ada".to_string(), "King".to_string()),
            Err(UserError::NotRegistered)
        ));
    }

    #[tokio::test]
    async fn user_survives_reload() -> anyhow::Result<()> {
        let store = store(KeyRepository::new(InMemoryKeyStore::new()));

        let mut user = register();
        user.handle(|user| user.rename("Ada".to_string(), "King".to_string()))?;
        store.save("u-1", &mut user).await?;

        let loaded = store.load::<User>("u-1").await?;
        assert_eq!(loaded.version(), 1);
        assert_eq!(*loaded, *user);
        assert_eq!(loaded.birth_date, date(1815, 12, 10));

        let descriptors = store.descriptors("user-u-1")?;
        assert!(!descriptors[0].data.contains("Ada"));
        let data: serde_json::Value = serde_json::from_str(&descriptors[0].data)?;
        assert_eq!(data["year_of_birth"], 1815);
        assert_ne!(data["month_of_birth"], 12);

        Ok(())
    }

    #[tokio::test]
    async fn shredded_user_loses_personal_data() -> anyhow::Result<()> {
        let keys = KeyRepository::new(InMemoryKeyStore::new());
        let store = store(keys.clone());

        let mut user = register();
        store.save("u-1", &mut user).await?;
        keys.delete("u-1")?;

        let loaded = store.load::<User>("u-1").await?;
        assert_eq!(loaded.id, "u-1");
        assert_ne!(loaded.first_name, "Ada");
        assert_ne!(loaded.last_name, "Lovelace");
        assert_eq!(loaded.birth_date, date(1815, 1, 1));

        Ok(())
    }
}
