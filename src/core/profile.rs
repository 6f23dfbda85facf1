//! The profile screen: four static characteristics, read once per activation.

use crate::display::{Color, DisplaySink, PLACEHOLDER};
use crate::health::types::age_on;
use crate::health::{HealthError, HealthStore, ProfileCharacteristics};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// The four labels on the profile screen.
pub struct ProfileSinks {
    pub date_of_birth: Box<dyn DisplaySink>,
    pub age: Box<dyn DisplaySink>,
    pub sex: Box<dyn DisplaySink>,
    pub blood_type: Box<dyn DisplaySink>,
}

pub struct ProfileController {
    store: Arc<dyn HealthStore>,
    sinks: ProfileSinks,
    timezone: Tz,
    placeholder: String,
}

impl ProfileController {
    pub fn new(store: Arc<dyn HealthStore>, sinks: ProfileSinks, timezone: Tz) -> Self {
        Self {
            store,
            sinks,
            timezone,
            placeholder: PLACEHOLDER.to_string(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Read and render every characteristic, computing age as of today in
    /// the configured timezone.
    pub fn activate(&self) -> ProfileCharacteristics {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        self.activate_on(today)
    }

    /// Read and render every characteristic, computing age as of `today`.
    ///
    /// Fields that cannot be read show the placeholder. Nothing is retried
    /// or cached.
    pub fn activate_on(&self, today: NaiveDate) -> ProfileCharacteristics {
        let date_of_birth = ok_or_log(self.store.date_of_birth());
        let sex = ok_or_log(self.store.biological_sex());
        let blood_type = ok_or_log(self.store.blood_type());
        let age = date_of_birth.and_then(|dob| age_on(dob, today));

        let profile = ProfileCharacteristics {
            date_of_birth,
            age,
            sex,
            blood_type,
        };

        self.show(
            &*self.sinks.date_of_birth,
            profile.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
        );
        self.show(&*self.sinks.age, profile.age.map(|a| a.to_string()));
        self.show(&*self.sinks.sex, profile.sex.map(|s| s.to_string()));
        self.show(&*self.sinks.blood_type, profile.blood_type.map(|b| b.to_string()));

        profile
    }

    fn show(&self, sink: &dyn DisplaySink, text: Option<String>) {
        match text {
            Some(text) => sink.render(&text, Color::Neutral),
            None => sink.render(&self.placeholder, Color::Neutral),
        }
    }
}

fn ok_or_log<T>(result: Result<T, HealthError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("profile read failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Label;
    use crate::health::{BiologicalSex, BloodType, MemoryHealthStore, NoopHealthStore};

    struct Screen {
        date_of_birth: Label,
        age: Label,
        sex: Label,
        blood_type: Label,
    }

    fn profile_controller(store: Arc<dyn HealthStore>) -> (ProfileController, Screen) {
        let screen = Screen {
            date_of_birth: Label::new(),
            age: Label::new(),
            sex: Label::new(),
            blood_type: Label::new(),
        };
        let sinks = ProfileSinks {
            date_of_birth: Box::new(screen.date_of_birth.clone()),
            age: Box::new(screen.age.clone()),
            sex: Box::new(screen.sex.clone()),
            blood_type: Box::new(screen.blood_type.clone()),
        };
        (ProfileController::new(store, sinks, chrono_tz::UTC), screen)
    }

    #[test]
    fn test_profile_renders_all_fields() {
        let dob = NaiveDate::from_ymd_opt(1985, 3, 2).unwrap();
        let store = MemoryHealthStore::new().with_profile(
            Some(dob),
            Some(BiologicalSex::Male),
            Some(BloodType::OPositive),
        );
        let (controller, screen) = profile_controller(Arc::new(store));

        let profile = controller.activate_on(NaiveDate::from_ymd_opt(2016, 7, 18).unwrap());

        assert_eq!(profile.age, Some(31));
        assert_eq!(screen.date_of_birth.text(), "1985-03-02");
        assert_eq!(screen.age.text(), "31");
        assert_eq!(screen.sex.text(), "Male");
        assert_eq!(screen.blood_type.text(), "O+");
    }

    #[test]
    fn test_missing_fields_show_placeholder() {
        let store = MemoryHealthStore::new().with_profile(None, None, Some(BloodType::ANegative));
        let (controller, screen) = profile_controller(Arc::new(store));

        let profile = controller.activate();

        assert_eq!(profile.date_of_birth, None);
        assert_eq!(profile.age, None);
        assert_eq!(screen.date_of_birth.text(), "---");
        assert_eq!(screen.age.text(), "---");
        assert_eq!(screen.sex.text(), "---");
        assert_eq!(screen.blood_type.text(), "A-");
    }

    #[test]
    fn test_unavailable_store_shows_placeholders() {
        let (controller, screen) = profile_controller(Arc::new(NoopHealthStore::new()));
        controller.with_placeholder("n/a").activate();
        assert_eq!(screen.blood_type.text(), "n/a");
        assert_eq!(screen.sex.color(), Color::Neutral);
    }

    #[test]
    fn test_each_activation_reads_again() {
        let store = Arc::new(MemoryHealthStore::new().with_profile(
            None,
            Some(BiologicalSex::Female),
            None,
        ));
        let (controller, screen) = profile_controller(store);

        controller.activate();
        controller.activate();
        assert_eq!(screen.sex.render_count(), 2);
    }
}
