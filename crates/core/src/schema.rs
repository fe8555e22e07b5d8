//! Request and response shapes. These carry no behaviour beyond validation;
//! storage never checks them.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const INSTRUCTOR_COLLECTION: &str = "instructor";
pub const COURSE_COLLECTION: &str = "course";
pub const BOOKING_COLLECTION: &str = "booking";

/// Confirmation shown to the customer after a booking is stored.
pub const BOOKING_CONFIRMATION: &str = "Tack! Vi kontaktar dig inom kort.";
/// Message returned when a booking could not be stored.
pub const BOOKING_FAILED: &str = "Kunde inte skapa bokning";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Instructor {
    pub name: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Course {
    pub title: String,
    /// Display string, e.g. "4 dagar".
    pub duration: String,
    /// Display string, e.g. "11 500 kr".
    pub price: String,
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A course booking request. `course` refers to a course by title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Booking {
    /// Contact person.
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: String,
    pub course: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingResponse {
    pub success: bool,
    pub message: String,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn course_active_defaults_to_true() {
        let course: Course = serde_json::from_value(json!({
            "title": "Asbest Grundkurs",
            "duration": "4 dagar",
            "price": "11 500 kr",
            "description": "d",
        }))
        .unwrap();
        assert!(course.active);
    }

    #[test]
    fn instructor_email_is_optional_but_validated() {
        let without = Instructor {
            name: "A".into(),
            email: None,
            bio: None,
        };
        assert!(without.validate().is_ok());

        let bad = Instructor {
            email: Some("not-an-email".into()),
            ..without.clone()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn booking_requires_name_email_and_course() {
        let missing_course = serde_json::from_value::<Booking>(json!({
            "name": "A",
            "email": "a@x.com",
        }));
        assert!(missing_course.is_err());

        let minimal: Booking = serde_json::from_value(json!({
            "name": "A",
            "email": "a@x.com",
            "course": "Lift / Mobila arbetsplattformar",
        }))
        .unwrap();
        assert!(minimal.validate().is_ok());
        assert_eq!(minimal.company, None);
    }

    #[test]
    fn booking_rejects_malformed_email() {
        let booking: Booking = serde_json::from_value(json!({
            "name": "A",
            "email": "a-at-x.com",
            "course": "Lift",
        }))
        .unwrap();
        let errors = booking.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn instructor_serializes_missing_email_as_null() {
        let value = serde_json::to_value(Instructor {
            name: "Marko Bogdanski".into(),
            email: None,
            bio: None,
        })
        .unwrap();
        assert_eq!(value, json!({"name": "Marko Bogdanski", "email": null, "bio": null}));
    }
}
