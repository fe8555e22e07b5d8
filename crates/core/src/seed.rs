//! Demo catalogue used to populate an empty installation.

use serde::Serialize;

use crate::document::ListQuery;
use crate::schema::{Course, Instructor, COURSE_COLLECTION, INSTRUCTOR_COLLECTION};
use crate::store::records::create_record;
use crate::store::{DocumentStore, StoreResult};

/// How many documents a seed run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub instructors: usize,
    pub courses: usize,
}

pub fn demo_instructors() -> Vec<Instructor> {
    vec![
        Instructor {
            name: "Therese Janerup Kolstad".into(),
            email: Some("therese@jk-utbildning.se".into()),
            bio: Some("Erfaren utbildare med fokus på säkerhetskultur och arbetsmiljö.".into()),
        },
        Instructor {
            name: "Martin Wistarnd".into(),
            email: Some("martin@jk-utbildning.se".into()),
            bio: Some("Specialist på byggsäkerhet, fallskydd och lyftutbildningar.".into()),
        },
        Instructor {
            name: "Marko Bogdanski".into(),
            email: None,
            bio: Some("Expert på asbest, sanering och praktiska utbildningar i fält.".into()),
        },
    ]
}

pub fn demo_courses() -> Vec<Course> {
    let course = |title: &str, duration: &str, price: &str, description: &str| Course {
        title: title.into(),
        duration: duration.into(),
        price: price.into(),
        description: description.into(),
        active: true,
    };

    vec![
        course(
            "Asbest Grundkurs",
            "4 dagar",
            "11 500 kr",
            "Hantera asbest enligt AFS 2006:1 §36. Ger full behörighet för rivning och sanering.",
        ),
        course(
            "Fallskydd – användare",
            "4 timmar",
            "2 300 kr",
            "Förstå riskerna vid arbete över 2 meter och använd personlig skyddsutrustning rätt.",
        ),
        course(
            "Säkra lyft och signalman",
            "4 timmar",
            "2 100 kr",
            "Säker användning av lyftanordningar och minska risken för olyckor.",
        ),
        course(
            "Brandfarliga heta arbeten",
            "1 dag",
            "2 600 kr",
            "Obligatorisk kurs för alla som arbetar med värme och gnistor.",
        ),
        course(
            "Lift / Mobila arbetsplattformar",
            "1 dag",
            "2 600 kr",
            "Arbeta effektivt och säkert med mobila plattformar.",
        ),
    ]
}

/// Insert the demo instructors and courses, each set only if its collection
/// is empty. A partially populated collection is left untouched.
pub async fn seed_demo_data(store: &dyn DocumentStore) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    if is_empty(store, INSTRUCTOR_COLLECTION).await? {
        for instructor in demo_instructors() {
            create_record(store, INSTRUCTOR_COLLECTION, &instructor).await?;
            report.instructors += 1;
        }
    }

    if is_empty(store, COURSE_COLLECTION).await? {
        for course in demo_courses() {
            create_record(store, COURSE_COLLECTION, &course).await?;
            report.courses += 1;
        }
    }

    tracing::info!(
        instructors = report.instructors,
        courses = report.courses,
        "Seed finished"
    );
    Ok(report)
}

async fn is_empty(store: &dyn DocumentStore, collection: &str) -> StoreResult<bool> {
    Ok(store
        .list(collection, ListQuery::new().limit(1))
        .await?
        .is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use validator::Validate;

    #[test]
    fn fixtures_pass_validation() {
        assert!(demo_instructors().iter().all(|i| i.validate().is_ok()));
        assert!(demo_courses().iter().all(|c| c.validate().is_ok() && c.active));
    }

    #[tokio::test]
    async fn seeding_twice_inserts_once() {
        let store = MemoryStore::new();

        let first = seed_demo_data(&store).await.unwrap();
        assert_eq!(first, SeedReport { instructors: 3, courses: 5 });

        let second = seed_demo_data(&store).await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.count(INSTRUCTOR_COLLECTION).await, 3);
        assert_eq!(store.count(COURSE_COLLECTION).await, 5);
    }

    #[tokio::test]
    async fn populated_collection_is_not_topped_up() {
        let store = MemoryStore::new();
        create_record(&store, COURSE_COLLECTION, &demo_courses()[0])
            .await
            .unwrap();

        let report = seed_demo_data(&store).await.unwrap();
        assert_eq!(report, SeedReport { instructors: 3, courses: 0 });
        assert_eq!(store.count(COURSE_COLLECTION).await, 1);
    }
}
