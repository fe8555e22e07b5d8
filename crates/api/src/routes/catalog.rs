use axum::{extract::State, routing::get, Json, Router};
use booking_core::schema::{Course, Instructor, COURSE_COLLECTION, INSTRUCTOR_COLLECTION};
use booking_core::store::records::list_records;
use booking_core::ListQuery;

use crate::error::ApiResult;
use crate::state::AppState;

/// Read-only catalogue: instructors and courses in store order.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/instructors", get(list_instructors))
        .route("/courses", get(list_courses))
}

async fn list_instructors(State(state): State<AppState>) -> ApiResult<Json<Vec<Instructor>>> {
    let instructors = list_records(state.store(), INSTRUCTOR_COLLECTION, ListQuery::new()).await?;
    Ok(Json(instructors))
}

async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<Course>>> {
    let courses = list_records(state.store(), COURSE_COLLECTION, ListQuery::new()).await?;
    Ok(Json(courses))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::routes::test_support::{get, post_json, test_app};

    #[tokio::test]
    async fn empty_catalogue_lists_nothing() {
        let (app, _) = test_app();
        let (status, body) = get(app.clone(), "/courses").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (_, body) = get(app, "/instructors").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn seeded_catalogue_omits_ids_and_timestamps() {
        let (app, _) = test_app();
        post_json(app.clone(), "/seed", Value::Null).await;

        let (status, body) = get(app.clone(), "/instructors").await;
        assert_eq!(status, StatusCode::OK);
        let instructors = body.as_array().unwrap();
        assert_eq!(instructors.len(), 3);
        assert_eq!(
            instructors[2],
            json!({
                "name": "Marko Bogdanski",
                "email": null,
                "bio": "Expert på asbest, sanering och praktiska utbildningar i fält.",
            })
        );

        let (_, body) = get(app, "/courses").await;
        let courses = body.as_array().unwrap();
        assert_eq!(courses.len(), 5);
        assert_eq!(courses[0]["title"], "Asbest Grundkurs");
        assert_eq!(courses[0]["active"], true);
        assert!(courses.iter().all(|c| c.get("_id").is_none() && c.get("created_at").is_none()));
    }
}
