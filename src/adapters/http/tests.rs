use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

use super::session::SESSION_COOKIE;
use super::{AppState, router};
use crate::usecases::account_service::INVALID_CREDENTIALS;
use crate::usecases::invoice_service::NOT_A_STUDENT;
use crate::usecases::lesson_service::{PAIRED, STUDENT_NOT_PENDING};
use crate::usecases::request_service::STUDENT_REQUEST_SUBMITTED;
use crate::usecases::testing::{Fixture, student_request_form, tutor_request_form};

const STUDENT_REQUEST_BODY: &str =
    "language=Python&frequency=weekly&day_of_week=monday&preferred_time=10%3A00&difficulty=beginner";

/// A browser stand-in: one router, one cookie jar slot.
struct Client {
    fx: Fixture,
    app: Router,
    cookie: Option<String>,
}

impl Client {
    async fn new() -> Self {
        let fx = Fixture::new().await;
        let state = AppState::new(
            fx.services.clone(),
            fx.repo.clone(),
            chrono::Duration::hours(1),
            false,
        );
        Self {
            app: router(state),
            fx,
            cookie: None,
        }
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.cookie {
            builder = builder.header(COOKIE, format!("{SESSION_COOKIE}={token}"));
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        if let Some(set) = response.headers().get(SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap();
            let (_, token) = pair.split_once('=').unwrap();
            self.cookie = (!token.is_empty()).then(|| token.to_string());
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response {
        self.send(Method::POST, uri, Some(form)).await
    }

    /// Logs out whoever is logged in, then logs in as `username`.
    async fn log_in(&mut self, username: &str) {
        self.get("/log_out/").await;
        let body = format!(
            "username={}&password=Password123",
            urlencoding::encode(username)
        );
        let response = self.post("/log_in/", &body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}

fn location(response: &Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn anonymous_users_are_sent_to_log_in_with_next() {
    let mut client = Client::new().await;
    let response = client.get("/student/dashboard/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/log_in/?next=%2Fstudent%2Fdashboard%2F");

    let page = json(client.get("/").await).await;
    assert_eq!(page["page"], "home");
    assert!(page["user"].is_null());
}

#[tokio::test]
async fn sign_up_logs_in_and_lands_on_dashboard() {
    let mut client = Client::new().await;
    let response = client
        .post(
            "/sign_up/",
            "first_name=Charlie&last_name=Johnson&username=%40charlie&email=charlie%40example.org\
             &new_password=Password123&password_confirmation=Password123",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/student/dashboard/");
    assert!(client.cookie.is_some());

    let response = client.get("/student/dashboard/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json(response).await;
    assert_eq!(page["page"], "student_dashboard");
    assert_eq!(page["user"]["username"], "@charlie");
    assert_eq!(page["user"]["full_name"], "Charlie Johnson");
    assert!(page["data"]["lessons"].as_array().unwrap().is_empty());

    let again = client.get("/sign_up/").await;
    assert_eq!(location(&again), "/student/dashboard/");
}

#[tokio::test]
async fn sign_up_errors_are_unprocessable() {
    let mut client = Client::new().await;
    let response = client
        .post("/tutor_sign_up/", "first_name=Jane&username=jane")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(response).await;
    assert_eq!(body["errors"]["last_name"][0], "This field is required.");
    assert!(body["errors"]["username"].is_array());
}

#[tokio::test]
async fn failed_log_in_shows_message_and_next_is_honoured() {
    let mut client = Client::new().await;
    client.fx.student("@charlie").await;

    let response = client
        .post("/log_in/", "username=%40charlie&password=wrong")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json(response).await;
    assert_eq!(page["page"], "log_in");
    assert_eq!(page["messages"][0]["level"], "error");
    assert_eq!(page["messages"][0]["text"], INVALID_CREDENTIALS);

    let response = client
        .post(
            "/log_in/",
            "username=%40charlie&password=Password123&next=%2Fstudent%2Frequests%2F",
        )
        .await;
    assert_eq!(location(&response), "/student/requests/");
}

#[tokio::test]
async fn off_site_next_falls_back_to_dashboard() {
    let mut client = Client::new().await;
    client.fx.tutor("@janedoe").await;
    let response = client
        .post(
            "/log_in/",
            "username=%40janedoe&password=Password123&next=https%3A%2F%2Fevil.example%2F",
        )
        .await;
    assert_eq!(location(&response), "/tutor/dashboard/");
}

#[tokio::test]
async fn next_with_whitespace_or_control_bytes_falls_back_to_dashboard() {
    for next in ["%2Fa%0Ab", "%2F%09%2Fevil.example%2F", "%2Fa%20b"] {
        let mut client = Client::new().await;
        client.fx.tutor("@janedoe").await;
        let response = client
            .post(
                "/log_in/",
                &format!("username=%40janedoe&password=Password123&next={next}"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "next={next}");
        assert_eq!(location(&response), "/tutor/dashboard/", "next={next}");
    }
}

#[tokio::test]
async fn feedback_redirects_by_login_state() {
    const BODY: &str = "name=Jane&email=jane%40example.org&message=Great+tutors";
    let mut client = Client::new().await;
    let response = client.post("/submit-feedback/", BODY).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    client.fx.student("@charlie").await;
    client.log_in("@charlie").await;
    let response = client.post("/submit-feedback/", BODY).await;
    assert_eq!(location(&response), "/dashboard/");
}

#[tokio::test]
async fn flash_is_shown_once() {
    let mut client = Client::new().await;
    client.fx.student("@charlie").await;
    client.log_in("@charlie").await;

    let response = client.post("/student/request/", STUDENT_REQUEST_BODY).await;
    assert_eq!(location(&response), "/student/dashboard/");

    let page = json(client.get("/student/dashboard/").await).await;
    assert_eq!(page["messages"][0]["text"], STUDENT_REQUEST_SUBMITTED);
    assert_eq!(page["data"]["requests"].as_array().unwrap().len(), 1);

    let page = json(client.get("/student/dashboard/").await).await;
    assert!(page["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_request_form_lists_field_errors() {
    let mut client = Client::new().await;
    client.fx.student("@charlie").await;
    client.log_in("@charlie").await;

    let response = client
        .post(
            "/student/request/",
            "language=&frequency=weekly&day_of_week=funday&preferred_time=10%3A00&difficulty=beginner",
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(response).await;
    assert_eq!(body["errors"]["language"][0], "This field is required.");
    assert_eq!(
        body["errors"]["day_of_week"][0],
        "Select a valid choice. funday is not one of the available choices."
    );
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let mut client = Client::new().await;
    client.fx.student("@charlie").await;
    client.log_in("@charlie").await;

    for uri in ["/admin/dashboard/", "/admin/analytics/", "/tutor/dashboard/"] {
        assert_eq!(client.get(uri).await.status(), StatusCode::FORBIDDEN, "{uri}");
    }
    let response = client.post("/invoices/1/mark_paid/", "").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn log_out_ends_the_session() {
    let mut client = Client::new().await;
    client.fx.student("@charlie").await;
    client.log_in("@charlie").await;
    assert_eq!(
        location(&client.get("/dashboard/").await),
        "/student/dashboard/"
    );

    let response = client.get("/log_out/").await;
    assert_eq!(location(&response), "/");
    assert!(client.cookie.is_none());
    assert_eq!(
        location(&client.get("/dashboard/").await),
        "/log_in/?next=%2Fdashboard%2F"
    );
}

#[tokio::test]
async fn only_owner_cancels_request() {
    let mut client = Client::new().await;
    let owner = client.fx.student("@charlie").await;
    client.fx.student("@other").await;
    let request = client
        .fx
        .services
        .requests
        .submit_student_request(&owner, &student_request_form("Python", "monday"))
        .await
        .unwrap();
    let uri = format!("/student/request/{}/cancel/", request.id);

    client.log_in("@other").await;
    assert_eq!(client.post(&uri, "").await.status(), StatusCode::NOT_FOUND);

    client.log_in("@charlie").await;
    let response = client.post(&uri, "").await;
    assert_eq!(location(&response), "/student/dashboard/");
    let response = client.post(&uri, "").await;
    assert_eq!(location(&response), "/student/dashboard/");
    let page = json(client.get("/student/dashboard/").await).await;
    let texts: Vec<&str> = page["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        [
            "Your request has been cancelled.",
            "Only pending requests can be cancelled."
        ]
    );
}

#[tokio::test]
async fn admin_pairs_requests_once() {
    let mut client = Client::new().await;
    let student = client.fx.student("@charlie").await;
    let tutor = client.fx.tutor("@janedoe").await;
    client.fx.admin("@johndoe").await;
    let services = client.fx.services.clone();
    let sr = services
        .requests
        .submit_student_request(&student, &student_request_form("Python", "monday"))
        .await
        .unwrap();
    let tr = services
        .requests
        .submit_tutor_request(&tutor, &tutor_request_form("Python", "monday"))
        .await
        .unwrap();
    client.log_in("@johndoe").await;

    let uri = format!("/admin/pair/{}/{}/", sr.id, tr.id);
    let page = json(client.get(&uri).await).await;
    assert_eq!(page["page"], "pair_request");
    assert_eq!(page["data"]["tutor_request"]["id"], tr.id);

    let blank = client.post(&uri, "start_time=&duration=").await;
    assert_eq!(location(&blank), uri);

    let body = format!("tutor_request_id={}&start_time=10%3A00&duration=60", tr.id);
    let response = client.post(&uri, &body).await;
    assert_eq!(location(&response), "/admin/dashboard/");
    let page = json(client.get("/admin/dashboard/").await).await;
    let texts: Vec<&str> = page["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["Please fill all fields.", PAIRED]);
    assert_eq!(page["data"]["scheduled_lessons"].as_array().unwrap().len(), 1);

    let again = client.post(&uri, &body).await;
    assert_eq!(location(&again), "/admin/dashboard/");
    let page = json(client.get("/admin/dashboard/").await).await;
    assert_eq!(page["messages"][0]["text"], STUDENT_NOT_PENDING);
}

#[tokio::test]
async fn student_invoices_need_student_profile() {
    let mut client = Client::new().await;
    client.fx.tutor("@janedoe").await;
    client.log_in("@janedoe").await;

    let response = client.get("/student/invoices/").await;
    assert_eq!(location(&response), "/");
    let response = client.get("/").await;
    assert_eq!(location(&response), "/tutor/dashboard/");
    let page = json(client.get("/tutor/dashboard/").await).await;
    assert_eq!(page["messages"][0]["text"], NOT_A_STUDENT);
}

#[tokio::test]
async fn lesson_cancel_page_is_for_participants() {
    let mut client = Client::new().await;
    let student = client.fx.student("@charlie").await;
    let tutor = client.fx.tutor("@janedoe").await;
    client.fx.student("@outsider").await;
    let services = client.fx.services.clone();
    let sr = services
        .requests
        .submit_student_request(&student, &student_request_form("Python", "monday"))
        .await
        .unwrap();
    let tr = services
        .requests
        .submit_tutor_request(&tutor, &tutor_request_form("Python", "monday"))
        .await
        .unwrap();
    let lesson = services
        .lessons
        .pair(
            sr.id,
            &crate::domain::forms::PairForm {
                tutor_request_id: Some(tr.id.to_string()),
                start_time: Some("09:30".into()),
                duration: Some("45".into()),
                location: None,
            },
        )
        .await
        .unwrap();
    let uri = format!("/lesson/{}/cancel/", lesson.id);

    client.log_in("@outsider").await;
    assert_eq!(client.get(&uri).await.status(), StatusCode::FORBIDDEN);

    client.log_in("@janedoe").await;
    assert_eq!(client.get(&uri).await.status(), StatusCode::OK);
    let response = client.post(&uri, "").await;
    assert_eq!(location(&response), "/tutor/dashboard/");
    let view = services.lessons.lesson(lesson.id).await.unwrap();
    assert_eq!(view.lesson.status, crate::domain::LessonStatus::Cancelled);
}
