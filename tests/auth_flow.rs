mod common;

use axum::http::StatusCode;
use common::{body_text, cookie_pair, location, set_cookie, TestApp};
use healthbot::{auth, handlers};

#[tokio::test]
async fn test_sign_up_creates_account_and_redirects_to_login() {
    let app = TestApp::replying("hi").await;

    let response = app
        .post("/sign-up", "email=a%40b.com&firstName=Jo&password1=secret1&password2=secret1", None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(cookie_pair(&response, "session").is_none(), "sign-up must not log in");
    assert_eq!(app.count("SELECT COUNT(*) FROM users WHERE email = 'a@b.com'").await, 1);

    // The success notice is shown once on the login page, then consumed.
    let flash = cookie_pair(&response, "flash").expect("flash cookie");
    let page = app.get("/login", Some(&flash)).await;
    assert!(set_cookie(&page, "flash").unwrap().contains("Max-Age=0"));
    assert!(body_text(page).await.contains(handlers::ACCOUNT_CREATED));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = TestApp::replying("hi").await;
    let form = "email=a%40b.com&firstName=Jo&password1=secret1&password2=secret1";

    app.post("/sign-up", form, None).await;
    let response = app.post("/sign-up", form, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(auth::EMAIL_TAKEN));
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
}

#[tokio::test]
async fn test_sign_up_validation_messages() {
    let app = TestApp::replying("hi").await;

    let cases = [
        ("email=a%40b&firstName=Jo&password1=secret1&password2=secret1", auth::EMAIL_TOO_SHORT),
        ("email=a%40b.com&firstName=J&password1=secret1&password2=secret1", auth::FIRST_NAME_TOO_SHORT),
        ("email=a%40b.com&firstName=Jo&password1=secret1&password2=secret2", auth::PASSWORDS_DIFFER),
        ("email=a%40b.com&firstName=Jo&password1=abc&password2=abc", auth::PASSWORD_TOO_SHORT),
    ];

    for (form, expected) in cases {
        let response = app.post("/sign-up", form, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{form}");
        let body = body_text(response).await;
        // Notices are HTML-escaped in the page.
        assert!(body.contains(&expected.replace('\'', "&#x27;")), "{form}: {body}");
    }

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn test_login_rejections_create_no_session() {
    let app = TestApp::replying("hi").await;
    app.post("/sign-up", "email=a%40b.com&firstName=Jo&password1=secret1&password2=secret1", None)
        .await;

    let response = app.post("/login", "email=x%40y.com&password=secret1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_pair(&response, "session").is_none());
    assert!(body_text(response).await.contains(auth::UNKNOWN_EMAIL));

    let response = app.post("/login", "email=a%40b.com&password=wrong12", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_pair(&response, "session").is_none());
    assert!(body_text(response).await.contains(auth::WRONG_PASSWORD));
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::replying("hi").await;
    app.post("/sign-up", "email=a%40b.com&firstName=Jo&password1=secret1&password2=secret1", None)
        .await;

    let response = app.post("/login", "email=a%40b.com&password=secret1", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
    let cookie = set_cookie(&response, "session").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Max-Age"), "without remember the cookie ends with the browser session");

    let response = app.post("/login", "email=a%40b.com&password=secret1&remember=on", None).await;
    assert!(set_cookie(&response, "session").unwrap().contains("Max-Age="));

    let home = app.get("/", cookie_pair(&response, "session").as_deref()).await;
    assert_eq!(home.status(), StatusCode::OK);
    assert!(body_text(home).await.contains("Jo"));
}

#[tokio::test]
async fn test_guarded_routes_redirect_to_login() {
    let app = TestApp::replying("hi").await;

    for response in [
        app.get("/", None).await,
        app.post("/get", "msg=hello", None).await,
        app.get("/logout", None).await,
        app.get("/", Some("session=not-a-token")).await,
        app.get("/", Some("session=6f1c6e64-0a7b-4c4e-9d8e-2f1c4b5a6d7e")).await,
    ] {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
    }

    assert_eq!(app.count("SELECT COUNT(*) FROM chat_messages").await, 0);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::replying("hi").await;
    let session = app.signed_in("a%40b.com", "Jo", "secret1").await;

    let response = app.post("/logout", "", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(set_cookie(&response, "session").unwrap().contains("Max-Age=0"));

    let flash = cookie_pair(&response, "flash").expect("logout notice");
    let page = app.get("/login", Some(&flash)).await;
    assert!(body_text(page).await.contains("logged out"));

    // The old token no longer opens the chat.
    let response = app.get("/", Some(&session)).await;
    assert_eq!(location(&response), Some("/login"));
}
