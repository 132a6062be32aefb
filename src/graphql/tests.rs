//! Schema-level tests running GraphQL documents against the in-memory store

use async_graphql::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::{CatalogSchema, build_schema, current_user_from_headers};
use crate::db::{CreateBook, CreateUser, Database, UserRecord, seed};
use crate::services::{AuthConfig, AuthService};

struct Harness {
    schema: CatalogSchema,
    db: Database,
    auth: AuthService,
}

impl Harness {
    fn new() -> Self {
        Self::with_auth(AuthConfig::new("test-jwt-secret"))
    }

    fn with_auth(config: AuthConfig) -> Self {
        let db = Database::in_memory();
        let auth = AuthService::new(config);
        Self {
            schema: build_schema(db.clone(), auth.clone()),
            db,
            auth,
        }
    }

    async fn seeded() -> Self {
        let harness = Self::new();
        seed::seed_sample_catalog(&harness.db).await.unwrap();
        harness
    }

    async fn user(&self, username: &str) -> UserRecord {
        self.db
            .users()
            .create(CreateUser {
                username: username.to_string(),
                favorite_genre: "refactoring".to_string(),
            })
            .await
            .unwrap()
    }

    /// Execute as an anonymous client
    async fn run(&self, query: &str) -> Value {
        self.execute(Request::new(query), None).await
    }

    /// Execute with the headers a client would send
    async fn run_with_header(&self, query: &str, authorization: &str) -> Value {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        let user = current_user_from_headers(&headers, &self.auth, &self.db).await;
        self.execute(Request::new(query), user.map(|u| u.0)).await
    }

    /// Execute as `user`, going through a freshly issued token
    async fn run_as(&self, query: &str, user: &UserRecord) -> Value {
        let token = self.auth.issue_token(user).unwrap();
        self.run_with_header(query, &format!("Bearer {token}")).await
    }

    async fn execute(&self, request: Request, user: Option<UserRecord>) -> Value {
        let request = match user {
            Some(user) => request.data(super::CurrentUser(user)),
            None => request,
        };
        serde_json::to_value(self.schema.execute(request).await).unwrap()
    }

    async fn counts(&self) -> (u64, u64) {
        (
            self.db.books().count().await.unwrap(),
            self.db.authors().count().await.unwrap(),
        )
    }
}

fn error_code(response: &Value) -> &str {
    response["errors"][0]["extensions"]["code"]
        .as_str()
        .unwrap_or_default()
}

fn add_book(title: &str, author: &str) -> String {
    format!(
        r#"mutation {{
            addBook(title: "{title}", authorName: "{author}", published: 2020, genres: ["testing"]) {{
                title author {{ name }}
            }}
        }}"#
    )
}

fn author_counts(response: &Value) -> Vec<(String, i64)> {
    response["data"]["allAuthors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["name"].as_str().unwrap().to_string(),
                a["bookCount"].as_i64().unwrap(),
            )
        })
        .collect()
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_counts() {
    let harness = Harness::seeded().await;
    let response = harness.run("{ bookCount authorCount }").await;
    assert_eq!(response["data"], json!({ "bookCount": 7, "authorCount": 5 }));
}

#[tokio::test]
async fn test_all_books_populates_authors() {
    let harness = Harness::seeded().await;
    let response = harness
        .run(r#"{ allBooks(authorName: "Robert Martin") { title author { name born bookCount } } }"#)
        .await;

    assert_eq!(
        response["data"]["allBooks"],
        json!([
            {
                "title": "Clean Code",
                "author": { "name": "Robert Martin", "born": 1952, "bookCount": 2 }
            },
            {
                "title": "Agile software development",
                "author": { "name": "Robert Martin", "born": 1952, "bookCount": 2 }
            }
        ])
    );
}

#[tokio::test]
async fn test_title_filter_is_case_insensitive() {
    let harness = Harness::seeded().await;
    let response = harness
        .run(r#"{ allBooks(title: "clean", genre: "classic") { title } }"#)
        .await;
    assert_eq!(response["data"]["allBooks"], json!([{ "title": "Clean Code" }]));
}

#[tokio::test]
async fn test_genre_filters() {
    let harness = Harness::seeded().await;

    let response = harness.run(r#"{ allBooks(genre: "crime") { title } }"#).await;
    assert_eq!(
        response["data"]["allBooks"],
        json!([{ "title": "Crime and punishment" }])
    );

    let response = harness.run(r#"{ allBooks(genre: "all") { title } }"#).await;
    assert_eq!(response["data"]["allBooks"].as_array().unwrap().len(), 7);

    let response = harness
        .run(r#"{ allBooks(authorName: "Fyodor Dostoevsky", genre: "revolution") { title } }"#)
        .await;
    assert_eq!(response["data"]["allBooks"], json!([{ "title": "The Demon " }]));
}

#[tokio::test]
async fn test_unknown_author_lists_nothing() {
    let harness = Harness::seeded().await;
    let response = harness
        .run(r#"{ allBooks(authorName: "Nobody Known") { title } }"#)
        .await;
    assert_eq!(response["data"]["allBooks"], json!([]));
}

#[tokio::test]
async fn test_empty_filter_arguments_are_ignored() {
    let harness = Harness::seeded().await;
    let response = harness
        .run(r#"{ allBooks(title: "", authorName: "Sandi Metz", genre: "") { title } }"#)
        .await;
    assert_eq!(
        response["data"]["allBooks"],
        json!([{ "title": "Practical Object-Oriented Design, An Agile Primer Using Ruby" }])
    );
}

#[tokio::test]
async fn test_all_authors_includes_zero_counts() {
    let harness = Harness::new();
    let user = harness.user("mluukkai").await;
    harness.run_as(&add_book("Book number one", "Author One"), &user).await;
    harness.run_as(&add_book("Book number two", "Author One"), &user).await;
    harness
        .db
        .authors()
        .create(crate::db::CreateAuthor::named("Author Two"))
        .await
        .unwrap();

    let response = harness.run("{ allAuthors { name bookCount } }").await;
    assert_eq!(
        author_counts(&response),
        vec![("Author One".to_string(), 2), ("Author Two".to_string(), 0)]
    );
}

#[tokio::test]
async fn test_find_books_by_exact_title() {
    let harness = Harness::seeded().await;

    let response = harness
        .run(r#"{ findBooksByTitle(title: "Clean Code") { title author { name } } }"#)
        .await;
    assert_eq!(
        response["data"]["findBooksByTitle"],
        json!([{ "title": "Clean Code", "author": { "name": "Robert Martin" } }])
    );

    let response = harness
        .run(r#"{ findBooksByTitle(title: "clean code") { title } }"#)
        .await;
    assert_eq!(response["data"]["findBooksByTitle"], json!([]));
}

#[tokio::test]
async fn test_me() {
    let harness = Harness::new();
    let user = harness.user("mluukkai").await;

    let response = harness.run("{ me { username favoriteGenre } }").await;
    assert_eq!(response["data"]["me"], Value::Null);

    let response = harness.run_as("{ me { username favoriteGenre id } }", &user).await;
    assert_eq!(
        response["data"]["me"],
        json!({ "username": "mluukkai", "favoriteGenre": "refactoring", "id": user.id })
    );
}

// ============================================================================
// addBook
// ============================================================================

#[tokio::test]
async fn test_add_book_creates_author_once() {
    let harness = Harness::new();
    let user = harness.user("mluukkai").await;

    let response = harness.run_as(&add_book("Clean Architecture", "Robert Martin"), &user).await;
    assert_eq!(
        response["data"]["addBook"],
        json!({ "title": "Clean Architecture", "author": { "name": "Robert Martin" } })
    );
    assert_eq!(harness.counts().await, (1, 1));

    harness.run_as(&add_book("Clean Code", "Robert Martin"), &user).await;
    assert_eq!(harness.counts().await, (2, 1));

    harness.run_as(&add_book("Refactoring", "Martin Fowler"), &user).await;
    assert_eq!(harness.counts().await, (3, 2));
}

#[tokio::test]
async fn test_added_book_listed_once() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;
    harness
        .run_as(&add_book("Pride and Prejudice", "Jane Austen"), &user)
        .await;

    let response = harness
        .run("{ allBooks { title published genres author { name born id bookCount } } }")
        .await;
    let matches: Vec<&Value> = response["data"]["allBooks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["title"] == "Pride and Prejudice")
        .collect();

    assert_eq!(matches.len(), 1);
    let author = &matches[0]["author"];
    assert_eq!(author["name"], "Jane Austen");
    assert_eq!(author["born"], Value::Null);
    assert_eq!(author["bookCount"], 1);
    assert!(author["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_add_book_rejects_short_title() {
    let harness = Harness::new();
    let user = harness.user("mluukkai").await;

    let response = harness.run_as(&add_book("Abc", "Robert Martin"), &user).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
    assert_eq!(response["errors"][0]["extensions"]["invalidArgs"], "Abc");
    assert_eq!(harness.db.books().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_add_book_rejects_short_author_name() {
    let harness = Harness::new();
    let user = harness.user("mluukkai").await;

    let response = harness.run_as(&add_book("Clean Code", "Al"), &user).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
    assert_eq!(response["errors"][0]["extensions"]["invalidArgs"], "Al");
    assert!(
        response["errors"][0]["extensions"]["error"]
            .as_str()
            .unwrap()
            .contains("at least 3")
    );
    assert_eq!(harness.counts().await, (0, 0));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_mutations_require_authentication() {
    let harness = Harness::seeded().await;
    let before = harness.counts().await;

    let documents = [
        add_book("Some new title", "Some New Author"),
        r#"mutation { editAuthor(name: "Sandi Metz", setBornTo: 1965) { born } }"#.to_string(),
        r#"mutation { deleteBook(title: "Clean Code") { title } }"#.to_string(),
    ];

    for document in &documents {
        let response = harness.run(document).await;
        assert_eq!(error_code(&response), "UNAUTHENTICATED", "{document}");

        let response = harness.run_with_header(document, "Bearer not-a-token").await;
        assert_eq!(error_code(&response), "UNAUTHENTICATED", "{document}");
    }

    assert_eq!(harness.counts().await, before);
    let sandi = harness.db.authors().get_by_name("Sandi Metz").await.unwrap().unwrap();
    assert_eq!(sandi.born, None);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let harness = Harness::new();
    let user = harness.user("mluukkai").await;
    let token = harness
        .auth
        .issue_token_at(&user, Utc::now() - Duration::hours(2))
        .unwrap();

    let response = harness
        .run_with_header(&add_book("Clean Code", "Robert Martin"), &format!("Bearer {token}"))
        .await;
    assert_eq!(error_code(&response), "UNAUTHENTICATED");
    assert_eq!(harness.counts().await, (0, 0));
}

#[tokio::test]
async fn test_tokens_without_expiry_authenticate() {
    let harness = Harness::with_auth(AuthConfig {
        token_lifetime: None,
        ..AuthConfig::new("test-jwt-secret")
    });
    let user = harness.user("mluukkai").await;
    let token = harness
        .auth
        .issue_token_at(&user, Utc::now() - Duration::days(30))
        .unwrap();

    let response = harness
        .run_with_header("{ me { username } }", &format!("Bearer {token}"))
        .await;
    assert_eq!(response["data"]["me"]["username"], "mluukkai");

    // A server that expires tokens refuses ones issued without `exp`
    let expiring = AuthService::new(AuthConfig::new("test-jwt-secret"));
    assert_eq!(expiring.authenticate(&harness.db, &token).await, None);
}

#[tokio::test]
async fn test_login() {
    let harness = Harness::new();
    harness.user("mluukkai").await;

    let response = harness
        .run(r#"mutation { login(username: "mluukkai", password: "secret") { value } }"#)
        .await;
    let token = response["data"]["login"]["value"].as_str().unwrap();

    let me = harness
        .run_with_header("{ me { username } }", &format!("Bearer {token}"))
        .await;
    assert_eq!(me["data"]["me"]["username"], "mluukkai");
}

#[tokio::test]
async fn test_login_failure_does_not_reveal_username() {
    let harness = Harness::new();
    harness.user("mluukkai").await;

    let wrong_password = harness
        .run(r#"mutation { login(username: "mluukkai", password: "hunter2") { value } }"#)
        .await;
    let unknown_user = harness
        .run(r#"mutation { login(username: "nobody", password: "secret") { value } }"#)
        .await;

    assert_eq!(error_code(&wrong_password), "INVALID_CREDENTIALS");
    assert_eq!(wrong_password["errors"], unknown_user["errors"]);
}

// ============================================================================
// createUser / editAuthor
// ============================================================================

#[tokio::test]
async fn test_create_user() {
    let harness = Harness::new();
    let document = r#"mutation { createUser(username: "mluukkai", favoriteGenre: "refactoring") { username favoriteGenre } }"#;

    let response = harness.run(document).await;
    assert_eq!(
        response["data"]["createUser"],
        json!({ "username": "mluukkai", "favoriteGenre": "refactoring" })
    );

    let response = harness.run(document).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
    assert_eq!(response["errors"][0]["extensions"]["invalidArgs"], "mluukkai");
}

#[tokio::test]
async fn test_create_user_rejects_short_username() {
    let harness = Harness::new();
    let response = harness
        .run(r#"mutation { createUser(username: "ml", favoriteGenre: "crime") { id } }"#)
        .await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_edit_author() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;

    let response = harness
        .run_as(
            r#"mutation { editAuthor(name: "Sandi Metz", setBornTo: 1965) { name born bookCount } }"#,
            &user,
        )
        .await;
    assert_eq!(
        response["data"]["editAuthor"],
        json!({ "name": "Sandi Metz", "born": 1965, "bookCount": 1 })
    );
}

#[tokio::test]
async fn test_edit_missing_author_is_not_found() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;

    let response = harness
        .run_as(
            r#"mutation { editAuthor(name: "Nobody Known", setBornTo: 1965) { born } }"#,
            &user,
        )
        .await;
    assert_eq!(error_code(&response), "NOT_FOUND");
    assert_eq!(response["errors"][0]["extensions"]["invalidArgs"], "Nobody Known");
    assert_eq!(harness.db.authors().count().await.unwrap(), 5);
}

// ============================================================================
// deleteBook
// ============================================================================

#[tokio::test]
async fn test_delete_last_book_removes_author() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;

    let response = harness
        .run_as(
            r#"mutation { deleteBook(title: "Refactoring, edition 2") { title author { name } } }"#,
            &user,
        )
        .await;
    assert_eq!(
        response["data"]["deleteBook"],
        json!({ "title": "Refactoring, edition 2", "author": { "name": "Martin Fowler" } })
    );

    let authors = author_counts(&harness.run("{ allAuthors { name bookCount } }").await);
    assert!(!authors.iter().any(|(name, _)| name == "Martin Fowler"));
    assert_eq!(harness.counts().await, (6, 4));
}

#[tokio::test]
async fn test_delete_keeps_author_with_remaining_books() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;

    harness
        .run_as(r#"mutation { deleteBook(title: "Clean Code") { title } }"#, &user)
        .await;

    let authors = author_counts(&harness.run("{ allAuthors { name bookCount } }").await);
    assert!(authors.contains(&("Robert Martin".to_string(), 1)));
    assert_eq!(harness.counts().await, (6, 5));
}

#[tokio::test]
async fn test_delete_book_with_missing_author_still_deletes() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;
    harness
        .db
        .books()
        .create(CreateBook {
            title: "Lost and found".into(),
            published: 1999,
            author_id: mongodb::bson::oid::ObjectId::new().to_hex(),
            genres: vec![],
        })
        .await
        .unwrap();
    assert_eq!(harness.counts().await, (8, 5));

    let response = harness
        .run_as(r#"mutation { deleteBook(title: "Lost and found") { title } }"#, &user)
        .await;
    assert_eq!(error_code(&response), "INTERNAL_SERVER_ERROR");
    assert_eq!(response["errors"][0]["message"], "internal server error");

    assert_eq!(harness.counts().await, (7, 5));
    let response = harness.run("{ bookCount allBooks { title } }").await;
    assert_eq!(response["data"]["bookCount"], 7);
    assert_eq!(response["data"]["allBooks"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_delete_missing_book_is_not_found() {
    let harness = Harness::seeded().await;
    let user = harness.user("mluukkai").await;

    let response = harness
        .run_as(r#"mutation { deleteBook(title: "No Such Book") { title } }"#, &user)
        .await;
    assert_eq!(error_code(&response), "NOT_FOUND");
    assert_eq!(response["errors"][0]["extensions"]["invalidArgs"], "No Such Book");
    assert_eq!(harness.counts().await, (7, 5));
}
