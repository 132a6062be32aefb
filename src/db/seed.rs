//! Sample catalog for a fresh database.
//!
//! Inserts a handful of authors and books. Authors are matched by name and
//! books by title, so re-runs are idempotent (existing records are kept).

use tracing::{debug, info, warn};

use super::{BookFilter, CreateAuthor, CreateBook, Database, DbError};

/// Result of running the seed.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub authors_created: usize,
    pub books_created: usize,
    pub errors: Vec<String>,
}

struct AuthorRow {
    name: &'static str,
    born: Option<i32>,
}

struct BookRow {
    title: &'static str,
    published: i32,
    author: &'static str,
    genres: &'static [&'static str],
}

const AUTHORS: &[AuthorRow] = &[
    AuthorRow {
        name: "Robert Martin",
        born: Some(1952),
    },
    AuthorRow {
        name: "Martin Fowler",
        born: Some(1963),
    },
    AuthorRow {
        name: "Fyodor Dostoevsky",
        born: Some(1821),
    },
    AuthorRow {
        name: "Joshua Kerievsky",
        born: None,
    },
    AuthorRow {
        name: "Sandi Metz",
        born: None,
    },
];

const BOOKS: &[BookRow] = &[
    BookRow {
        title: "Clean Code",
        published: 2008,
        author: "Robert Martin",
        genres: &["refactoring"],
    },
    BookRow {
        title: "Agile software development",
        published: 2002,
        author: "Robert Martin",
        genres: &["agile", "patterns", "design"],
    },
    BookRow {
        title: "Refactoring, edition 2",
        published: 2018,
        author: "Martin Fowler",
        genres: &["refactoring"],
    },
    BookRow {
        title: "Refactoring to patterns",
        published: 2008,
        author: "Joshua Kerievsky",
        genres: &["refactoring", "patterns"],
    },
    BookRow {
        title: "Practical Object-Oriented Design, An Agile Primer Using Ruby",
        published: 2012,
        author: "Sandi Metz",
        genres: &["refactoring", "design"],
    },
    BookRow {
        title: "Crime and punishment",
        published: 1866,
        author: "Fyodor Dostoevsky",
        genres: &["classic", "crime"],
    },
    BookRow {
        title: "The Demon ",
        published: 1872,
        author: "Fyodor Dostoevsky",
        genres: &["classic", "revolution"],
    },
];

async fn seed_authors(db: &Database, result: &mut SeedResult) -> Result<(), DbError> {
    for row in AUTHORS {
        if db.authors().get_by_name(row.name).await?.is_some() {
            debug!(name = row.name, "Author already present");
            continue;
        }

        match db
            .authors()
            .create(CreateAuthor {
                name: row.name.to_string(),
                born: row.born,
            })
            .await
        {
            Ok(_) => result.authors_created += 1,
            Err(e) if e.is_constraint_violation() => {
                warn!(name = row.name, error = %e, "Failed to seed author");
                result.errors.push(format!("author {}: {}", row.name, e));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

async fn seed_books(db: &Database, result: &mut SeedResult) -> Result<(), DbError> {
    for row in BOOKS {
        if db.books().get_by_title(row.title).await?.is_some() {
            debug!(title = row.title, "Book already present");
            continue;
        }

        let Some(author) = db.authors().get_by_name(row.author).await? else {
            result
                .errors
                .push(format!("book {}: author {} missing", row.title, row.author));
            continue;
        };

        db.books()
            .create(CreateBook {
                title: row.title.to_string(),
                published: row.published,
                author_id: author.id,
                genres: row.genres.iter().map(|g| g.to_string()).collect(),
            })
            .await?;
        result.books_created += 1;
    }
    Ok(())
}

/// Insert the sample authors and books that are not present yet
pub async fn seed_sample_catalog(db: &Database) -> Result<SeedResult, DbError> {
    let mut result = SeedResult::default();

    seed_authors(db, &mut result).await?;
    seed_books(db, &mut result).await?;

    let total = db.books().list(&BookFilter::All).await?.len();
    info!(
        authors_created = result.authors_created,
        books_created = result.books_created,
        total_books = total,
        "Sample catalog seeded"
    );

    Ok(result)
}
