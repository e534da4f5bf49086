//! Loads the MovieLens 100k data set (`u.user`, `u.item`, `u.data`)
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ReaderBuilder};

use crate::db::{Repository, StoreError, StoreResult};
use crate::models::{Movie, MovieId, User, UserId};

pub const USERS_FILE: &str = "u.user";
pub const MOVIES_FILE: &str = "u.item";
pub const RATINGS_FILE: &str = "u.data";

/// Counts of records written by [`seed_from_dir`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub movies: usize,
    pub ratings: usize,
}

/// A `u.data` line: user, movie, score (the timestamp is dropped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingRow {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub score: i32,
}

fn reader<R: Read>(input: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(input)
}

fn seed_error(file: &str, line: u64, msg: impl std::fmt::Display) -> StoreError {
    StoreError::Seed(format!("{}:{}: {}", file, line, msg))
}

/// The files are ISO-8859-1; every byte maps to the code point of equal value
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn field(record: &ByteRecord, index: usize) -> String {
    record.get(index).map(latin1).unwrap_or_default()
}

fn int_field(record: &ByteRecord, index: usize, file: &str, line: u64) -> StoreResult<i32> {
    let raw = field(record, index);
    raw.trim().parse().map_err(|_| {
        seed_error(
            file,
            line,
            format!("expected a number in column {}, got {:?}", index + 1, raw),
        )
    })
}

/// Drops a trailing ` (1995)` style year from a title
fn strip_year(title: &str) -> &str {
    let trimmed = title.trim_end();
    match trimmed.rfind(" (") {
        Some(pos)
            if trimmed.ends_with(')')
                && trimmed[pos + 2..trimmed.len() - 1].len() == 4
                && trimmed[pos + 2..trimmed.len() - 1].chars().all(|c| c.is_ascii_digit()) =>
        {
            &trimmed[..pos]
        }
        _ => trimmed,
    }
}

/// Parses `01-Jan-1995`; anything else is treated as unknown
fn release_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw.trim(), "%d-%b-%Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `user_id|age|gender|occupation|zipcode`
pub fn parse_users<R: Read>(input: R) -> StoreResult<Vec<User>> {
    let mut users = Vec::new();
    for (index, record) in reader(input, b'|').byte_records().enumerate() {
        let line = index as u64 + 1;
        let record = record.map_err(|e| seed_error(USERS_FILE, line, e))?;
        let zipcode = field(&record, 4);
        users.push(User {
            user_id: int_field(&record, 0, USERS_FILE, line)?,
            email: None,
            password: None,
            age: Some(int_field(&record, 1, USERS_FILE, line)?),
            zipcode: (!zipcode.is_empty()).then_some(zipcode),
        });
    }
    Ok(users)
}

/// `movie_id|title (year)|release date|video release|imdb url|genre flags...`
pub fn parse_movies<R: Read>(input: R) -> StoreResult<Vec<Movie>> {
    let mut movies = Vec::new();
    for (index, record) in reader(input, b'|').byte_records().enumerate() {
        let line = index as u64 + 1;
        let record = record.map_err(|e| seed_error(MOVIES_FILE, line, e))?;
        let imdb_url = field(&record, 4);
        movies.push(Movie {
            movie_id: int_field(&record, 0, MOVIES_FILE, line)?,
            title: strip_year(&field(&record, 1)).to_string(),
            released_at: release_date(&field(&record, 2)),
            imdb_url: (!imdb_url.is_empty()).then_some(imdb_url),
        });
    }
    Ok(movies)
}

/// `user_id\tmovie_id\tscore\ttimestamp`
pub fn parse_ratings<R: Read>(input: R) -> StoreResult<Vec<RatingRow>> {
    let mut ratings = Vec::new();
    for (index, record) in reader(input, b'\t').byte_records().enumerate() {
        let line = index as u64 + 1;
        let record = record.map_err(|e| seed_error(RATINGS_FILE, line, e))?;
        ratings.push(RatingRow {
            user_id: int_field(&record, 0, RATINGS_FILE, line)?,
            movie_id: int_field(&record, 1, RATINGS_FILE, line)?,
            score: int_field(&record, 2, RATINGS_FILE, line)?,
        });
    }
    Ok(ratings)
}

fn open(dir: &Path, name: &str) -> StoreResult<File> {
    let path = dir.join(name);
    File::open(&path).map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))
}

/// Loads users, movies and ratings from a MovieLens directory into `repo`
///
/// User and movie ids from the files are kept; ratings get fresh ids. A store
/// that already has users is left alone and an empty summary is returned.
pub async fn seed_from_dir<R: Repository + ?Sized>(
    repo: &R,
    dir: impl AsRef<Path>,
) -> StoreResult<SeedSummary> {
    let dir = dir.as_ref();

    if !repo.list_users().await?.is_empty() {
        tracing::info!(dir = %dir.display(), "Store already has users, skipping seed");
        return Ok(SeedSummary::default());
    }

    tracing::info!(dir = %dir.display(), "Seeding from MovieLens files");

    let users = parse_users(open(dir, USERS_FILE)?)?;
    let movies = parse_movies(open(dir, MOVIES_FILE)?)?;
    let ratings = parse_ratings(open(dir, RATINGS_FILE)?)?;

    let summary = SeedSummary {
        users: users.len(),
        movies: movies.len(),
        ratings: ratings.len(),
    };

    for user in users {
        repo.insert_user(user).await?;
    }
    for movie in movies {
        repo.insert_movie(movie).await?;
    }
    for row in ratings {
        repo.add_rating(row.user_id, row.movie_id, row.score).await?;
    }

    tracing::info!(
        users = summary.users,
        movies = summary.movies,
        ratings = summary.ratings,
        "Seeding finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, RatingStore};

    const USERS: &str = "1|24|M|technician|85711\n2|53|F|other|94043\n";
    const MOVIES: &[u8] = b"1|Toy Story (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?Toy%20Story%20(1995)|0|0|0|1|1\n\
267|unknown||||1|0|0\n\
1633|\xc1 k\xf6ldum klaka (Cold Fever) (1994)|08-Mar-1996||http://us.imdb.com/M/title-exact?Kaldum%20klaka%20(1994)|0|0\n";
    const RATINGS: &str = "1\t1\t5\t874965758\n2\t1\t4\t888550871\n1\t267\t2\t875071561\n";

    #[test]
    fn test_parse_users() {
        let users = parse_users(USERS.as_bytes()).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, 1);
        assert_eq!(users[0].age, Some(24));
        assert_eq!(users[1].zipcode.as_deref(), Some("94043"));
        assert_eq!(users[1].email, None);
    }

    #[test]
    fn test_parse_movies() {
        let movies = parse_movies(MOVIES).unwrap();
        assert_eq!(movies.len(), 3);

        assert_eq!(movies[0].title, "Toy Story");
        assert_eq!(
            movies[0].released_at,
            NaiveDate::from_ymd_opt(1995, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(movies[0].imdb_url.is_some());

        assert_eq!(movies[1].title, "unknown");
        assert_eq!(movies[1].released_at, None);
        assert_eq!(movies[1].imdb_url, None);

        assert_eq!(movies[2].title, "Á köldum klaka (Cold Fever)");
    }

    #[test]
    fn test_parse_ratings() {
        let ratings = parse_ratings(RATINGS.as_bytes()).unwrap();
        assert_eq!(
            ratings[1],
            RatingRow {
                user_id: 2,
                movie_id: 1,
                score: 4
            }
        );
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_ratings("1\t1\t5\t0\nx\t1\t5\t0\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("u.data:2"), "{}", err);
    }

    #[test]
    fn test_strip_year() {
        assert_eq!(strip_year("Heat (1995)"), "Heat");
        assert_eq!(strip_year("Se7en (a.k.a. Seven)"), "Se7en (a.k.a. Seven)");
        assert_eq!(strip_year("unknown"), "unknown");
    }

    #[tokio::test]
    async fn test_seed_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USERS_FILE), USERS).unwrap();
        std::fs::write(dir.path().join(MOVIES_FILE), MOVIES).unwrap();
        std::fs::write(dir.path().join(RATINGS_FILE), RATINGS).unwrap();

        let store = MemoryStore::new();
        let summary = seed_from_dir(&store, dir.path()).await.unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                users: 2,
                movies: 3,
                ratings: 3
            }
        );
        assert_eq!(store.ratings_for_movie(1).await.unwrap().len(), 2);
        assert!(store.get_movie(1633).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_seed_twice_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USERS_FILE), USERS).unwrap();
        std::fs::write(dir.path().join(MOVIES_FILE), MOVIES).unwrap();
        std::fs::write(dir.path().join(RATINGS_FILE), RATINGS).unwrap();

        let store = MemoryStore::new();
        seed_from_dir(&store, dir.path()).await.unwrap();
        let again = seed_from_dir(&store, dir.path()).await.unwrap();

        assert_eq!(again, SeedSummary::default());
        assert_eq!(store.ratings_for_movie(1).await.unwrap().len(), 2);
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_seed_missing_dir() {
        let store = MemoryStore::new();
        let result = seed_from_dir(&store, "/nonexistent/movielens").await;
        assert!(matches!(result, Err(StoreError::Seed(_))));
    }
}
