use rusqlite::{params, Connection};
use tracing::debug;

use crate::db::StoreError;
use crate::models::BlogEntry;

/// Retrieve every blog entry in storage order. The table has no sort key, so
/// rows come back in SQLite's natural order, which for this schema is
/// insertion order.
pub fn fetch_blogs(conn: &Connection) -> Result<Vec<BlogEntry>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name, body FROM blogs")?;
    let blogs = stmt
        .query_map([], |row| {
            Ok(BlogEntry {
                id: row.get(0)?,
                name: row.get(1)?,
                body: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(blogs)
}

/// Retrieve the entries whose name contains `query` as a substring, matched
/// by SQLite's `LIKE` under the table's collation. The query is wrapped in
/// wildcards and otherwise passed through untouched, not even trimmed.
pub fn search_blogs(conn: &Connection, query: &str) -> Result<Vec<BlogEntry>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name, body FROM blogs WHERE name LIKE ?1")?;
    let pattern = format!("%{query}%");
    let blogs = stmt
        .query_map(params![pattern], |row| {
            Ok(BlogEntry {
                id: row.get(0)?,
                name: row.get(1)?,
                body: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(blogs)
}

/// Insert a new entry, returning the hydrated record so the caller can render
/// it without re-querying.
///
/// This is the insertion boundary for the non-empty invariant: either field
/// empty after trimming rejects the insert before any statement runs. The
/// trimmed values are what gets stored.
pub fn create_blog(conn: &Connection, name: &str, body: &str) -> Result<BlogEntry, StoreError> {
    let name = name.trim();
    let body = body.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyField { field: "name" });
    }
    if body.is_empty() {
        return Err(StoreError::EmptyField { field: "body" });
    }

    conn.execute(
        "INSERT INTO blogs (name, body) VALUES (?1, ?2)",
        params![name, body],
    )?;

    let id = conn.last_insert_rowid();
    debug!(id, "blog entry inserted");
    Ok(BlogEntry {
        id,
        name: name.to_string(),
        body: body.to_string(),
    })
}

/// Delete a single entry by id. Success means at least one row was affected;
/// a miss is reported as [`StoreError::NotFound`] and mutates nothing.
pub fn delete_blog(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let deleted = conn.execute("DELETE FROM blogs WHERE id = ?1", params![id])?;
    if deleted == 0 {
        Err(StoreError::NotFound { id })
    } else {
        debug!(id, "blog entry deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn create_assigns_fresh_unique_ids() {
        let conn = test_conn();
        let first = create_blog(&conn, "Trip", "Went hiking").unwrap();
        let second = create_blog(&conn, "Food", "Made pasta").unwrap();
        assert_ne!(first.id, second.id);

        let all = fetch_blogs(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&first));
        assert!(all.contains(&second));
    }

    #[test]
    fn create_trims_stored_values() {
        let conn = test_conn();
        let entry = create_blog(&conn, "  Trip  ", "\tWent hiking\n").unwrap();
        assert_eq!(entry.name, "Trip");
        assert_eq!(entry.body, "Went hiking");
        assert_eq!(fetch_blogs(&conn).unwrap(), vec![entry]);
    }

    #[test]
    fn create_rejects_blank_fields_without_mutating() {
        let conn = test_conn();
        for (name, body) in [("", "x"), ("x", ""), ("   ", "x"), ("x", " \t "), ("", "")] {
            let err = create_blog(&conn, name, body).unwrap_err();
            assert!(matches!(err, StoreError::EmptyField { .. }));
        }
        assert!(fetch_blogs(&conn).unwrap().is_empty());
    }

    #[test]
    fn fetch_is_idempotent_and_insertion_ordered() {
        let conn = test_conn();
        for i in 0..5 {
            create_blog(&conn, &format!("entry {i}"), "body").unwrap();
        }
        let first = fetch_blogs(&conn).unwrap();
        let second = fetch_blogs(&conn).unwrap();
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["entry 0", "entry 1", "entry 2", "entry 3", "entry 4"]
        );
    }

    #[test]
    fn search_returns_exactly_the_matching_subset() {
        let conn = test_conn();
        create_blog(&conn, "Trip", "Went hiking").unwrap();
        create_blog(&conn, "Roadtrip", "Drove south").unwrap();
        create_blog(&conn, "Food", "Made pasta").unwrap();

        let hits = search_blogs(&conn, "Tri").unwrap();
        let names: Vec<&str> = hits.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Trip", "Roadtrip"]);

        assert!(search_blogs(&conn, "zzz").unwrap().is_empty());
    }

    #[test]
    fn empty_query_matches_everything() {
        let conn = test_conn();
        create_blog(&conn, "Trip", "Went hiking").unwrap();
        create_blog(&conn, "Food", "Made pasta").unwrap();
        assert_eq!(search_blogs(&conn, "").unwrap(), fetch_blogs(&conn).unwrap());
    }

    #[test]
    fn search_query_is_not_trimmed() {
        let conn = test_conn();
        create_blog(&conn, "Trip", "Went hiking").unwrap();
        // A padded query only matches names containing the padded substring.
        assert!(search_blogs(&conn, " Trip ").unwrap().is_empty());
    }

    #[test]
    fn delete_removes_exactly_one_row() {
        let conn = test_conn();
        let keep = create_blog(&conn, "Keep", "body").unwrap();
        let gone = create_blog(&conn, "Gone", "body").unwrap();

        delete_blog(&conn, gone.id).unwrap();
        let remaining = fetch_blogs(&conn).unwrap();
        assert_eq!(remaining, vec![keep]);
    }

    #[test]
    fn delete_of_unknown_id_fails_and_mutates_nothing() {
        let conn = test_conn();
        create_blog(&conn, "Trip", "Went hiking").unwrap();

        let err = delete_blog(&conn, 999).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 999 }));
        assert_eq!(fetch_blogs(&conn).unwrap().len(), 1);
    }

    #[test]
    fn add_search_delete_scenario() {
        let conn = test_conn();

        let entry = create_blog(&conn, "Trip", "Went hiking").unwrap();
        let all = fetch_blogs(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Trip");
        assert_eq!(all[0].body, "Went hiking");

        assert!(create_blog(&conn, "", "x").is_err());
        assert_eq!(fetch_blogs(&conn).unwrap(), all);

        let hits = search_blogs(&conn, "Tri").unwrap();
        assert_eq!(hits, all);
        assert!(search_blogs(&conn, "zzz").unwrap().is_empty());

        delete_blog(&conn, entry.id).unwrap();
        assert!(fetch_blogs(&conn).unwrap().is_empty());
    }
}
