//! Cursor-based bulk deletion for the Redis backends.
//!
//! All clear-by-pattern operations enumerate with SCAN in bounded batches
//! instead of one unbounded KEYS call, which would stall the shared store
//! under large key counts.

/// Keys fetched per SCAN iteration.
const SCAN_BATCH: usize = 100;

/// Delete every key matching `pattern`, returning how many were removed.
pub(crate) fn delete_matching(
    conn: &mut redis::Connection,
    pattern: &str,
) -> redis::RedisResult<u64> {
    let mut deleted: u64 = 0;
    let mut cursor: u64 = 0;

    loop {
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_BATCH)
            .query(conn)?;

        if !keys.is_empty() {
            let mut del = redis::cmd("DEL");
            for key in &keys {
                del.arg(key);
            }
            let removed: u64 = del.query(conn)?;
            deleted += removed;
        }

        if next == 0 {
            return Ok(deleted);
        }
        cursor = next;
    }
}
