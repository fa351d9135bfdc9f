//! Human-readable dump of cache contents for the `show` command

use anyhow::Result;

use crate::cache::store::CacheStore;

/// Render the cache contents as the `show` command prints them.
///
/// Decodable values and managed files are listed under separate labeled
/// sections. An empty or missing cache is not an error.
pub fn render(store: &CacheStore) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("cachedir: {}\n", store.cache_dir().display()));

    let values = store.iter_entries();
    let files = store.iter_managed_files();
    if values.is_empty() && files.is_empty() {
        out.push_str("cache is empty\n");
        return Ok(out);
    }

    if !values.is_empty() {
        out.push_str(&format!("{:-^60}\n", " cache values "));
        for (key, value) in values {
            out.push_str(&format!("{} contains:\n", key));
            for line in serde_json::to_string_pretty(&value)?.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }

    if !files.is_empty() {
        out.push_str(&format!("{:-^60}\n", " cache directories "));
        for (key, len) in files {
            out.push_str(&format!("{} is a file of length {}\n", key, len));
        }
    }

    Ok(out)
}

/// Print the cache dump to stdout. Exits successfully even when the cache
/// is empty.
pub fn run_show(store: &CacheStore) -> Result<()> {
    print!("{}", render(store)?);
    Ok(())
}
