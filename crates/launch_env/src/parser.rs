//! `KEY=VALUE` file parsing and serialization.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{EnvError, EnvResult};

/// Parse newline-delimited `KEY=VALUE` content.
///
/// Syntax follows `dotenvy`: `#` comments (also after a quoted value),
/// an optional `export ` prefix, single quotes taken literally and double
/// quotes with escapes. Malformed lines are logged and skipped. Pairs come
/// back in file order; a later duplicate wins when the caller inserts them
/// into a map.
pub fn parse_env(content: &str) -> EnvResult<Vec<(String, String)>> {
    Ok(collect_pairs("<input>", dotenvy::from_read_iter(content.as_bytes()))?)
}

/// Read and parse one env file without touching the process environment.
pub fn read_env_file(path: &Path) -> EnvResult<Vec<(String, String)>> {
    let origin = path.display().to_string();
    dotenvy::from_path_iter(path)
        .and_then(|iter| collect_pairs(&origin, iter))
        .map_err(|source| EnvError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn collect_pairs<I>(origin: &str, iter: I) -> dotenvy::Result<Vec<(String, String)>>
where
    I: Iterator<Item = dotenvy::Result<(String, String)>>,
{
    let mut pairs = Vec::new();
    for item in iter {
        match item {
            Ok(pair) => pairs.push(pair),
            Err(dotenvy::Error::LineParse(line, index)) => {
                warn!("Ignoring malformed line in {} at column {}: {:?}", origin, index, line);
            }
            Err(e) => return Err(e),
        }
    }
    debug!("Parsed {} pair(s) from {}", pairs.len(), origin);
    Ok(pairs)
}

/// Quote a value so that [`parse_env`] reads it back unchanged.
pub fn quote_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Render `KEY="value"` lines under a header comment.
pub fn render_env_file<'a>(
    header: &str,
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut out = String::new();
    for line in header.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(&quote_value(value));
        out.push('\n');
    }
    out
}
