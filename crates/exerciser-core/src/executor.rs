//! Single-statement execution against the pool.

use crate::error::QueryError;
use crate::pool::PoolHandle;
use mysql_seed_types::{SeedRow, SeedValue};

/// Count `?` placeholders outside quoted literals, quoted identifiers and
/// comments.
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'?' => {
                count += 1;
                i += 1;
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\\' && quote != b'`' {
                        i += 2;
                        continue;
                    }
                    if bytes[i] == quote {
                        // A doubled quote is an escaped quote.
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'#' => i = skip_line(bytes, i),
            b'-' if bytes.get(i + 1) == Some(&b'-')
                && !matches!(bytes.get(i + 2), Some(c) if !c.is_ascii_whitespace()) =>
            {
                i = skip_line(bytes, i)
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }

    count
}

fn skip_line(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// Execute `template` with `params` bound positionally and consume one row.
///
/// Zero rows yields [`QueryError::NoRows`], which callers treat as success.
pub async fn execute_query<P: PoolHandle + ?Sized>(
    pool: &P,
    template: &str,
    params: &[SeedValue],
) -> Result<SeedRow, QueryError> {
    let expected = count_placeholders(template);
    if expected != params.len() {
        return Err(QueryError::MalformedTemplate {
            expected,
            actual: params.len(),
        });
    }

    pool.fetch_one(template, params)
        .await?
        .ok_or(QueryError::NoRows)
}
