use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Wraps a single `sqlx` future with the repository's configured
/// per-operation deadline, mapping an elapsed timeout to
/// `AppError::Timeout` before the inner `sqlx::Error` ever surfaces.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Timeout),
    }
}

pub fn clean_sql(sql: &str) -> String {
    sql.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn sql(query: &str) -> String {
    let mut result = String::new();
    let mut param_index = 1;
    for ch in clean_sql(query).chars() {
        if ch == '?' {
            result.push_str(&format!("${}", param_index));
            param_index += 1;
        } else {
            result.push(ch);
        }
    }
    result
}
