use sqlx::{PgPool, Postgres, Transaction};

use crate::error::AppError;

/// Runs a closure inside a transaction: commits on `Ok`, rolls back (and
/// logs) on `Err`. Used by the registration
/// saga, `Activate`, `BatchCreate` of scheduled shifts, `AssignRoles` on a
/// shift template, and `AutoPopulate`.
#[derive(Debug)]
pub struct DatabaseTransaction;

impl DatabaseTransaction {
    pub async fn run<T, F>(pool: &PgPool, f: F) -> Result<T, AppError>
    where
        F: for<'a> FnOnce(
            &'a mut Transaction<'_, Postgres>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, AppError>> + Send + 'a>>,
        T: Send,
    {
        let mut tx = pool.begin().await.map_err(AppError::from)?;

        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(AppError::from)?;
                Ok(value)
            }
            Err(err) => {
                log::warn!("transaction failed with error: {err}, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!(
                        "rollback failed after error (orig: {err}, rollback: {rollback_err})"
                    );
                }
                Err(err)
            }
        }
    }
}
