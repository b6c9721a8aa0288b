use std::future::Future;

use crate::domain::{KanbanError, RepoResult};

/// Runs `write` over `items` one at a time and stops at the first failure.
///
/// On failure the error is a [`KanbanError::PartialBatch`] carrying how many writes
/// landed, the id that failed, and the ids that were never attempted.
pub(crate) async fn run_batch<T, F, Fut>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> String,
    mut write: F,
) -> RepoResult<usize>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = RepoResult<()>>,
{
    let ids: Vec<String> = items.iter().map(&id_of).collect();

    for (applied, item) in items.into_iter().enumerate() {
        if let Err(err) = write(item).await {
            tracing::warn!(
                applied,
                failed_id = ids[applied].as_str(),
                error = %err,
                "Batch write failed, stopping"
            );
            return Err(KanbanError::PartialBatch {
                applied,
                failed_id: ids[applied].clone(),
                remaining: ids[applied + 1..].to_vec(),
                source: Box::new(err),
            });
        }
    }

    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_at_first_failure() {
        let items = vec!["a", "b", "c", "d"];
        let mut seen = Vec::new();

        let result = run_batch(items, |s| s.to_string(), |item| {
            seen.push(item);
            let outcome = if item == "b" {
                Err(KanbanError::backend("boom"))
            } else {
                Ok(())
            };
            async move { outcome }
        })
        .await;

        assert_eq!(seen, vec!["a", "b"]);
        match result {
            Err(KanbanError::PartialBatch {
                applied,
                failed_id,
                remaining,
                ..
            }) => {
                assert_eq!(applied, 1);
                assert_eq!(failed_id, "b");
                assert_eq!(remaining, vec!["c", "d"]);
            }
            other => panic!("expected partial batch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn counts_every_write_on_success() {
        let result = run_batch(vec![1, 2, 3], |n| n.to_string(), |_| async { Ok(()) }).await;
        assert_eq!(result.unwrap(), 3);
    }
}
