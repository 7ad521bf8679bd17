//! Category import
//!
//! Categories reference their parent by id, so the batch must be
//! upserted parent-before-child. Feed order carries no such guarantee;
//! a stable topological sort (Kahn's algorithm, ties broken by feed
//! order) establishes it for trees of any depth.

use crate::import::feed::FeedCategory;
use crate::Result;
use sqlx::{PgConnection, Postgres, Transaction};
use std::collections::{HashMap, HashSet, VecDeque};

/// Order categories so every parent precedes its children
///
/// Parents not present in the batch (already in the store, or missing
/// from the feed) do not constrain the order. Nodes stuck in a
/// reference cycle are appended in feed order so the upsert still runs;
/// the database rejects truly dangling references.
pub fn topological_order(categories: &[FeedCategory]) -> Vec<&FeedCategory> {
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for (i, cat) in categories.iter().enumerate() {
        index_of.entry(cat.id.as_str()).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
    let mut in_degree = vec![0usize; categories.len()];
    for (i, cat) in categories.iter().enumerate() {
        if let Some(&parent) = cat.parent_id.as_deref().and_then(|p| index_of.get(p)) {
            if parent != i {
                children[parent].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..categories.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();
    let mut ordered = Vec::with_capacity(categories.len());
    let mut visited = vec![false; categories.len()];

    while let Some(i) = queue.pop_front() {
        visited[i] = true;
        ordered.push(&categories[i]);
        for &child in &children[i] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if ordered.len() < categories.len() {
        tracing::warn!(
            stuck = categories.len() - ordered.len(),
            "Category parent references form a cycle; appending in feed order"
        );
        for (i, cat) in categories.iter().enumerate() {
            if !visited[i] {
                ordered.push(cat);
            }
        }
    }

    ordered
}

/// Upsert the batch in topological order; returns the number upserted
pub async fn upsert_categories(
    tx: &mut Transaction<'_, Postgres>,
    categories: &[FeedCategory],
) -> Result<usize> {
    let ordered = topological_order(categories);

    for category in &ordered {
        upsert_one(&mut **tx, category).await?;
    }

    Ok(ordered.len())
}

/// Every category id present in the store
///
/// Queried after the batch upsert, so it covers both this feed's
/// categories and those from earlier imports. The product pass uses it
/// as its existence cache: a partial feed that omits `<categories>`
/// must not lose links to categories the store already has.
pub async fn known_ids(tx: &mut Transaction<'_, Postgres>) -> Result<HashSet<String>> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM categories")
        .fetch_all(&mut **tx)
        .await?;
    Ok(ids.into_iter().collect())
}

async fn upsert_one(conn: &mut PgConnection, category: &FeedCategory) -> Result<()> {
    sqlx::query(
        "INSERT INTO categories (id, name, parent_id, created_at, updated_at) \
         VALUES ($1, $2, $3, now(), now()) \
         ON CONFLICT (id) DO UPDATE \
         SET name = EXCLUDED.name, parent_id = EXCLUDED.parent_id, updated_at = now()",
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(&category.parent_id)
    .execute(conn)
    .await?;
    Ok(())
}
