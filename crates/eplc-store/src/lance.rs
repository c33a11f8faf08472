//! LanceDB-backed knowledge store.
//!
//! One database directory per store; the table holds `id`, `content` and a
//! fixed-size `vector` column. Vector search uses cosine distance so that
//! `1 - distance` is a cosine similarity.

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, DistanceType, Table};
use std::sync::Arc;
use tracing::{debug, info, warn};

use eplc_core::error::{Error, Result};
use eplc_core::traits::KnowledgeStore;
use eplc_core::types::Fragment;

use crate::schema::{build_fragment_schema, CONTENT_COLUMN, DISTANCE_COLUMN, ID_COLUMN};

pub struct LanceStore {
    label: String,
    table: Table,
}

impl LanceStore {
    /// Opens `table_name` in the database at `uri`, or the database's only
    /// table when no name is given.
    pub async fn open(label: &str, uri: &str, table_name: Option<&str>) -> Result<Self> {
        let db = connect(uri).execute().await.map_err(|e| Error::store_unavailable(label, e))?;
        let name = match table_name {
            Some(name) => name.to_string(),
            None => single_table(&db, label).await?,
        };
        let table = db.open_table(&name).execute().await.map_err(|e| Error::store_unavailable(label, e))?;
        info!(store = label, table = %name, uri, "knowledge store opened");
        Ok(Self { label: label.to_string(), table })
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> Error {
        Error::store_unavailable(&self.label, e)
    }

    fn columns() -> Select {
        Select::Columns(vec![ID_COLUMN.to_string(), CONTENT_COLUMN.to_string()])
    }
}

async fn single_table(db: &Connection, label: &str) -> Result<String> {
    let mut names = db.table_names().execute().await.map_err(|e| Error::store_unavailable(label, e))?;
    if names.is_empty() {
        return Err(Error::store_unavailable(label, "database contains no tables"));
    }
    if names.len() > 1 {
        warn!(store = label, tables = ?names, "multiple tables found, using the first");
    }
    Ok(names.remove(0))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str, store: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::store_unavailable(store, format!("column '{name}' missing or not utf8")))
}

#[async_trait]
impl KnowledgeStore for LanceStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn exact_lookup(&self, substring: &str, limit: usize) -> Result<Vec<Fragment>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        // plain queries are capped at a default top-k, so bound the scan by the table size
        let rows = self.table.count_rows(None).await.map_err(|e| self.unavailable(e))?;
        if rows == 0 {
            return Ok(Vec::new());
        }
        // TODO: push containment down as a LIKE filter once wildcard escaping in predicates is settled
        let mut stream = self
            .table
            .query()
            .select(Self::columns())
            .limit(rows)
            .execute()
            .await
            .map_err(|e| self.unavailable(e))?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(|e| self.unavailable(e))? {
            let ids = string_column(&batch, ID_COLUMN, &self.label)?;
            let contents = string_column(&batch, CONTENT_COLUMN, &self.label)?;
            for i in 0..batch.num_rows() {
                let text = contents.value(i);
                if !text.contains(substring) {
                    continue;
                }
                out.push(Fragment::exact(ids.value(i), text, &self.label));
                if out.len() >= limit {
                    return Ok(out);
                }
            }
        }
        Ok(out)
    }

    async fn vector_lookup(&self, query: &[f32], k: usize) -> Result<Vec<Fragment>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut stream = self
            .table
            .vector_search(query.to_vec())
            .map_err(|e| self.unavailable(e))?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .select(Self::columns())
            .execute()
            .await
            .map_err(|e| self.unavailable(e))?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(|e| self.unavailable(e))? {
            let ids = string_column(&batch, ID_COLUMN, &self.label)?;
            let contents = string_column(&batch, CONTENT_COLUMN, &self.label)?;
            let distances = batch
                .column_by_name(DISTANCE_COLUMN)
                .ok_or_else(|| self.unavailable("vector search returned no distance column"))?
                .as_primitive_opt::<Float32Type>()
                .ok_or_else(|| self.unavailable("distance column is not float32"))?;
            for i in 0..batch.num_rows() {
                hits.push(Fragment::semantic(ids.value(i), contents.value(i), distances.value(i), &self.label));
            }
        }
        hits.sort_by(|a, b| a.score().total_cmp(&b.score()));
        hits.truncate(k);
        debug!(store = %self.label, hits = hits.len(), "vector lookup");
        Ok(hits)
    }
}

/// One row to seed into a store table.
#[derive(Debug, Clone)]
pub struct FragmentRow {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Appends rows to `table_name` in the database at `uri`, creating the table
/// on first write. All rows must share one vector dimension.
pub async fn write_fragments(uri: &str, table_name: &str, rows: &[FragmentRow]) -> Result<()> {
    let Some(first) = rows.first() else { return Ok(()) };
    let dim = first.vector.len();
    if let Some(bad) = rows.iter().find(|r| r.vector.len() != dim) {
        return Err(Error::InvalidInput(format!(
            "fragment '{}' has {} dimensions, expected {dim}",
            bad.id,
            bad.vector.len()
        )));
    }
    let dim = i32::try_from(dim).map_err(|_| Error::InvalidInput(format!("vector dimension {dim} too large")))?;
    let schema = build_fragment_schema(dim);

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let contents: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
    let vectors: Vec<Option<Vec<Option<f32>>>> =
        rows.iter().map(|r| Some(r.vector.iter().map(|&x| Some(x)).collect())).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(contents)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), dim)),
        ],
    )
    .map_err(|e| Error::store_unavailable(table_name, e))?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));

    let db = connect(uri).execute().await.map_err(|e| Error::store_unavailable(table_name, e))?;
    let exists = db
        .table_names()
        .execute()
        .await
        .map_err(|e| Error::store_unavailable(table_name, e))?
        .iter()
        .any(|n| n == table_name);
    if exists {
        db.open_table(table_name)
            .execute()
            .await
            .map_err(|e| Error::store_unavailable(table_name, e))?
            .add(reader)
            .execute()
            .await
            .map_err(|e| Error::store_unavailable(table_name, e))?;
    } else {
        db.create_table(table_name, reader)
            .execute()
            .await
            .map_err(|e| Error::store_unavailable(table_name, e))?;
    }
    info!(table = table_name, rows = rows.len(), "fragments written");
    Ok(())
}
