mod category;
pub use category::Categories;

mod task;
pub use task::Tasks;

use std::fmt::Debug;

use taskboard_model::{QueryDescriptor, SortField};
use taskboard_store::{Embed, Row, Select};

use crate::error::PipelineError;

/// Descriptor type for a resource.
pub type Descriptor<R> = QueryDescriptor<<R as Resource>::Filter, <R as Resource>::SortField>;

/// Entity collection served by a pipeline.
///
/// Binds the domain types of one table to its wire representation so the
/// pipeline stages stay generic.
pub trait Resource: Send + Sync + 'static {
    type Entity: Clone + Debug + Send + Sync + 'static;
    type Id: AsRef<str> + Clone + Debug + Send + Sync + 'static;
    type Filter: Clone + Default + PartialEq + Debug + Send + Sync + 'static;
    type SortField: SortField<Entity = Self::Entity> + Default;
    type Create: Debug + Send + Sync;
    type Update: Debug + Send + Sync;

    /// Table name in the store.
    const TABLE: &'static str;

    /// Related rows to expand into every selected row.
    fn embed() -> Option<Embed> {
        None
    }

    /// Add the store predicates for `filter`.
    fn apply_filter(select: Select, filter: &Self::Filter) -> Select;

    /// Replace the free-text part of `filter` with `text`.
    fn merge_search(filter: &Self::Filter, text: &str) -> Self::Filter;

    fn entity_id(entity: &Self::Entity) -> &Self::Id;

    fn decode(row: Row) -> Result<Self::Entity, PipelineError>;

    fn encode_create(payload: &Self::Create) -> Row;

    /// Encode only the fields present in `patch`.
    fn encode_update(patch: &Self::Update) -> Row;

    /// Base select for this table: projection and embed, no predicates.
    fn select() -> Select {
        let select = Select::table(Self::TABLE);
        match Self::embed() {
            Some(embed) => select.embed(embed),
            None => select,
        }
    }

    /// Full store query for a descriptor: filter, order, page range and exact count.
    fn build_select(descriptor: &Descriptor<Self>) -> Select
    where
        Self: Sized,
    {
        let (from, to) = descriptor.page.range();
        Self::apply_filter(Self::select(), &descriptor.filter)
            .order(descriptor.sort.field.column(), descriptor.sort.is_ascending())
            .range(from, to)
            .exact_count()
    }

    fn decode_all(rows: Vec<Row>) -> Result<Vec<Self::Entity>, PipelineError> {
        rows.into_iter().map(Self::decode).collect()
    }
}

pub(crate) fn decode_row<T: serde::de::DeserializeOwned>(
    entity: &'static str,
    row: Row,
) -> Result<T, PipelineError> {
    serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| PipelineError::Decode {
        entity,
        reason: e.to_string(),
    })
}

pub(crate) fn into_row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Row::new(),
    }
}
