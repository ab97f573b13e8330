use redb::TableDefinition;

/// Event log: (aggregate_type, aggregate_id, version) -> Event (msgpack)
pub const EVENTS: TableDefinition<(&str, &str, u64), &[u8]> = TableDefinition::new("events");

/// Latest version per aggregate: (aggregate_type, aggregate_id) -> version
pub const AGGREGATES: TableDefinition<(&str, &str), u64> = TableDefinition::new("aggregates");

/// Relation index: (aggregate_type, relation, key) -> Vec<aggregate_id> (msgpack)
pub const RELATIONS: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("relations");

/// Sorted and list index rows: (aggregate_type, index_name, sort_key) -> BTreeSet<aggregate_id>
/// (msgpack). List rows carry an empty value.
pub const SORT_INDEX: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("sort_index");

/// Reverse positions: (aggregate_type, index_name, aggregate_id) -> BTreeSet<sort_key> (msgpack)
pub const SORT_INDEX_POSITIONS: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("sort_index_positions");

/// Bookkeeping: key -> value
pub const META: TableDefinition<&str, &str> = TableDefinition::new("meta");
