// Linkflow storage managers
// Managers own the SQL: the link store is the only component that touches the links table.

pub mod link_store;
