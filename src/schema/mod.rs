pub mod schema;
pub mod record;
pub mod live;
