//! PostgreSQL persistence for studyplan: connection config, pooling,
//! embedded migrations, and the append-only `history` table.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
