//! PostgreSQL connection pooling and schema migrations.

mod pool;

pub use pool::{
    AsyncDbPool, MIGRATIONS, establish_async_connection_pool, pending_migrations, ping,
    revert_migrations, run_pending_migrations,
};
