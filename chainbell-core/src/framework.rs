use sqlx::PgPool;

/// Executes database queries expressed as `kanau` processors.
///
/// Every query is a plain struct with a `Processor<Query>` impl on this type,
/// see the `entities` module.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
