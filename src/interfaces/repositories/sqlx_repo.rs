use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxBrandKitRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxHistoryRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxMediaRepo {
    pub pool: PgPool,
}
