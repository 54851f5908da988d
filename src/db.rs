use std::time::Duration;

use anyhow::Result;
use sea_orm::sea_query::{Expr, Index, SimpleExpr};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    SqlxPostgresConnector,
};
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::entity::{
    AuditLogs, CartItems, Carts, Categories, ContactMessages, Coupons, MessageReplies, OrderItems,
    Orders, Pages, Products, UserProfiles, Users, Wishlists, cart_items, coupons, order_items, orders,
    products, wishlists,
};

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Create a Postgres pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the SQL migrations embedded from `migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Wrap an existing sqlx pool in a SeaORM connection.
pub fn create_orm_conn(pool: DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool)
}

/// Open a SeaORM connection directly from a URL (used for SQLite).
pub async fn connect(database_url: &str, max_connections: u32) -> Result<OrmConn> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Connect according to the configured URL and make sure the schema exists.
///
/// Postgres goes through the sqlx migrations; SQLite databases get their
/// tables generated from the entity definitions.
pub async fn init(config: &AppConfig) -> Result<OrmConn> {
    if config.is_sqlite() {
        let conn = connect(&config.database_url, 1).await?;
        create_schema(&conn).await?;
        tracing::info!("sqlite schema ready");
        return Ok(conn);
    }

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;
    tracing::info!("postgres migrations applied");
    Ok(create_orm_conn(pool))
}

/// Create every table from its entity, parents before children.
pub async fn create_schema(conn: &OrmConn) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    create_table(conn, &schema, Users, []).await?;
    create_table(conn, &schema, UserProfiles, []).await?;
    create_table(conn, &schema, Categories, []).await?;
    create_table(
        conn,
        &schema,
        Products,
        [
            Expr::col(products::Column::Price).gte(0),
            Expr::col(products::Column::Stock).gte(0),
        ],
    )
    .await?;
    create_table(conn, &schema, Carts, []).await?;
    create_table(
        conn,
        &schema,
        CartItems,
        [Expr::col(cart_items::Column::Quantity).gt(0)],
    )
    .await?;
    create_table(
        conn,
        &schema,
        Orders,
        [Expr::col(orders::Column::TotalAmount).gte(0)],
    )
    .await?;
    create_table(
        conn,
        &schema,
        OrderItems,
        [
            Expr::col(order_items::Column::Quantity).gt(0),
            Expr::col(order_items::Column::Price).gte(0),
        ],
    )
    .await?;
    create_table(conn, &schema, Wishlists, []).await?;
    create_table(
        conn,
        &schema,
        Coupons,
        [Expr::col(coupons::Column::DiscountBasisPoints).between(1, 10_000)],
    )
    .await?;
    create_table(conn, &schema, ContactMessages, []).await?;
    create_table(conn, &schema, MessageReplies, []).await?;
    create_table(conn, &schema, Pages, []).await?;
    create_table(conn, &schema, AuditLogs, []).await?;

    // (cart, product) and (user, product) pairs are unique.
    let cart_line = Index::create()
        .if_not_exists()
        .name("uq_cart_items_cart_product")
        .table(CartItems)
        .col(cart_items::Column::CartId)
        .col(cart_items::Column::ProductId)
        .unique()
        .to_owned();
    conn.execute(backend.build(&cart_line)).await?;

    let wishlist_pair = Index::create()
        .if_not_exists()
        .name("uq_wishlists_user_product")
        .table(Wishlists)
        .col(wishlists::Column::UserId)
        .col(wishlists::Column::ProductId)
        .unique()
        .to_owned();
    conn.execute(backend.build(&wishlist_pair)).await?;

    Ok(())
}

/// Same CHECK constraints as the SQL migration.
async fn create_table<E: EntityTrait, const N: usize>(
    conn: &OrmConn,
    schema: &Schema,
    entity: E,
    checks: [SimpleExpr; N],
) -> Result<()> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    for check in checks {
        stmt.check(check);
    }
    conn.execute(conn.get_database_backend().build(&stmt)).await?;
    Ok(())
}
