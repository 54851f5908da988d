use chrono::{Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::products::{
        CategoryList, CreateCategoryRequest, CreateProductRequest, HomeView, ProductDetail,
        ProductList, StoreStats, UpdateCategoryRequest, UpdateProductRequest,
    },
    entity::{
        Categories, Orders, Products, Users, Wishlists,
        categories::{ActiveModel as CategoryActive, Column as CatCol, Model as CategoryModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Model as ProductModel},
        wishlists::Column as WishCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSort, SHOP_PER_PAGE},
    state::AppState,
};

const FEATURED_LIMIT: u64 = 8;
const HOME_CATEGORIES: u64 = 6;
const RELATED_LIMIT: u64 = 4;
const NEW_ARRIVAL_DAYS: i64 = 7;

pub async fn find_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn stock_of<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<i32> {
    Ok(find_product(conn, id).await?.stock)
}

/// Atomically takes `quantity` units out of stock.
///
/// The check and the write are one conditional `UPDATE`, so two callers
/// racing for the last unit cannot both succeed.
pub async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
        .col_expr(ProdCol::UpdatedAt, Expr::value(now))
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let exists = Products::find_by_id(product_id).one(conn).await?.is_some();
        if !exists {
            return Err(AppError::NotFound);
        }
        tracing::warn!(%product_id, quantity, "stock decrement rejected");
        return Err(AppError::InsufficientStock { product_id });
    }

    Ok(())
}

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Categories::find().order_by_asc(CatCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = find_category(&state.orm, id).await?;
    Ok(ApiResponse::success("Category", category.into(), None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category added successfully!",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_category(&state.orm, id).await?;

    let mut active: CategoryActive = existing.clone().into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    let category = if active.is_changed() {
        active.update(&state.orm).await?
    } else {
        existing
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated successfully!",
        category.into(),
        Some(Meta::empty()),
    ))
}

/// Products of the category go with it (FK cascade).
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Category deleted successfully!"))
}

/// Shop listing: in-stock products only.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize_with(SHOP_PER_PAGE);
    let mut condition = Condition::all().add(ProdCol::Stock.gt(0));

    if let Some(category_id) = query.category {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(ProdCol::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(ProdCol::Description))).like(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }

    let finder = Products::find().filter(condition);
    let finder = match query.sort.unwrap_or_default() {
        ProductSort::Name => finder.order_by_asc(ProdCol::Name),
        ProductSort::PriceLow => finder.order_by_asc(ProdCol::Price),
        ProductSort::PriceHigh => finder.order_by_desc(ProdCol::Price),
        ProductSort::Newest => finder.order_by_desc(ProdCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// Back-office listing, out-of-stock products included.
pub async fn list_all_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find().order_by_desc(ProdCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn home(state: &AppState) -> AppResult<ApiResponse<HomeView>> {
    let featured_products = Products::find()
        .filter(ProdCol::Stock.gt(0))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(FEATURED_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    let categories = Categories::find()
        .order_by_asc(CatCol::Name)
        .limit(HOME_CATEGORIES)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let stats = StoreStats {
        total_products: Products::find().count(&state.orm).await?,
        total_orders: Orders::find().count(&state.orm).await?,
        total_users: Users::find().count(&state.orm).await?,
        total_categories: Categories::find().count(&state.orm).await?,
    };

    Ok(ApiResponse::success(
        "Home",
        HomeView {
            featured_products,
            categories,
            stats,
        },
        None,
    ))
}

/// A signed-in viewer also learns whether the product is on their wishlist.
pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    let (product, category) = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let category = category.ok_or(AppError::NotFound)?;

    let related = Products::find()
        .filter(ProdCol::CategoryId.eq(product.category_id))
        .filter(ProdCol::Id.ne(product.id))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(RELATED_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let is_new = product.created_at >= Utc::now() - Duration::days(NEW_ARRIVAL_DAYS);

    let wishlist_item_id = match viewer {
        Some(viewer) => Wishlists::find()
            .filter(WishCol::UserId.eq(viewer.user_id))
            .filter(WishCol::ProductId.eq(product.id))
            .one(&state.orm)
            .await?
            .map(|item| item.id),
        None => None,
    };

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product.into(),
            category: category.into(),
            related,
            is_new,
            in_wishlist: wishlist_item_id.is_some(),
            wishlist_item_id,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    ensure_category_exists(state, payload.category_id).await?;

    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image_url: Set(payload.image_url),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added successfully!",
        product.into(),
        Some(Meta::empty()),
    ))
}

/// Price edits never touch placed orders: order items carry their own price.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_product(&state.orm, id).await?;

    let mut active: ProductActive = existing.into();
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully!",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Product deleted successfully!"))
}

async fn find_category<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<CategoryModel> {
    Categories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn ensure_category_exists(state: &AppState, id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::Validation("category does not exist".into()));
    }
    Ok(())
}
