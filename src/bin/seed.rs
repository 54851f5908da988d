use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use storefront::{
    config::AppConfig,
    db,
    entity::{
        Categories, Pages, Products, Users, categories, pages, products,
        sea_orm_active_enums::Role,
        user_profiles, users,
    },
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = db::init(&config).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", "Shop", Role::Admin).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", "Casey", Role::Customer).await?;
    seed_catalog(&orm).await?;
    seed_pages(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    first_name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password)?;
    let txn = orm.begin().await?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.to_owned()),
        last_name: Set(String::new()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;
    user_profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        role: Set(role),
        phone: Set(String::new()),
        address: Set(String::new()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_catalog(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = [
        (
            "Apparel",
            "Clothing for every season",
            vec![
                ("Linen Shirt", "Breathable summer shirt", 4_500_i64, 40),
                ("Wool Scarf", "Soft merino scarf", 2_900, 25),
            ],
        ),
        (
            "Home",
            "Things for the house",
            vec![
                ("Ceramic Mug", "Stoneware mug, 350 ml", 1_200, 100),
                ("Scented Candle", "Cedar and amber", 1_800, 60),
            ],
        ),
    ];

    for (category_name, category_description, items) in catalog {
        let category = match Categories::find()
            .filter(categories::Column::Name.eq(category_name))
            .one(orm)
            .await?
        {
            Some(existing) => existing,
            None => {
                categories::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(category_name.to_owned()),
                    description: Set(category_description.to_owned()),
                    image_url: Set(None),
                    created_at: Set(Utc::now().into()),
                }
                .insert(orm)
                .await?
            }
        };

        for (name, description, price, stock) in items {
            let exists = Products::find()
                .filter(products::Column::Name.eq(name))
                .one(orm)
                .await?
                .is_some();
            if exists {
                continue;
            }
            let now = Utc::now();
            products::ActiveModel {
                id: Set(Uuid::new_v4()),
                category_id: Set(category.id),
                name: Set(name.to_owned()),
                description: Set(description.to_owned()),
                price: Set(price),
                stock: Set(stock),
                image_url: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(orm)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_pages(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let entries = [
        ("About Us", "about-us", "We sell well-made things for everyday life."),
        ("Shipping", "shipping", "Orders are paid cash on delivery and ship within 3 days."),
    ];

    for (title, slug, content) in entries {
        let exists = Pages::find()
            .filter(pages::Column::Slug.eq(slug))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        pages::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_owned()),
            slug: Set(slug.to_owned()),
            content: Set(content.to_owned()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
        println!("Page {slug} created");
    }
    Ok(())
}
