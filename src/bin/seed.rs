use axum_shop_api::{
    auth::hash_password,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    domain::{product::Category, user::Role},
    entity::{Products, Users, products, users},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use serde_json::json;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Shop Admin", "admin@example.com", "Admin@123", Role::Admin).await?;
    let user_id = ensure_user(&orm, "Sample User", "user@example.com", "User@1234", Role::User).await?;
    seed_products(&orm, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

/// Inserts the account or, when the email exists, resets its role.
async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        let id = existing.id;
        let mut active: users::ActiveModel = existing.into();
        active.role = Set(role.as_str().to_string());
        active.update(orm).await?;
        println!("Ensured user {email} (role={role})");
        return Ok(id);
    }

    let password_hash = hash_password(password)?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        age: Set(30),
        email: Set(email.to_string()),
        address: Set("1 Market Street".to_string()),
        contact: Set("9999999999".to_string()),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection, seller_id: Uuid) -> anyhow::Result<()> {
    let catalog = [
        ("Noise-cancelling Headphones", "Over-ear, 30 hour battery", 4999, 3999, Category::Electronics, 25),
        ("Denim Jacket", "Classic blue, unisex", 2499, 1999, Category::Fashion, 40),
        ("Greek Yogurt 500g", "Plain, high protein", 120, 99, Category::Dairy, 200),
        ("Mechanical Keyboard", "Hot-swappable, RGB", 6999, 5499, Category::Technology, 15),
        ("Air Fryer 4L", "Digital controls, 8 presets", 8999, 7499, Category::HomeAppliances, 10),
    ];

    for (name, description, cost_price, sale_price, category, stock) in catalog {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            seller_id: Set(seller_id),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            cost_price: Set(cost_price),
            sale_price: Set(sale_price),
            category: Set(category.as_str().to_string()),
            stock: Set(stock),
            images: Set(json!([])),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
