//! Catalog service: categories and products.
//!
//! All mutation operations are admin-only; the dispatcher enforces the
//! role check before any of these are reached, so the functions here
//! only document the precondition.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::error::{AppError, AppResult};
use crate::core::validation::slugify;

/// A catalog category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub title: String,
}

/// A catalog product. Price is in the smallest currency unit.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub price: i64,
    pub category_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A single editable product field, used by the admin edit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Title,
    Description,
    Image,
    Price,
}

impl ProductField {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductField::Title => "title",
            ProductField::Description => "description",
            ProductField::Image => "image",
            ProductField::Price => "price",
        }
    }

    pub fn parse(value: &str) -> Option<ProductField> {
        match value {
            "title" => Some(ProductField::Title),
            "description" => Some(ProductField::Description),
            "image" => Some(ProductField::Image),
            "price" => Some(ProductField::Price),
            _ => None,
        }
    }
}

fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        price: row.get(4)?,
        category_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const PRODUCT_COLUMNS: &str = "id, title, description, image, price, category_id, created_at";

/// Lists all categories ordered by title.
pub fn list_categories(conn: &Connection) -> AppResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, title FROM categories ORDER BY title")?;
    let rows = stmt.query_map([], |row| {
        Ok(Category {
            id: row.get(0)?,
            title: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Fetches a category, failing with `NotFound` when absent.
pub fn get_category(conn: &Connection, id: &str) -> AppResult<Category> {
    conn.query_row(
        "SELECT id, title FROM categories WHERE id = ?1",
        params![id],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Category".to_string()))
}

/// Creates a category with a slug id derived from the title.
/// Precondition: admin role.
pub fn create_category(conn: &Connection, title: &str) -> AppResult<Category> {
    let id = slugify(title);
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO categories (id, title) VALUES (?1, ?2)",
        params![id, title],
    )?;
    if inserted == 0 {
        return Err(AppError::Validation(format!(
            "A category '{}' already exists.",
            id
        )));
    }
    Ok(Category {
        id,
        title: title.to_string(),
    })
}

/// Renames a category. Precondition: admin role.
pub fn rename_category(conn: &Connection, id: &str, title: &str) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE categories SET title = ?1 WHERE id = ?2",
        params![title, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("Category".to_string()));
    }
    Ok(())
}

/// Deletes a category. Precondition: admin role.
///
/// Policy: deletion is rejected while products still reference the
/// category; the admin must move or delete those products first.
pub fn delete_category(conn: &Connection, id: &str) -> AppResult<()> {
    let product_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE category_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if product_count > 0 {
        return Err(AppError::Validation(format!(
            "Category still has {} product(s). Move or delete them first.",
            product_count
        )));
    }

    let deleted = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(AppError::NotFound("Category".to_string()));
    }
    Ok(())
}

/// Lists products, optionally restricted to one category, ordered by title.
pub fn list_products(conn: &Connection, category_id: Option<&str>) -> AppResult<Vec<Product>> {
    let mut result = Vec::new();
    match category_id {
        Some(cat) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM products WHERE category_id = ?1 ORDER BY title",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![cat], row_to_product)?;
            for row in rows {
                result.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!("SELECT {} FROM products ORDER BY title", PRODUCT_COLUMNS))?;
            let rows = stmt.query_map([], row_to_product)?;
            for row in rows {
                result.push(row?);
            }
        }
    }
    Ok(result)
}

/// Fetches a product, failing with `NotFound` when absent.
pub fn get_product(conn: &Connection, id: &str) -> AppResult<Product> {
    conn.query_row(
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
        params![id],
        row_to_product,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Creates a product. Precondition: admin role.
///
/// The id is a slug of the title; a numeric suffix resolves collisions so
/// two admins adding "Thai" twice do not clobber each other.
pub fn create_product(
    conn: &Connection,
    title: &str,
    description: &str,
    image: Option<&str>,
    price: i64,
    category_id: &str,
) -> AppResult<Product> {
    // Verify the category exists up front for a clearer reply than an FK error
    get_category(conn, category_id)?;

    let base = slugify(title);
    let mut id = base.clone();
    let mut suffix = 2;
    loop {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO products (id, title, description, image, price, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, title, description, image, price, category_id],
        )?;
        if inserted == 1 {
            break;
        }
        id = format!("{}_{}", base, suffix);
        suffix += 1;
    }

    get_product(conn, &id)
}

/// Updates one field of a product. Precondition: admin role.
///
/// The caller validates and converts the raw input (price to cents, image
/// to an URL or NULL) before reaching this point.
pub fn update_product_field(conn: &Connection, id: &str, field: ProductField, value: &ProductValue) -> AppResult<()> {
    let changed = match (field, value) {
        (ProductField::Title, ProductValue::Text(text)) => {
            conn.execute("UPDATE products SET title = ?1 WHERE id = ?2", params![text, id])?
        }
        (ProductField::Description, ProductValue::Text(text)) => conn.execute(
            "UPDATE products SET description = ?1 WHERE id = ?2",
            params![text, id],
        )?,
        (ProductField::Image, ProductValue::OptionalText(image)) => conn.execute(
            "UPDATE products SET image = ?1 WHERE id = ?2",
            params![image, id],
        )?,
        (ProductField::Price, ProductValue::Amount(cents)) => conn.execute(
            "UPDATE products SET price = ?1 WHERE id = ?2",
            params![cents, id],
        )?,
        _ => {
            return Err(AppError::Validation(format!(
                "Field '{}' does not accept that value.",
                field.as_str()
            )))
        }
    };

    if changed == 0 {
        return Err(AppError::NotFound("Product".to_string()));
    }
    Ok(())
}

/// A converted value for `update_product_field`.
#[derive(Debug, Clone)]
pub enum ProductValue {
    Text(String),
    OptionalText(Option<String>),
    Amount(i64),
}

/// Deletes a product. Precondition: admin role.
///
/// Cart lines referencing it are cascade-deleted; order item snapshots
/// are untouched by design.
pub fn delete_product(conn: &Connection, id: &str) -> AppResult<()> {
    let deleted = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(AppError::NotFound("Product".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::init_schema;

    fn test_conn() -> Connection {
        #[allow(clippy::unwrap_used)]
        let conn = Connection::open_in_memory().unwrap();
        #[allow(clippy::unwrap_used)]
        {
            conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
            init_schema(&conn).unwrap();
        }
        conn
    }

    #[test]
    fn product_ids_get_suffixed_on_collision() {
        let conn = test_conn();
        create_category(&conn, "Premium").ok();
        let first = create_product(&conn, "Thai", "a", None, 100, "premium").map(|p| p.id);
        let second = create_product(&conn, "Thai", "b", None, 200, "premium").map(|p| p.id);
        assert_eq!(first.ok(), Some("thai".to_string()));
        assert_eq!(second.ok(), Some("thai_2".to_string()));
    }

    #[test]
    fn category_deletion_rejected_while_products_reference_it() {
        let conn = test_conn();
        create_category(&conn, "Premium").ok();
        create_product(&conn, "Thai", "", None, 100, "premium").ok();

        assert!(matches!(
            delete_category(&conn, "premium"),
            Err(AppError::Validation(_))
        ));

        delete_product(&conn, "thai").ok();
        assert!(delete_category(&conn, "premium").is_ok());
    }

    #[test]
    fn creating_product_in_missing_category_is_not_found() {
        let conn = test_conn();
        assert!(matches!(
            create_product(&conn, "Thai", "", None, 100, "ghost"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_category_is_a_validation_error() {
        let conn = test_conn();
        assert!(create_category(&conn, "Bulk Deals").is_ok());
        assert!(matches!(
            create_category(&conn, "Bulk  Deals!"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn field_updates_apply_and_check_existence() {
        let conn = test_conn();
        create_category(&conn, "Premium").ok();
        create_product(&conn, "Thai", "old", None, 100, "premium").ok();

        update_product_field(&conn, "thai", ProductField::Price, &ProductValue::Amount(420)).ok();
        assert_eq!(get_product(&conn, "thai").map(|p| p.price).ok(), Some(420));

        assert!(matches!(
            update_product_field(&conn, "ghost", ProductField::Price, &ProductValue::Amount(1)),
            Err(AppError::NotFound(_))
        ));
    }
}
