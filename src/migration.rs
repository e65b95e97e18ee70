//! Bootstrap the relational schema from the table catalog: CREATE TABLE IF NOT EXISTS per table,
//! in dependency order, with unique and restricting foreign-key constraints.

use sqlx::PgPool;

use crate::error::AppError;
use crate::schema::{TableDef, ALL_TABLES};
use crate::sql::quoted;

/// DDL for one table.
pub fn create_table_sql(table: &TableDef) -> String {
    let mut col_defs: Vec<String> = vec![format!("{} SERIAL PRIMARY KEY", quoted(table.pk))];
    for c in table.columns {
        let mut def = format!("{} {}", quoted(c.name), c.pg_type.to_uppercase());
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(&d.sql());
        }
        if c.unique {
            def.push_str(" UNIQUE");
        }
        if let Some((target, column)) = c.references {
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE RESTRICT",
                quoted(target),
                quoted(column)
            ));
        }
        col_defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(table.name),
        col_defs.join(",\n  ")
    )
}

/// Apply the catalog to the database. Idempotent; existing tables are left untouched.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for table in ALL_TABLES {
        sqlx::query(&create_table_sql(table)).execute(pool).await?;
        tracing::debug!(table = table.name, "table ensured");
    }
    tracing::info!(tables = ALL_TABLES.len(), "schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SUBCATEGORIES, USERS};

    #[test]
    fn users_ddl_carries_constraints() {
        let ddl = create_table_sql(&USERS);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"usuarios\" (\n  \"idUsuario\" SERIAL PRIMARY KEY"));
        assert!(ddl.contains("\"email\" TEXT NOT NULL UNIQUE"));
        assert!(ddl.contains("\"permissoesDoUsuario\" TEXT NOT NULL DEFAULT '[]'"));
        assert!(ddl.contains("\"bloqueado\" BOOLEAN NOT NULL DEFAULT FALSE"));
    }

    #[test]
    fn subcategory_restricts_category_delete() {
        let ddl = create_table_sql(&SUBCATEGORIES);
        assert!(ddl.contains(
            "\"categoriaId\" INTEGER NOT NULL REFERENCES \"categoria\" (\"idCategoria\") ON DELETE RESTRICT"
        ));
    }
}
