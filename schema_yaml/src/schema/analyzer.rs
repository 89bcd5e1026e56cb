//! Database schema analyzer
//!
//! This module introspects a live database into the schema model so it can be
//! compared against a declared schema.

use async_trait::async_trait;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{FromRow, MySql, Pool, Postgres, Row, Sqlite};
use tracing::{debug, info};

use crate::db::connection::{Connection, DatabaseConnection};
use crate::error::{Error, Result};
use crate::schema::options::{OptionValue, Options};
use crate::schema::types::{Schema, Table};

/// `base(size[, scale]) [unsigned]` as found in native type declarations
static TYPE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([a-z][a-z0-9_ ]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*(unsigned)?(?:\s+zerofill)?\s*$")
        .expect("type declaration pattern is valid")
});

/// Trailing PostgreSQL type cast, e.g. `'abc'::character varying`
static TYPE_CAST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(.*)::[a-z_ "]+(?:\[\])?$"#).expect("type cast pattern is valid"));

/// Schema analyzer trait
#[async_trait]
trait Analyzer {
    /// Introspect every base table, ordered by name
    async fn analyze_tables(&self) -> Result<Vec<Table>>;
}

/// Schema analyzer for database schema introspection
pub struct SchemaAnalyzer {
    connection: Connection,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Analyze the current database schema
    pub async fn analyze(&self) -> Result<Schema> {
        let schema_name = self.connection.schema();
        let tables = match self.connection.pool() {
            DatabaseConnection::Postgres(pool) => {
                PostgresAnalyzer {
                    pool,
                    schema: schema_name.unwrap_or("public"),
                }
                .analyze_tables()
                .await?
            }
            DatabaseConnection::MySql(pool) => {
                MySqlAnalyzer {
                    pool,
                    schema: schema_name,
                }
                .analyze_tables()
                .await?
            }
            DatabaseConnection::Sqlite(pool) => SqliteAnalyzer { pool }.analyze_tables().await?,
        };

        let mut schema = Schema::default();
        for table in tables {
            schema.add_table(table)?;
        }

        info!(tables = schema.tables().count(), "Introspected database schema");
        Ok(schema)
    }
}

/// A native column type split into its parts
#[derive(Debug, Clone, PartialEq, Default)]
struct NativeType {
    base: String,
    size: Option<u32>,
    scale: Option<u32>,
    unsigned: bool,
}

impl NativeType {
    /// Parse a declaration such as `varchar(64)`, `NUMERIC(19, 4)` or `int(10) unsigned`
    fn parse(declaration: &str) -> Self {
        let lowered = declaration.to_lowercase();
        match TYPE_DECLARATION.captures(&lowered) {
            Some(captures) => Self {
                base: captures[1].trim().to_string(),
                size: captures.get(2).and_then(|m| m.as_str().parse().ok()),
                scale: captures.get(3).and_then(|m| m.as_str().parse().ok()),
                unsigned: captures.get(4).is_some(),
            },
            None => Self {
                base: lowered.trim().to_string(),
                ..Self::default()
            },
        }
    }
}

/// Column data gathered from the catalog, before mapping to the model
#[derive(Debug, Default)]
struct NativeColumn {
    name: String,
    native: NativeType,
    nullable: bool,
    default: Option<String>,
    autoincrement: bool,
    comment: Option<String>,
}

/// Map a native type back to the logical type and its attributes
fn logical_options(native: &NativeType) -> Result<(&'static str, Options)> {
    let mut options = Options::new();
    let size = native.size.map(OptionValue::from);

    let type_name = match native.base.as_str() {
        "tinyint" if native.size == Some(1) => "boolean",
        "smallint" | "int2" | "smallserial" | "tinyint" => "smallint",
        "integer" | "int" | "int4" | "mediumint" | "serial" => "integer",
        "bigint" | "int8" | "bigserial" => "bigint",
        "boolean" | "bool" => "boolean",
        "varchar" | "character varying" | "nvarchar" | "varying character" => {
            options.extend(size.map(|size| ("length".to_string(), size)));
            "string"
        }
        "char" | "character" | "bpchar" | "nchar" => {
            options.extend(size.map(|size| ("length".to_string(), size)));
            options.insert("fixed".to_string(), true.into());
            "string"
        }
        "text" | "tinytext" | "mediumtext" | "longtext" | "clob" => "text",
        "numeric" | "decimal" => {
            options.extend(size.map(|size| ("precision".to_string(), size)));
            options.extend(native.scale.map(|scale| ("scale".to_string(), scale.into())));
            "decimal"
        }
        "real" | "float" | "double" | "double precision" | "float4" | "float8" => "float",
        "date" => "date",
        "time" | "time without time zone" => "time",
        "datetime" | "timestamp" | "timestamp without time zone" => "datetime",
        "timestamptz" | "timestamp with time zone" => "datetimetz",
        "json" | "jsonb" => "json",
        "blob" | "bytea" | "tinyblob" | "mediumblob" | "longblob" => "blob",
        "varbinary" => {
            options.extend(size.map(|size| ("length".to_string(), size)));
            "binary"
        }
        "binary" => {
            options.extend(size.map(|size| ("length".to_string(), size)));
            options.insert("fixed".to_string(), true.into());
            "binary"
        }
        "uuid" => "guid",
        other => {
            return Err(Error::SchemaAnalysisError(format!(
                "Unknown database type \"{}\" requested",
                other
            )))
        }
    };

    if native.unsigned {
        options.insert("unsigned".to_string(), true.into());
    }
    Ok((type_name, options))
}

/// Reduce a catalog default expression to its literal value
fn normalize_default(raw: &str) -> Option<OptionValue> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();

    if lowered == "null" {
        return None;
    }
    if lowered.starts_with("current_timestamp") || lowered == "now()" {
        return Some("CURRENT_TIMESTAMP".into());
    }
    if lowered.starts_with("current_date") {
        return Some("CURRENT_DATE".into());
    }
    if lowered.starts_with("current_time") {
        return Some("CURRENT_TIME".into());
    }
    if let Some(captures) = TYPE_CAST.captures(trimmed) {
        return normalize_default(&captures[1]);
    }
    if trimmed.len() >= 2 && trimmed.starts_with('(') && trimmed.ends_with(')') {
        return normalize_default(&trimmed[1..trimmed.len() - 1]);
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return Some(trimmed[1..trimmed.len() - 1].replace("''", "'").into());
    }
    Some(trimmed.into())
}

/// Add an introspected column to the table
fn add_native_column(table: &mut Table, column: NativeColumn) -> Result<()> {
    let (type_name, options) = logical_options(&column.native)?;
    let added = table.add_column(&column.name, type_name, options)?;
    added
        .set_notnull(!column.nullable)
        .set_autoincrement(column.autoincrement);
    if !column.autoincrement {
        added.set_default(column.default.as_deref().and_then(normalize_default));
    }
    added.comment = column.comment.filter(|comment| !comment.is_empty());
    Ok(())
}

/// Referential action option for a foreign key, skipping the implicit `NO ACTION`
fn referential_action(options: &mut Options, key: &str, action: &str) {
    let action = action.to_uppercase();
    if action != "NO ACTION" {
        options.insert(key.to_string(), action.into());
    }
}

/// Index columns grouped by index name, in catalog order
#[derive(Debug, Default)]
struct IndexEntry {
    columns: Vec<String>,
    lengths: Vec<Option<u32>>,
    is_unique: bool,
    is_primary: bool,
    flags: Vec<String>,
}

fn add_indexes(table: &mut Table, indexes: IndexMap<String, IndexEntry>) -> Result<()> {
    for (name, entry) in indexes {
        if entry.is_primary {
            table.set_primary_key(&entry.columns)?;
            continue;
        }

        let mut options = Options::new();
        if entry.lengths.iter().any(Option::is_some) {
            options.insert("lengths".to_string(), entry.lengths.into());
        }
        if entry.is_unique {
            table.add_unique_index(&entry.columns, Some(&name), entry.flags, options)?;
        } else {
            table.add_index(&entry.columns, Some(&name), entry.flags, options)?;
        }
    }
    Ok(())
}

/// Foreign key columns grouped by constraint name, in catalog order
#[derive(Debug, Default)]
struct ForeignKeyEntry {
    local_columns: Vec<String>,
    foreign_table: String,
    foreign_columns: Vec<String>,
    options: Options,
}

fn add_foreign_keys(table: &mut Table, foreign_keys: IndexMap<String, ForeignKeyEntry>) -> Result<()> {
    for (name, entry) in foreign_keys {
        table.add_foreign_key_constraint(
            &entry.local_columns,
            &entry.foreign_table,
            &entry.foreign_columns,
            entry.options,
            Some(&name),
        )?;
    }
    Ok(())
}

// Row types for PostgreSQL queries
#[derive(FromRow)]
struct TableRow {
    table_name: String,
}

#[derive(FromRow)]
struct PgColumnRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
    is_identity: String,
    character_maximum_length: Option<i64>,
    numeric_precision: Option<i64>,
    numeric_scale: Option<i64>,
    comment: Option<String>,
}

#[derive(FromRow)]
struct PgIndexRow {
    index_name: String,
    column_name: String,
    is_unique: bool,
    is_primary: bool,
}

#[derive(FromRow)]
struct PgForeignKeyRow {
    constraint_name: String,
    column_name: String,
    ref_table: String,
    ref_column: String,
    delete_rule: String,
    update_rule: String,
    is_deferrable: bool,
    is_deferred: bool,
}

/// PostgreSQL schema analyzer
struct PostgresAnalyzer<'a> {
    pool: &'a Pool<Postgres>,
    schema: &'a str,
}

impl PostgresAnalyzer<'_> {
    /// Map a `pg_constraint` action code to its SQL name
    fn action_name(code: &str) -> &'static str {
        match code {
            "r" => "RESTRICT",
            "c" => "CASCADE",
            "n" => "SET NULL",
            "d" => "SET DEFAULT",
            _ => "NO ACTION",
        }
    }

    async fn analyze_table(&self, table_name: &str) -> Result<Table> {
        let mut table = Table::new(table_name);

        let sql = r#"
            SELECT
                c.column_name::text AS column_name,
                c.data_type::text AS data_type,
                c.is_nullable::text AS is_nullable,
                c.column_default::text AS column_default,
                c.is_identity::text AS is_identity,
                c.character_maximum_length::bigint AS character_maximum_length,
                c.numeric_precision::bigint AS numeric_precision,
                c.numeric_scale::bigint AS numeric_scale,
                col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, c.ordinal_position::int) AS comment
            FROM information_schema.columns c
            WHERE c.table_schema = $1 AND c.table_name = $2
            ORDER BY c.ordinal_position
        "#;

        let column_rows = sqlx::query_as::<_, PgColumnRow>(sql)
            .bind(self.schema)
            .bind(table_name)
            .fetch_all(self.pool)
            .await?;

        for row in column_rows {
            let size = row.character_maximum_length.or(row.numeric_precision);
            let scale = row.numeric_scale.filter(|_| row.data_type == "numeric");
            let autoincrement = row.is_identity == "YES"
                || row
                    .column_default
                    .as_deref()
                    .is_some_and(|default| default.starts_with("nextval("));

            add_native_column(
                &mut table,
                NativeColumn {
                    name: row.column_name,
                    native: NativeType {
                        base: row.data_type,
                        size: if row.character_maximum_length.is_some() || scale.is_some() {
                            size.and_then(|size| u32::try_from(size).ok())
                        } else {
                            None
                        },
                        scale: scale.and_then(|scale| u32::try_from(scale).ok()),
                        unsigned: false,
                    },
                    nullable: row.is_nullable == "YES",
                    default: row.column_default,
                    autoincrement,
                    comment: row.comment,
                },
            )?;
        }

        let sql = r#"
            SELECT
                i.relname::text AS index_name,
                a.attname::text AS column_name,
                ix.indisunique AS is_unique,
                ix.indisprimary AS is_primary
            FROM pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
            WHERE t.relname = $1 AND n.nspname = $2
            ORDER BY i.relname, array_position(ix.indkey::int2[], a.attnum)
        "#;

        let index_rows = sqlx::query_as::<_, PgIndexRow>(sql)
            .bind(table_name)
            .bind(self.schema)
            .fetch_all(self.pool)
            .await?;

        let mut indexes: IndexMap<String, IndexEntry> = IndexMap::new();
        for row in index_rows {
            let entry = indexes.entry(row.index_name).or_default();
            entry.columns.push(row.column_name);
            entry.lengths.push(None);
            entry.is_unique = row.is_unique;
            entry.is_primary = row.is_primary;
        }
        add_indexes(&mut table, indexes)?;

        let sql = r#"
            SELECT
                con.conname::text AS constraint_name,
                la.attname::text AS column_name,
                ft.relname::text AS ref_table,
                fa.attname::text AS ref_column,
                con.confdeltype::text AS delete_rule,
                con.confupdtype::text AS update_rule,
                con.condeferrable AS is_deferrable,
                con.condeferred AS is_deferred
            FROM pg_constraint con
            JOIN pg_class t ON t.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_class ft ON ft.oid = con.confrelid
            CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(local_attnum, foreign_attnum, position)
            JOIN pg_attribute la ON la.attrelid = con.conrelid AND la.attnum = k.local_attnum
            JOIN pg_attribute fa ON fa.attrelid = con.confrelid AND fa.attnum = k.foreign_attnum
            WHERE con.contype = 'f' AND t.relname = $1 AND n.nspname = $2
            ORDER BY con.conname, k.position
        "#;

        let fk_rows = sqlx::query_as::<_, PgForeignKeyRow>(sql)
            .bind(table_name)
            .bind(self.schema)
            .fetch_all(self.pool)
            .await?;

        let mut foreign_keys: IndexMap<String, ForeignKeyEntry> = IndexMap::new();
        for row in fk_rows {
            let entry = foreign_keys.entry(row.constraint_name).or_insert_with(|| {
                let mut options = Options::new();
                referential_action(&mut options, "onDelete", Self::action_name(&row.delete_rule));
                referential_action(&mut options, "onUpdate", Self::action_name(&row.update_rule));
                if row.is_deferrable {
                    options.insert("deferrable".to_string(), true.into());
                    options.insert("deferred".to_string(), row.is_deferred.into());
                }
                ForeignKeyEntry {
                    foreign_table: row.ref_table,
                    options,
                    ..ForeignKeyEntry::default()
                }
            });
            entry.local_columns.push(row.column_name);
            entry.foreign_columns.push(row.ref_column);
        }
        add_foreign_keys(&mut table, foreign_keys)?;

        Ok(table)
    }
}

#[async_trait]
impl Analyzer for PostgresAnalyzer<'_> {
    async fn analyze_tables(&self) -> Result<Vec<Table>> {
        let sql = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let table_rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(self.schema)
            .fetch_all(self.pool)
            .await?;

        let mut tables = Vec::with_capacity(table_rows.len());
        for row in table_rows {
            debug!(table = %row.table_name, "Introspecting table");
            tables.push(self.analyze_table(&row.table_name).await?);
        }
        Ok(tables)
    }
}

// Row types for MySQL queries
#[derive(FromRow)]
struct MySqlColumnRow {
    column_name: String,
    column_type: String,
    is_nullable: String,
    column_default: Option<String>,
    extra: String,
    column_comment: String,
}

#[derive(FromRow)]
struct MySqlIndexRow {
    index_name: String,
    column_name: String,
    non_unique: i64,
    sub_part: Option<i64>,
    index_type: String,
}

#[derive(FromRow)]
struct MySqlForeignKeyRow {
    constraint_name: String,
    column_name: String,
    ref_table: String,
    ref_column: String,
    delete_rule: String,
    update_rule: String,
}

/// MySQL schema analyzer
struct MySqlAnalyzer<'a> {
    pool: &'a Pool<MySql>,
    schema: Option<&'a str>,
}

impl MySqlAnalyzer<'_> {
    /// Configured schema, or the database selected by the connection
    async fn schema_name(&self) -> Result<String> {
        if let Some(schema) = self.schema {
            return Ok(schema.to_string());
        }

        let row = sqlx::query("SELECT CAST(DATABASE() AS CHAR) AS name")
            .fetch_one(self.pool)
            .await?;
        let name: Option<String> = row.try_get("name")?;
        name.ok_or_else(|| {
            Error::SchemaAnalysisError("No database selected on the MySQL connection".to_string())
        })
    }

    async fn analyze_table(&self, schema: &str, table_name: &str) -> Result<Table> {
        let mut table = Table::new(table_name);

        let sql = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(COLUMN_TYPE AS CHAR) AS column_type,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
                CAST(EXTRA AS CHAR) AS extra,
                CAST(COLUMN_COMMENT AS CHAR) AS column_comment
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let column_rows = sqlx::query_as::<_, MySqlColumnRow>(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(self.pool)
            .await?;

        for row in column_rows {
            add_native_column(
                &mut table,
                NativeColumn {
                    name: row.column_name,
                    native: NativeType::parse(&row.column_type),
                    nullable: row.is_nullable == "YES",
                    default: row.column_default,
                    autoincrement: row.extra.to_lowercase().contains("auto_increment"),
                    comment: Some(row.column_comment),
                },
            )?;
        }

        let sql = r#"
            SELECT
                CAST(INDEX_NAME AS CHAR) AS index_name,
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(NON_UNIQUE AS SIGNED) AS non_unique,
                CAST(SUB_PART AS SIGNED) AS sub_part,
                CAST(INDEX_TYPE AS CHAR) AS index_type
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
        "#;

        let index_rows = sqlx::query_as::<_, MySqlIndexRow>(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(self.pool)
            .await?;

        let mut indexes: IndexMap<String, IndexEntry> = IndexMap::new();
        for row in index_rows {
            let is_primary = row.index_name == "PRIMARY";
            let entry = indexes.entry(row.index_name).or_default();
            entry.columns.push(row.column_name);
            entry.lengths.push(row.sub_part.and_then(|part| u32::try_from(part).ok()));
            entry.is_unique = row.non_unique == 0;
            entry.is_primary = is_primary;
            let index_type = row.index_type.to_lowercase();
            if matches!(index_type.as_str(), "fulltext" | "spatial") && entry.flags.is_empty() {
                entry.flags.push(index_type);
            }
        }
        add_indexes(&mut table, indexes)?;

        let sql = r#"
            SELECT
                CAST(kcu.CONSTRAINT_NAME AS CHAR) AS constraint_name,
                CAST(kcu.COLUMN_NAME AS CHAR) AS column_name,
                CAST(kcu.REFERENCED_TABLE_NAME AS CHAR) AS ref_table,
                CAST(kcu.REFERENCED_COLUMN_NAME AS CHAR) AS ref_column,
                CAST(rc.DELETE_RULE AS CHAR) AS delete_rule,
                CAST(rc.UPDATE_RULE AS CHAR) AS update_rule
            FROM information_schema.KEY_COLUMN_USAGE kcu
            JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
                ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
                AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
            WHERE kcu.TABLE_SCHEMA = ? AND kcu.TABLE_NAME = ?
                AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
        "#;

        let fk_rows = sqlx::query_as::<_, MySqlForeignKeyRow>(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(self.pool)
            .await?;

        let mut foreign_keys: IndexMap<String, ForeignKeyEntry> = IndexMap::new();
        for row in fk_rows {
            let entry = foreign_keys.entry(row.constraint_name).or_insert_with(|| {
                let mut options = Options::new();
                referential_action(&mut options, "onDelete", &row.delete_rule);
                referential_action(&mut options, "onUpdate", &row.update_rule);
                ForeignKeyEntry {
                    foreign_table: row.ref_table,
                    options,
                    ..ForeignKeyEntry::default()
                }
            });
            entry.local_columns.push(row.column_name);
            entry.foreign_columns.push(row.ref_column);
        }
        add_foreign_keys(&mut table, foreign_keys)?;

        Ok(table)
    }
}

#[async_trait]
impl Analyzer for MySqlAnalyzer<'_> {
    async fn analyze_tables(&self) -> Result<Vec<Table>> {
        let schema = self.schema_name().await?;

        let sql = r#"
            SELECT CAST(TABLE_NAME AS CHAR) AS table_name
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let table_rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(&schema)
            .fetch_all(self.pool)
            .await?;

        let mut tables = Vec::with_capacity(table_rows.len());
        for row in table_rows {
            debug!(table = %row.table_name, "Introspecting table");
            tables.push(self.analyze_table(&schema, &row.table_name).await?);
        }
        Ok(tables)
    }
}

/// SQLite schema analyzer
struct SqliteAnalyzer<'a> {
    pool: &'a Pool<Sqlite>,
}

impl SqliteAnalyzer<'_> {
    async fn analyze_table(&self, table_name: &str, create_sql: &str) -> Result<Table> {
        let mut table = Table::new(table_name);
        let quoted = table_name.replace('"', "\"\"");

        let pragma = format!("PRAGMA table_info(\"{}\")", quoted);
        let column_rows = sqlx::query(&pragma).fetch_all(self.pool).await?;

        let mut primary_key: Vec<(i64, String)> = Vec::new();
        for row in &column_rows {
            let pk: i64 = row.try_get("pk")?;
            if pk > 0 {
                primary_key.push((pk, row.try_get("name")?));
            }
        }
        primary_key.sort_by_key(|(position, _)| *position);
        let autoincrement_table = create_sql.to_uppercase().contains("AUTOINCREMENT");

        for row in column_rows {
            let name: String = row.try_get("name")?;
            let data_type: String = row.try_get("type")?;
            let notnull: i64 = row.try_get("notnull")?;
            let default: Option<String> = row.try_get("dflt_value")?;
            let is_sole_pk = primary_key.len() == 1 && primary_key[0].1 == name;

            add_native_column(
                &mut table,
                NativeColumn {
                    name,
                    native: NativeType::parse(&data_type),
                    // A rowid alias is NOT NULL without declaring it
                    nullable: notnull == 0 && !is_sole_pk,
                    default,
                    autoincrement: is_sole_pk && autoincrement_table,
                    comment: None,
                },
            )?;
        }

        if !primary_key.is_empty() {
            let columns: Vec<String> = primary_key.into_iter().map(|(_, name)| name).collect();
            table.set_primary_key(&columns)?;
        }

        let pragma = format!("PRAGMA index_list(\"{}\")", quoted);
        let index_rows = sqlx::query(&pragma).fetch_all(self.pool).await?;

        let mut indexes: IndexMap<String, IndexEntry> = IndexMap::new();
        for row in index_rows {
            let name: String = row.try_get("name")?;
            let unique: i64 = row.try_get("unique")?;
            let origin: String = row.try_get("origin")?;
            if origin == "pk" {
                continue;
            }

            let pragma = format!("PRAGMA index_info(\"{}\")", name.replace('"', "\"\""));
            let mut columns: Vec<(i64, String)> = Vec::new();
            for column in sqlx::query(&pragma).fetch_all(self.pool).await? {
                columns.push((column.try_get("seqno")?, column.try_get("name")?));
            }
            columns.sort_by_key(|(position, _)| *position);

            let entry = indexes.entry(name).or_default();
            for (_, column) in columns {
                entry.columns.push(column);
                entry.lengths.push(None);
            }
            entry.is_unique = unique != 0;
        }
        // PRAGMA index_list lists the most recent index first
        indexes.reverse();
        add_indexes(&mut table, indexes)?;

        let pragma = format!("PRAGMA foreign_key_list(\"{}\")", quoted);
        let fk_rows = sqlx::query(&pragma).fetch_all(self.pool).await?;

        let mut foreign_keys: IndexMap<i64, ForeignKeyEntry> = IndexMap::new();
        for row in fk_rows {
            let id: i64 = row.try_get("id")?;
            let foreign_table: String = row.try_get("table")?;
            let on_delete: String = row.try_get("on_delete")?;
            let on_update: String = row.try_get("on_update")?;

            let entry = foreign_keys.entry(id).or_insert_with(|| {
                let mut options = Options::new();
                referential_action(&mut options, "onDelete", &on_delete);
                referential_action(&mut options, "onUpdate", &on_update);
                ForeignKeyEntry {
                    foreign_table,
                    options,
                    ..ForeignKeyEntry::default()
                }
            });
            entry.local_columns.push(row.try_get("from")?);
            entry.foreign_columns.push(row.try_get("to")?);
        }
        // SQLite does not keep constraint names; the model generates them
        foreign_keys.sort_keys();
        for entry in foreign_keys.into_values() {
            table.add_foreign_key_constraint(
                &entry.local_columns,
                &entry.foreign_table,
                &entry.foreign_columns,
                entry.options,
                None,
            )?;
        }

        Ok(table)
    }
}

#[async_trait]
impl Analyzer for SqliteAnalyzer<'_> {
    async fn analyze_tables(&self) -> Result<Vec<Table>> {
        let sql = r#"
            SELECT name, sql
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        "#;
        let rows = sqlx::query(sql).fetch_all(self.pool).await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let create_sql: Option<String> = row.try_get("sql")?;
            debug!(table = %name, "Introspecting table");
            tables.push(
                self.analyze_table(&name, create_sql.as_deref().unwrap_or_default())
                    .await?,
            );
        }
        Ok(tables)
    }
}
