//! Declarative table definitions rendered to DDL.
//!
//! A [`Blueprint`] collects columns, indexes, keys and table options and
//! renders them for one [`Driver`]. [`Schema`] runs the rendered statements.
//!
//! ```rust,ignore
//! schema
//!     .create("posts", |table| {
//!         table.id();
//!         table.big_integer("user_id", false).unsigned().index();
//!         table.string("title", 255);
//!         table.string("slug", 255).unique();
//!         table.text("content").nullable();
//!         table.boolean("published").default(false);
//!         table.timestamps();
//!         table.foreign("user_id").references(["id"]).on("users").on_delete("CASCADE");
//!     })
//!     .await?;
//! ```

use std::sync::Arc;

use crate::{
    config::Driver,
    connection::Executor,
    error::{Error, Result},
    value::Value,
};

pub const DEFAULT_ENGINE: &str = "InnoDB";
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_COLLATION: &str = "utf8mb4_unicode_ci";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String(u32),
    Text,
    Integer,
    BigInteger,
    Boolean,
    Date,
    DateTime,
    TimestampTz,
    Decimal(u8, u8),
    Float,
    Json,
}

impl ColumnType {
    fn to_sql(self, driver: Driver, auto_increment: bool) -> String {
        match (self, driver) {
            (ColumnType::String(len), _) => format!("VARCHAR({len})"),
            (ColumnType::Text, _) => "TEXT".to_owned(),
            (ColumnType::Integer, Driver::Postgres) if auto_increment => "SERIAL".to_owned(),
            (ColumnType::Integer, _) => "INTEGER".to_owned(),
            (ColumnType::BigInteger, Driver::Postgres) if auto_increment => "BIGSERIAL".to_owned(),
            (ColumnType::BigInteger, _) => "BIGINT".to_owned(),
            (ColumnType::Boolean, _) => "BOOLEAN".to_owned(),
            (ColumnType::Date, _) => "DATE".to_owned(),
            (ColumnType::DateTime, _) => "TIMESTAMP".to_owned(),
            (ColumnType::TimestampTz, Driver::MySql) => "TIMESTAMP".to_owned(),
            (ColumnType::TimestampTz, Driver::Postgres) => "TIMESTAMPTZ".to_owned(),
            (ColumnType::Decimal(precision, scale), _) => format!("DECIMAL({precision},{scale})"),
            (ColumnType::Float, _) => "FLOAT".to_owned(),
            (ColumnType::Json, _) => "JSON".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ColumnDefault {
    Value(Value),
    Expression(String),
}

impl ColumnDefault {
    fn to_sql(&self) -> String {
        match self {
            ColumnDefault::Expression(expr) => expr.clone(),
            ColumnDefault::Value(value) => match value {
                Value::Null => "NULL".to_owned(),
                Value::Bool(v) => v.to_string(),
                Value::Int(v) => v.to_string(),
                Value::Float(v) => v.to_string(),
                Value::Decimal(v) => v.to_string(),
                Value::String(v) => quote_literal(v),
                Value::Bytes(v) => quote_literal(&String::from_utf8_lossy(v)),
                Value::DateTime(v) => quote_literal(&v.format("%Y-%m-%d %H:%M:%S").to_string()),
                Value::Date(v) => quote_literal(&v.format("%Y-%m-%d").to_string()),
                Value::Json(v) => quote_literal(&v.to_string()),
            },
        }
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// One column of a [`Blueprint`]. Modifiers return the column for chaining.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnType,
    auto_increment: bool,
    nullable: bool,
    default: Option<ColumnDefault>,
    unsigned: bool,
    unique: bool,
    index: bool,
    primary: bool,
    comment: Option<String>,
    after: Option<String>,
    first: bool,
}

impl Column {
    fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
            auto_increment: false,
            nullable: false,
            default: None,
            unsigned: false,
            unique: false,
            index: false,
            primary: false,
            comment: None,
            after: None,
            first: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// String values render single-quoted, everything else as a literal.
    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    /// Renders `expr` verbatim as the default.
    pub fn default_raw(&mut self, expr: impl Into<String>) -> &mut Self {
        self.default = Some(ColumnDefault::Expression(expr.into()));
        self
    }

    pub fn use_current(&mut self) -> &mut Self {
        self.default_raw("CURRENT_TIMESTAMP")
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn index(&mut self) -> &mut Self {
        self.index = true;
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }

    pub fn first(&mut self) -> &mut Self {
        self.first = true;
        self
    }

    /// Column definition as used in CREATE TABLE and ADD COLUMN.
    pub fn to_sql(&self, driver: Driver) -> String {
        let mut def = format!(
            "{} {}",
            driver.quote(&self.name),
            self.kind.to_sql(driver, self.auto_increment)
        );

        match (driver, self.auto_increment) {
            (Driver::MySql, true) => def.push_str(" UNSIGNED NOT NULL AUTO_INCREMENT"),
            (Driver::MySql, false) => {
                if self.unsigned {
                    def.push_str(" UNSIGNED");
                }
                def.push_str(if self.nullable { " NULL" } else { " NOT NULL" });
            }
            (Driver::Postgres, true) => def.push_str(" NOT NULL"),
            (Driver::Postgres, false) => {
                def.push_str(if self.nullable { " NULL" } else { " NOT NULL" });
            }
        }

        if let Some(default) = &self.default {
            def.push_str(" DEFAULT ");
            def.push_str(&default.to_sql());
        }

        if self.primary {
            def.push_str(" PRIMARY KEY");
        } else if self.unique {
            def.push_str(" UNIQUE");
        }

        if let (Driver::MySql, Some(comment)) = (driver, &self.comment) {
            def.push_str(" COMMENT ");
            def.push_str(&quote_literal(comment));
        }

        def
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: String,
    columns: Vec<String>,
    unique: bool,
}

impl Index {
    /// Overrides the generated `idx_`/`unq_` name.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    fn quoted_columns(&self, driver: Driver) -> String {
        quote_all(driver, &self.columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    name: String,
    columns: Vec<String>,
    references: Vec<String>,
    on: Option<String>,
    on_delete: Option<String>,
    on_update: Option<String>,
}

impl ForeignKey {
    pub fn references<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
        self.on = Some(table.into());
        self
    }

    /// Referential action, e.g. `CASCADE` or `SET NULL`.
    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_update = Some(action.into());
        self
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    fn to_sql(&self, driver: Driver) -> Result<String> {
        let Some(on) = &self.on else {
            return Err(Error::Builder(format!(
                "foreign key `{}` has no referenced table",
                self.name
            )));
        };

        let references = if self.references.is_empty() {
            vec!["id".to_owned()]
        } else {
            self.references.clone()
        };

        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            driver.quote(&self.name),
            quote_all(driver, &self.columns),
            driver.quote(on),
            quote_all(driver, &references)
        );

        if let Some(action) = &self.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action);
        }

        if let Some(action) = &self.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action);
        }

        Ok(sql)
    }
}

fn quote_all(driver: Driver, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| driver.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Create { if_not_exists: bool },
    Alter,
}

/// A table definition under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    action: Action,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    foreign_keys: Vec<ForeignKey>,
    primary: Vec<String>,
    drop_columns: Vec<String>,
    drop_indexes: Vec<String>,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    temporary: bool,
}

impl Blueprint {
    fn new(table: impl Into<String>, action: Action) -> Self {
        Self {
            table: table.into(),
            action,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            primary: Vec::new(),
            drop_columns: Vec::new(),
            drop_indexes: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
            temporary: false,
        }
    }

    /// A CREATE TABLE blueprint with the default engine, charset and collation.
    pub fn create(table: impl Into<String>) -> Self {
        let mut blueprint = Self::new(table, Action::Create { if_not_exists: false });
        blueprint.engine = Some(DEFAULT_ENGINE.to_owned());
        blueprint.charset = Some(DEFAULT_CHARSET.to_owned());
        blueprint.collation = Some(DEFAULT_COLLATION.to_owned());
        blueprint
    }

    pub fn create_if_not_exists(table: impl Into<String>) -> Self {
        let mut blueprint = Self::create(table);
        blueprint.action = Action::Create { if_not_exists: true };
        blueprint
    }

    /// An ALTER TABLE blueprint.
    pub fn alter(table: impl Into<String>) -> Self {
        Self::new(table, Action::Alter)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn add(&mut self, name: &str, kind: ColumnType) -> &mut Column {
        let index = self.columns.len();
        self.columns.push(Column::new(name, kind));
        &mut self.columns[index]
    }

    /// Auto-increment big integer `id` primary key.
    pub fn id(&mut self) -> &mut Column {
        self.primary(["id"]);
        self.big_integer("id", true)
    }

    pub fn string(&mut self, name: &str, length: u32) -> &mut Column {
        self.add(name, ColumnType::String(length))
    }

    pub fn text(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::Text)
    }

    pub fn integer(&mut self, name: &str, auto_increment: bool) -> &mut Column {
        let column = self.add(name, ColumnType::Integer);
        column.auto_increment = auto_increment;
        column
    }

    pub fn big_integer(&mut self, name: &str, auto_increment: bool) -> &mut Column {
        let column = self.add(name, ColumnType::BigInteger);
        column.auto_increment = auto_increment;
        column
    }

    pub fn boolean(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::Boolean)
    }

    pub fn date(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::DateTime)
    }

    pub fn timestamp_tz(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::TimestampTz)
    }

    pub fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> &mut Column {
        self.add(name, ColumnType::Decimal(precision, scale))
    }

    pub fn float(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::Float)
    }

    pub fn json(&mut self, name: &str) -> &mut Column {
        self.add(name, ColumnType::Json)
    }

    /// Nullable `created_at` and `updated_at`.
    pub fn timestamps(&mut self) {
        self.date_time("created_at").nullable();
        self.date_time("updated_at").nullable();
    }

    pub fn timestamps_tz(&mut self) {
        self.timestamp_tz("created_at").nullable();
        self.timestamp_tz("updated_at").nullable();
    }

    pub fn soft_deletes(&mut self) -> &mut Column {
        self.date_time("deleted_at").nullable()
    }

    pub fn primary<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary = columns.into_iter().map(Into::into).collect();
    }

    /// Adds an index named `idx_<table>_<columns>`.
    pub fn index<I, S>(&mut self, columns: I) -> &mut Index
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(columns.into_iter().map(Into::into).collect(), false)
    }

    /// Adds a unique index named `unq_<table>_<columns>`.
    pub fn unique<I, S>(&mut self, columns: I) -> &mut Index
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(columns.into_iter().map(Into::into).collect(), true)
    }

    fn push_index(&mut self, columns: Vec<String>, unique: bool) -> &mut Index {
        let at = self.indexes.len();
        self.indexes.push(Index {
            name: index_name(&self.table, &columns, unique),
            columns,
            unique,
        });
        &mut self.indexes[at]
    }

    /// Adds a foreign key named `fk_<table>_<column>`, referencing `id` unless
    /// told otherwise.
    pub fn foreign(&mut self, column: &str) -> &mut ForeignKey {
        let at = self.foreign_keys.len();
        self.foreign_keys.push(ForeignKey {
            name: format!("fk_{}_{}", self.table, column),
            columns: vec![column.to_owned()],
            references: Vec::new(),
            on: None,
            on_delete: None,
            on_update: None,
        });
        &mut self.foreign_keys[at]
    }

    pub fn drop_column(&mut self, column: &str) {
        self.drop_columns.push(column.to_owned());
    }

    pub fn drop_index(&mut self, name: &str) {
        self.drop_indexes.push(name.to_owned());
    }

    pub fn engine(&mut self, engine: &str) -> &mut Self {
        self.engine = Some(engine.to_owned());
        self
    }

    pub fn charset(&mut self, charset: &str) -> &mut Self {
        self.charset = Some(charset.to_owned());
        self
    }

    pub fn collation(&mut self, collation: &str) -> &mut Self {
        self.collation = Some(collation.to_owned());
        self
    }

    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    /// Declared indexes followed by those requested with [`Column::index`].
    fn all_indexes(&self) -> Vec<Index> {
        let mut indexes = self.indexes.clone();
        for column in self.columns.iter().filter(|c| c.index) {
            let columns = vec![column.name.clone()];
            indexes.push(Index {
                name: index_name(&self.table, &columns, false),
                columns,
                unique: false,
            });
        }

        indexes
    }

    /// Renders the statements for `driver`, in execution order.
    pub fn to_sql(&self, driver: Driver) -> Result<Vec<String>> {
        match self.action {
            Action::Create { if_not_exists } => self.create_sql(driver, if_not_exists),
            Action::Alter => self.alter_sql(driver),
        }
    }

    fn create_sql(&self, driver: Driver, if_not_exists: bool) -> Result<Vec<String>> {
        if self.columns.is_empty() {
            return Err(Error::Builder(format!(
                "table `{}` has no columns",
                self.table
            )));
        }

        let table = driver.quote(&self.table);
        let mut defs: Vec<String> = self.columns.iter().map(|c| c.to_sql(driver)).collect();
        let mut after = Vec::new();

        if !self.primary.is_empty() {
            defs.push(format!("PRIMARY KEY ({})", quote_all(driver, &self.primary)));
        }

        for index in self.all_indexes() {
            let name = driver.quote(&index.name);
            let columns = index.quoted_columns(driver);

            match (driver, index.unique) {
                (Driver::MySql, true) => defs.push(format!("UNIQUE INDEX {name} ({columns})")),
                (Driver::MySql, false) => defs.push(format!("INDEX {name} ({columns})")),
                (Driver::Postgres, true) => defs.push(format!("CONSTRAINT {name} UNIQUE ({columns})")),
                (Driver::Postgres, false) if if_not_exists => after.push(format!(
                    "CREATE INDEX IF NOT EXISTS {name} ON {table} ({columns})"
                )),
                (Driver::Postgres, false) => {
                    after.push(format!("CREATE INDEX {name} ON {table} ({columns})"))
                }
            }
        }

        for foreign in &self.foreign_keys {
            defs.push(foreign.to_sql(driver)?);
        }

        let mut sql = String::from("CREATE ");
        if self.temporary {
            sql.push_str("TEMPORARY ");
        }
        sql.push_str("TABLE ");
        if if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&format!("{table} ({})", defs.join(", ")));

        if driver == Driver::MySql {
            if let Some(engine) = &self.engine {
                sql.push_str(&format!(" ENGINE={engine}"));
            }
            if let Some(charset) = &self.charset {
                sql.push_str(&format!(" DEFAULT CHARSET={charset}"));
            }
            if let Some(collation) = &self.collation {
                sql.push_str(&format!(" COLLATE={collation}"));
            }
        }

        let mut statements = vec![sql];
        statements.extend(after);
        statements.extend(self.comment_sql(driver));

        Ok(statements)
    }

    fn alter_sql(&self, driver: Driver) -> Result<Vec<String>> {
        let table = driver.quote(&self.table);
        let mut alterations = Vec::new();
        let mut after = Vec::new();

        for column in &self.columns {
            let def = column.to_sql(driver);
            let alteration = match (driver, &column.after, column.first) {
                (Driver::MySql, Some(prev), _) => {
                    format!("ADD COLUMN {def} AFTER {}", driver.quote(prev))
                }
                (Driver::MySql, None, true) => format!("ADD COLUMN {def} FIRST"),
                _ => format!("ADD COLUMN {def}"),
            };
            alterations.push(alteration);
        }

        if !self.primary.is_empty() {
            alterations.push(format!("ADD PRIMARY KEY ({})", quote_all(driver, &self.primary)));
        }

        for index in self.all_indexes() {
            let name = driver.quote(&index.name);
            let columns = index.quoted_columns(driver);

            match (driver, index.unique) {
                (Driver::MySql, true) => alterations.push(format!("ADD UNIQUE INDEX {name} ({columns})")),
                (Driver::MySql, false) => alterations.push(format!("ADD INDEX {name} ({columns})")),
                (Driver::Postgres, true) => {
                    alterations.push(format!("ADD CONSTRAINT {name} UNIQUE ({columns})"))
                }
                (Driver::Postgres, false) => {
                    after.push(format!("CREATE INDEX {name} ON {table} ({columns})"))
                }
            }
        }

        for foreign in &self.foreign_keys {
            alterations.push(format!("ADD {}", foreign.to_sql(driver)?));
        }

        for column in &self.drop_columns {
            alterations.push(format!("DROP COLUMN {}", driver.quote(column)));
        }

        for name in &self.drop_indexes {
            match driver {
                Driver::MySql => alterations.push(format!("DROP INDEX {}", driver.quote(name))),
                Driver::Postgres => after.push(format!("DROP INDEX {}", driver.quote(name))),
            }
        }

        let mut statements = Vec::new();
        if !alterations.is_empty() {
            statements.push(format!("ALTER TABLE {table} {}", alterations.join(", ")));
        }
        statements.extend(after);
        statements.extend(self.comment_sql(driver));

        Ok(statements)
    }

    /// Postgres keeps column comments outside the column definition.
    fn comment_sql(&self, driver: Driver) -> Vec<String> {
        if driver != Driver::Postgres {
            return Vec::new();
        }

        self.columns
            .iter()
            .filter_map(|column| {
                let comment = column.comment.as_ref()?;
                Some(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    driver.quote(&self.table),
                    driver.quote(&column.name),
                    quote_literal(comment)
                ))
            })
            .collect()
    }
}

fn index_name(table: &str, columns: &[String], unique: bool) -> String {
    let prefix = if unique { "unq" } else { "idx" };
    format!("{prefix}_{table}_{}", columns.join("_"))
}

/// Runs blueprint DDL through an executor.
#[derive(Clone)]
pub struct Schema {
    executor: Arc<dyn Executor>,
}

impl Schema {
    pub fn new<E: Executor + 'static>(executor: E) -> Self {
        Self::from_arc(Arc::new(executor))
    }

    pub fn from_arc(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    pub fn driver(&self) -> Driver {
        self.executor.driver()
    }

    pub async fn create<F>(&self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::create(table);
        build(&mut blueprint);
        self.build(&blueprint).await
    }

    pub async fn create_if_not_exists<F>(&self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::create_if_not_exists(table);
        build(&mut blueprint);
        self.build(&blueprint).await
    }

    /// Alters an existing table.
    pub async fn table<F>(&self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::alter(table);
        build(&mut blueprint);
        self.build(&blueprint).await
    }

    /// Executes every statement the blueprint renders for this driver.
    pub async fn build(&self, blueprint: &Blueprint) -> Result<()> {
        for sql in blueprint.to_sql(self.driver())? {
            self.statement(&sql).await?;
        }

        Ok(())
    }

    pub async fn drop(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE {}", self.driver().quote(table));
        self.statement(&sql).await
    }

    pub async fn drop_if_exists(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", self.driver().quote(table));
        self.statement(&sql).await
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let driver = self.driver();
        let sql = format!(
            "ALTER TABLE {} RENAME TO {}",
            driver.quote(from),
            driver.quote(to)
        );
        self.statement(&sql).await
    }

    /// Runs a raw DDL statement.
    pub async fn statement(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql = %sql, "schema");
        self.executor.execute(sql, Vec::new()).await?;

        Ok(())
    }
}
