//! Fluent SELECT/INSERT/UPDATE/DELETE assembly.
//!
//! A [`QueryBuilder`] accumulates clauses in any order and always renders them
//! in the fixed order SELECT, FROM, JOIN, WHERE, GROUP BY, HAVING, ORDER BY,
//! LIMIT, OFFSET, UNION. Binds come back in placeholder order: WHERE binds,
//! then HAVING binds, then the binds of each union.
//!
//! ```rust,ignore
//! let (sql, binds) = QueryBuilder::table("users")
//!     .and_where("age", ">", 18)
//!     .or_where("vip", "=", true)
//!     .to_sql();
//!
//! assert_eq!(sql, "SELECT * FROM users WHERE age > ? OR vip = ?");
//! ```

use crate::{
    connection::Executor,
    entity::{materialize_row, materialize_rows, Entity},
    error::{Error, Result},
    value::{Row, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    /// Normalizes a direction string, defaulting to ascending.
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Order::Desc
        } else {
            Order::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    sql: String,
    binds: Vec<Value>,
    or: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    table: String,
    columns: Vec<String>,
    distinct: bool,
    wheres: Vec<Predicate>,
    joins: Vec<String>,
    group_by: Vec<String>,
    havings: Vec<Predicate>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    unions: Vec<(String, Vec<Value>)>,
}

impl QueryBuilder {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec!["*".to_owned()],
            distinct: false,
            wheres: Vec::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            havings: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            unions: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Replaces the projection. An empty list keeps the current one.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            self.columns = columns;
        }

        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn and_where(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.push_where(format!("{column} {operator} ?"), vec![value.into()], false)
    }

    /// OR-joined predicate; behaves as [`and_where`](Self::and_where) when no
    /// predicate exists yet.
    pub fn or_where(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        let or = !self.wheres.is_empty();
        self.push_where(format!("{column} {operator} ?"), vec![value.into()], or)
    }

    pub fn where_raw(self, sql: impl Into<String>, binds: Vec<Value>) -> Self {
        self.push_where(sql.into(), binds, false)
    }

    /// An empty value set matches no rows.
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let binds: Vec<Value> = values.into_iter().map(Into::into).collect();
        if binds.is_empty() {
            return self.push_where("1=0".to_owned(), Vec::new(), false);
        }

        let sql = format!("{column} IN ({})", placeholders(binds.len()));
        self.push_where(sql, binds, false)
    }

    /// An empty value set adds no predicate.
    pub fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let binds: Vec<Value> = values.into_iter().map(Into::into).collect();
        if binds.is_empty() {
            return self;
        }

        let sql = format!("{column} NOT IN ({})", placeholders(binds.len()));
        self.push_where(sql, binds, false)
    }

    pub fn where_null(self, column: &str) -> Self {
        self.push_where(format!("{column} IS NULL"), Vec::new(), false)
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(format!("{column} IS NOT NULL"), Vec::new(), false)
    }

    fn push_where(mut self, sql: String, binds: Vec<Value>, or: bool) -> Self {
        self.wheres.push(Predicate { sql, binds, or });
        self
    }

    pub fn join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.push_join("JOIN", table, first, operator, second)
    }

    pub fn left_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.push_join("LEFT JOIN", table, first, operator, second)
    }

    pub fn right_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.push_join("RIGHT JOIN", table, first, operator, second)
    }

    fn push_join(mut self, kind: &str, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.joins
            .push(format!("{kind} {table} ON {first} {operator} {second}"));
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn having(mut self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.havings.push(Predicate {
            sql: format!("{column} {operator} ?"),
            binds: vec![value.into()],
            or: false,
        });
        self
    }

    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.order_by
            .push(format!("{column} {}", Order::parse(direction).as_str()));
        self
    }

    /// Negative values are ignored; zero clears the limit.
    pub fn limit(mut self, limit: i64) -> Self {
        if let Ok(limit) = u64::try_from(limit) {
            self.limit = (limit > 0).then_some(limit);
        }

        self
    }

    /// Negative values are ignored; zero clears the offset.
    pub fn offset(mut self, offset: i64) -> Self {
        if let Ok(offset) = u64::try_from(offset) {
            self.offset = (offset > 0).then_some(offset);
        }

        self
    }

    pub fn union(mut self, other: QueryBuilder) -> Self {
        let (sql, binds) = other.to_sql();
        self.unions.push((format!("UNION ({sql})"), binds));
        self
    }

    pub fn union_all(mut self, other: QueryBuilder) -> Self {
        let (sql, binds) = other.to_sql();
        self.unions.push((format!("UNION ALL ({sql})"), binds));
        self
    }

    /// Renders the SELECT statement and its binds.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut binds = Vec::new();

        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        sql.push_str(&self.columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.joins.join(" "));
        }

        self.render_where(&mut sql, &mut binds);

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.havings.is_empty() {
            let havings: Vec<&str> = self.havings.iter().map(|p| p.sql.as_str()).collect();
            sql.push_str(" HAVING ");
            sql.push_str(&havings.join(" AND "));
            binds.extend(self.havings.iter().flat_map(|p| p.binds.iter().cloned()));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        for (union, union_binds) in &self.unions {
            sql.push(' ');
            sql.push_str(union);
            binds.extend(union_binds.iter().cloned());
        }

        (sql, binds)
    }

    fn render_where(&self, sql: &mut String, binds: &mut Vec<Value>) {
        for (i, predicate) in self.wheres.iter().enumerate() {
            let glue = match (i, predicate.or) {
                (0, _) => " WHERE ",
                (_, true) => " OR ",
                (_, false) => " AND ",
            };

            sql.push_str(glue);
            sql.push_str(&predicate.sql);
            binds.extend(predicate.binds.iter().cloned());
        }
    }

    /// The COUNT statement: same table, joins and predicates, no ordering.
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let mut count = QueryBuilder::table(self.table.clone()).select(["COUNT(*) as count"]);
        count.joins = self.joins.clone();
        count.wheres = self.wheres.clone();
        count.to_sql()
    }

    pub fn to_insert_sql(&self, values: Vec<(&str, Value)>) -> Result<(String, Vec<Value>)> {
        if values.is_empty() {
            return Err(Error::Builder(format!(
                "no values provided for insert into `{}`",
                self.table
            )));
        }

        let (columns, binds): (Vec<&str>, Vec<Value>) = values.into_iter().unzip();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders(columns.len())
        );

        Ok((sql, binds))
    }

    pub fn to_update_sql(&self, values: Vec<(&str, Value)>) -> Result<(String, Vec<Value>)> {
        if values.is_empty() {
            return Err(Error::Builder(format!(
                "no values provided for update of `{}`",
                self.table
            )));
        }

        let mut sets = Vec::with_capacity(values.len());
        let mut binds = Vec::with_capacity(values.len());
        for (column, value) in values {
            sets.push(format!("{column} = ?"));
            binds.push(value);
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, sets.join(", "));
        self.render_where(&mut sql, &mut binds);

        Ok((sql, binds))
    }

    pub fn to_delete_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut binds = Vec::new();
        self.render_where(&mut sql, &mut binds);

        (sql, binds)
    }

    pub async fn fetch_rows<E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<Row>> {
        let (sql, binds) = self.to_sql();
        executor.fetch_all(&sql, binds).await
    }

    pub async fn get<T: Entity, E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<T>> {
        let rows = self.fetch_rows(executor).await?;
        let mut entities = Vec::with_capacity(rows.len());
        materialize_rows(rows, &mut entities)?;

        Ok(entities)
    }

    /// Runs the query with `LIMIT 1`.
    pub async fn first<T: Entity, E: Executor + ?Sized>(&self, executor: &E) -> Result<Option<T>> {
        let (sql, binds) = self.clone().limit(1).to_sql();

        match executor.fetch_optional(&sql, binds).await? {
            Some(row) => Ok(Some(materialize_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn count<E: Executor + ?Sized>(&self, executor: &E) -> Result<i64> {
        let (sql, binds) = self.to_count_sql();
        let row = executor.fetch_optional(&sql, binds).await?;

        match row {
            Some(row) => Ok(row.try_get::<Option<i64>>("count")?.unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Inserts one row and returns the affected row count.
    pub async fn insert<E: Executor + ?Sized>(
        &self,
        executor: &E,
        values: Vec<(&str, Value)>,
    ) -> Result<u64> {
        let (sql, binds) = self.to_insert_sql(values)?;
        executor.execute(&sql, binds).await
    }

    /// Inserts one row and returns the identifier the store assigned to `id_column`.
    pub async fn insert_get_id<E: Executor + ?Sized>(
        &self,
        executor: &E,
        values: Vec<(&str, Value)>,
        id_column: &str,
    ) -> Result<Option<i64>> {
        let (sql, binds) = self.to_insert_sql(values)?;
        executor.insert(&sql, binds, id_column).await
    }

    pub async fn update<E: Executor + ?Sized>(
        &self,
        executor: &E,
        values: Vec<(&str, Value)>,
    ) -> Result<u64> {
        let (sql, binds) = self.to_update_sql(values)?;
        executor.execute(&sql, binds).await
    }

    pub async fn delete<E: Executor + ?Sized>(&self, executor: &E) -> Result<u64> {
        let (sql, binds) = self.to_delete_sql();
        executor.execute(&sql, binds).await
    }
}

fn placeholders(len: usize) -> String {
    vec!["?"; len].join(", ")
}
