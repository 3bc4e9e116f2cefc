//! Neutral SQL formatter
//!
//! Default rendering shared by every dialect. Methods suffixed `_with` take
//! the calling dialect so that nested names and fields are rendered through
//! its overrides.

use cqlbridge_core::error::Result;
use cqlbridge_core::{
    CqlError, DeleteQuery, Expr, InsertQuery, QueryEntity, QueryExpression, QueryField,
    SelectQuery, UpdateQuery,
};
use serde_json::Value;
use std::sync::Arc;

use crate::traits::{Dialect, FieldFormat, FieldFormatter, NameEscaper, SelectFormatter};
use crate::validator::{DefaultNameValidator, NameValidator};

/// Options of the neutral formatter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFormatterOptions {
    /// Identifier template; `$1` is replaced by the identifier
    pub name_format: String,

    /// Alias every selected column with its own name
    pub force_alias: bool,
}

impl Default for SqlFormatterOptions {
    fn default() -> Self {
        Self {
            name_format: "\"$1\"".to_string(),
            force_alias: false,
        }
    }
}

/// Neutral dialect formatter
pub struct SqlFormatter {
    options: SqlFormatterOptions,
    validator: Arc<dyn NameValidator>,
}

impl SqlFormatter {
    /// Create a formatter with default options
    pub fn new() -> Self {
        Self::with_options(SqlFormatterOptions::default())
    }

    pub fn with_options(options: SqlFormatterOptions) -> Self {
        Self {
            options,
            validator: Arc::new(DefaultNameValidator),
        }
    }

    /// Replace the name validator
    pub fn with_validator(mut self, validator: Arc<dyn NameValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn options(&self) -> &SqlFormatterOptions {
        &self.options
    }

    /// Validate and quote a possibly qualified name, segment by segment
    pub fn quote_name(&self, name: &str) -> Result<String> {
        if name == "*" {
            return Ok(name.to_string());
        }
        if !self.validator.test(name, true) {
            return Err(CqlError::Configuration(format!(
                "Invalid database object name '{}'",
                name
            )));
        }
        Ok(name
            .split('.')
            .map(|segment| self.options.name_format.replace("$1", segment))
            .collect::<Vec<_>>()
            .join("."))
    }

    /// Render a literal value
    pub fn escape(&self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
            Value::Array(items) => {
                let items: Result<Vec<String>> = items.iter().map(|v| self.escape(v)).collect();
                Ok(format!("({})", items?.join(", ")))
            }
            Value::Object(_) => {
                let json = serde_json::to_string(value)?;
                Ok(format!("'{}'", json.replace('\'', "''")))
            }
        }
    }

    /// Render an expression
    pub fn format_expr_with(&self, dialect: &dyn Dialect, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Name(name) => dialect.escape_name(&name.name),
            Expr::Literal(value) => self.escape(value),
            Expr::Param => Ok("?".to_string()),
            Expr::Compare { op, left, right } => Ok(format!(
                "{} {} {}",
                self.format_expr_with(dialect, left)?,
                op.as_str(),
                self.format_expr_with(dialect, right)?
            )),
            Expr::And(items) => Ok(format!("({})", self.format_logical(dialect, items, "AND")?)),
            Expr::Or(items) => Ok(format!("({})", self.format_logical(dialect, items, "OR")?)),
            Expr::In { expr, values } => {
                if values.is_empty() {
                    return Err(CqlError::Render(
                        "IN expression requires at least one value".to_string(),
                    ));
                }
                let values: Result<Vec<String>> = values
                    .iter()
                    .map(|v| self.format_expr_with(dialect, v))
                    .collect();
                Ok(format!(
                    "{} IN ({})",
                    self.format_expr_with(dialect, expr)?,
                    values?.join(", ")
                ))
            }
            Expr::Call { name, args } => {
                if !self.validator.test(name, false) {
                    return Err(CqlError::Render(format!("Invalid function name '{}'", name)));
                }
                let args: Result<Vec<String>> = args
                    .iter()
                    .map(|a| self.format_expr_with(dialect, a))
                    .collect();
                Ok(format!("{}({})", name, args?.join(", ")))
            }
        }
    }

    fn format_logical(&self, dialect: &dyn Dialect, items: &[Expr], op: &str) -> Result<String> {
        if items.is_empty() {
            return Err(CqlError::Render(format!("{} expression has no operands", op)));
        }
        let items: Result<Vec<String>> = items
            .iter()
            .map(|e| self.format_expr_with(dialect, e))
            .collect();
        Ok(items?.join(&format!(" {} ", op)))
    }

    /// Render a WHERE clause body; a top-level conjunction needs no parentheses
    pub fn format_where_with(&self, dialect: &dyn Dialect, filter: &Expr) -> Result<String> {
        match filter {
            Expr::And(items) => self.format_logical(dialect, items, "AND"),
            Expr::Or(items) => self.format_logical(dialect, items, "OR"),
            other => self.format_expr_with(dialect, other),
        }
    }

    /// Render a field, with its alias in select lists
    pub fn format_field_with(
        &self,
        dialect: &dyn Dialect,
        field: &QueryField,
        format: FieldFormat,
    ) -> Result<String> {
        let expr = self.format_expr_with(dialect, &field.expr)?;
        if format == FieldFormat::Reference {
            return Ok(expr);
        }
        match (&field.alias, &field.expr) {
            (Some(alias), _) => Ok(format!("{} AS {}", expr, dialect.escape_name(alias)?)),
            (None, Expr::Name(name)) if self.options.force_alias && name.name != "*" => Ok(
                format!("{} AS {}", expr, dialect.escape_name(name.member())?),
            ),
            _ => Ok(expr),
        }
    }

    fn format_entity_with(&self, dialect: &dyn Dialect, entity: &QueryEntity) -> Result<String> {
        let name = dialect.escape_name(&entity.name)?;
        match &entity.alias {
            Some(alias) => Ok(format!("{} AS {}", name, dialect.escape_name(alias)?)),
            None => Ok(name),
        }
    }

    pub fn format_select_with(&self, dialect: &dyn Dialect, select: &SelectQuery) -> Result<String> {
        let fields = if select.fields.is_empty() {
            "*".to_string()
        } else {
            select
                .fields
                .iter()
                .map(|f| dialect.format_field_ex(f, FieldFormat::Select))
                .collect::<Result<Vec<_>>>()?
                .join(", ")
        };

        let mut sql = format!(
            "SELECT {} FROM {}",
            fields,
            self.format_entity_with(dialect, &select.entity)?
        );

        if let Some(filter) = &select.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.format_where_with(dialect, filter)?);
        }

        if !select.order_by.is_empty() {
            let orders = select
                .order_by
                .iter()
                .map(|order| -> Result<String> {
                    let field = QueryField::new(order.expr.clone());
                    let expr = dialect.format_field_ex(&field, FieldFormat::Reference)?;
                    Ok(format!("{} {}", expr, if order.descending { "DESC" } else { "ASC" }))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = select.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(sql)
    }

    pub fn format_insert_with(&self, dialect: &dyn Dialect, insert: &InsertQuery) -> Result<String> {
        if insert.values.is_empty() {
            return Err(CqlError::Render(format!(
                "Insert into '{}' has no values",
                insert.entity.name
            )));
        }
        let mut columns = Vec::with_capacity(insert.values.len());
        let mut values = Vec::with_capacity(insert.values.len());
        for (column, expr) in &insert.values {
            columns.push(dialect.escape_name(column)?);
            values.push(self.format_expr_with(dialect, expr)?);
        }
        Ok(format!(
            "INSERT INTO {}({}) VALUES ({})",
            dialect.escape_name(&insert.entity.name)?,
            columns.join(", "),
            values.join(", ")
        ))
    }

    pub fn format_update_with(&self, dialect: &dyn Dialect, update: &UpdateQuery) -> Result<String> {
        if update.set.is_empty() {
            return Err(CqlError::Render(format!(
                "Update of '{}' has no assignments",
                update.entity.name
            )));
        }
        let assignments = update
            .set
            .iter()
            .map(|(column, expr)| -> Result<String> {
                Ok(format!(
                    "{} = {}",
                    dialect.escape_name(column)?,
                    self.format_expr_with(dialect, expr)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sql = format!(
            "UPDATE {} SET {}",
            dialect.escape_name(&update.entity.name)?,
            assignments.join(", ")
        );
        if let Some(filter) = &update.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.format_where_with(dialect, filter)?);
        }
        Ok(sql)
    }

    pub fn format_delete_with(&self, dialect: &dyn Dialect, delete: &DeleteQuery) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", dialect.escape_name(&delete.entity.name)?);
        if let Some(filter) = &delete.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.format_where_with(dialect, filter)?);
        }
        Ok(sql)
    }

    /// Render any query expression
    pub fn format_with(&self, dialect: &dyn Dialect, query: &QueryExpression) -> Result<String> {
        match query {
            QueryExpression::Select(select) => dialect.format_select(select),
            QueryExpression::Insert(insert) => self.format_insert_with(dialect, insert),
            QueryExpression::Update(update) => self.format_update_with(dialect, update),
            QueryExpression::Delete(delete) => self.format_delete_with(dialect, delete),
        }
    }
}

impl Default for SqlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl NameEscaper for SqlFormatter {
    fn escape_name(&self, name: &str) -> Result<String> {
        self.quote_name(name)
    }
}

impl FieldFormatter for SqlFormatter {
    fn format_field_ex(&self, field: &QueryField, format: FieldFormat) -> Result<String> {
        self.format_field_with(self, field, format)
    }
}

impl SelectFormatter for SqlFormatter {
    fn format_select(&self, select: &SelectQuery) -> Result<String> {
        self.format_select_with(self, select)
    }
}

impl Dialect for SqlFormatter {
    fn base(&self) -> &SqlFormatter {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqlbridge_core::{CompareOp, OrderBy};
    use serde_json::json;

    #[test]
    fn test_quote_name() {
        let formatter = SqlFormatter::new();
        assert_eq!(formatter.quote_name("Products").unwrap(), "\"Products\"");
        assert_eq!(formatter.quote_name("dbo.Products").unwrap(), "\"dbo\".\"Products\"");
        assert_eq!(formatter.quote_name("*").unwrap(), "*");
        assert!(formatter.quote_name("bad name").is_err());
    }

    #[test]
    fn test_escape_literals() {
        let formatter = SqlFormatter::new();
        assert_eq!(formatter.escape(&json!(null)).unwrap(), "NULL");
        assert_eq!(formatter.escape(&json!(true)).unwrap(), "true");
        assert_eq!(formatter.escape(&json!(12.5)).unwrap(), "12.5");
        assert_eq!(formatter.escape(&json!("O'Neil")).unwrap(), "'O''Neil'");
        assert_eq!(formatter.escape(&json!([1, "a"])).unwrap(), "(1, 'a')");
    }

    #[test]
    fn test_format_select_neutral() {
        let formatter = SqlFormatter::new();
        let query = SelectQuery::select_from(QueryEntity::new("Products").with_alias("p"))
            .select([QueryField::name("p.id"), QueryField::name("name").with_alias("title")])
            .filter(Expr::And(vec![
                Expr::eq(Expr::name("p.id"), Expr::param()),
                Expr::compare(CompareOp::Gt, Expr::name("price"), Expr::literal(10)),
            ]))
            .order_by(OrderBy::desc(Expr::name("name")))
            .take(5);

        assert_eq!(
            formatter.format(&query.into()).unwrap(),
            "SELECT \"p\".\"id\", \"name\" AS \"title\" FROM \"Products\" AS \"p\" \
             WHERE \"p\".\"id\" = ? AND \"price\" > 10 ORDER BY \"name\" DESC LIMIT 5"
        );
    }

    #[test]
    fn test_format_select_all_columns() {
        let formatter = SqlFormatter::new();
        let query = SelectQuery::select_from(QueryEntity::new("Products"));
        assert_eq!(formatter.format(&query.into()).unwrap(), "SELECT * FROM \"Products\"");
    }

    #[test]
    fn test_force_alias() {
        let formatter = SqlFormatter::with_options(SqlFormatterOptions {
            force_alias: true,
            ..Default::default()
        });
        let field = QueryField::name("Products.id");
        assert_eq!(
            formatter.format_field_ex(&field, FieldFormat::Select).unwrap(),
            "\"Products\".\"id\" AS \"id\""
        );
        assert_eq!(
            formatter.format_field_ex(&field, FieldFormat::Reference).unwrap(),
            "\"Products\".\"id\""
        );
    }

    #[test]
    fn test_nested_logical_expressions() {
        let formatter = SqlFormatter::new();
        let filter = Expr::Or(vec![
            Expr::eq(Expr::name("a"), Expr::literal(1)),
            Expr::And(vec![
                Expr::eq(Expr::name("b"), Expr::literal(2)),
                Expr::is_in(Expr::name("c"), vec![Expr::literal("x"), Expr::literal("y")]),
            ]),
        ]);
        assert_eq!(
            formatter.format_where_with(&formatter, &filter).unwrap(),
            "\"a\" = 1 OR (\"b\" = 2 AND \"c\" IN ('x', 'y'))"
        );
    }

    #[test]
    fn test_format_call() {
        let formatter = SqlFormatter::new();
        let query = SelectQuery::select_from(QueryEntity::new("Products"))
            .select([QueryField::new(Expr::call("count", vec![Expr::name("*")])).with_alias("total")]);
        assert_eq!(
            formatter.format(&query.into()).unwrap(),
            "SELECT count(*) AS \"total\" FROM \"Products\""
        );

        let bad = Expr::call("count(*); DROP", vec![]);
        assert!(matches!(formatter.format_expr_with(&formatter, &bad), Err(CqlError::Render(_))));
    }

    #[test]
    fn test_format_insert_update_delete() {
        let formatter = SqlFormatter::new();
        let entity = QueryEntity::new("Products");

        let insert = InsertQuery::insert_into(entity.clone())
            .value("id", Expr::param())
            .value("name", Expr::literal("Chair"));
        assert_eq!(
            formatter.format(&insert.into()).unwrap(),
            "INSERT INTO \"Products\"(\"id\", \"name\") VALUES (?, 'Chair')"
        );

        let update = UpdateQuery::new(entity.clone())
            .set("name", Expr::param())
            .filter(Expr::eq(Expr::name("id"), Expr::param()));
        assert_eq!(
            formatter.format(&update.into()).unwrap(),
            "UPDATE \"Products\" SET \"name\" = ? WHERE \"id\" = ?"
        );

        let delete = DeleteQuery::delete_from(entity).filter(Expr::eq(Expr::name("id"), Expr::param()));
        assert_eq!(
            formatter.format(&delete.into()).unwrap(),
            "DELETE FROM \"Products\" WHERE \"id\" = ?"
        );
    }

    #[test]
    fn test_render_errors() {
        let formatter = SqlFormatter::new();
        let insert = InsertQuery::insert_into(QueryEntity::new("Products"));
        assert!(matches!(formatter.format(&insert.into()), Err(CqlError::Render(_))));

        let filter = Expr::is_in(Expr::name("id"), vec![]);
        let select = SelectQuery::select_from(QueryEntity::new("Products")).filter(filter);
        assert!(matches!(formatter.format(&select.into()), Err(CqlError::Render(_))));

        let update = UpdateQuery::new(QueryEntity::new("Products"));
        assert!(formatter.format(&update.into()).is_err());
    }
}
