//! Structured query expressions
//!
//! A dialect-neutral query tree. Formatters in `cqlbridge-dialect` compile it
//! into statement text; nothing here knows about any particular dialect.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CqlError;

/// A name reference, possibly qualified (`Products.id`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameExpr {
    #[serde(rename = "$name")]
    pub name: String,
}

impl NameExpr {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The last segment of a qualified name
    pub fn member(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Accepts either a bare string or a `{"$name": "..."}` wrapper
impl TryFrom<&Value> for NameExpr {
    type Error = CqlError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(NameExpr::new(name.as_str())),
            Value::Object(map) => match map.get("$name") {
                Some(inner) => NameExpr::try_from(inner),
                None => Err(invalid_name_expression()),
            },
            _ => Err(invalid_name_expression()),
        }
    }
}

fn invalid_name_expression() -> CqlError {
    CqlError::Configuration("Invalid name expression. Expected string.".to_string())
}

/// Entity reference (`$ref`) with an optional alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntity {
    pub name: String,

    #[serde(rename = "$as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl QueryEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// A copy of this entity without its alias
    pub fn unaliased(&self) -> Self {
        Self::new(self.name.clone())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// An expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Column or entity reference
    Name(NameExpr),
    /// Inline literal
    Literal(Value),
    /// Positional parameter (`?`)
    Param,
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
    },
    /// Function call such as `count(*)` or `token(id)`
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(NameExpr::new(name))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn param() -> Self {
        Expr::Param
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Eq, left, right)
    }

    pub fn is_in(expr: Expr, values: Vec<Expr>) -> Self {
        Expr::In {
            expr: Box::new(expr),
            values,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }
}

/// A selected field with an optional output alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryField {
    pub expr: Expr,

    #[serde(rename = "$as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl QueryField {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Field referencing a column by name
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Expr::name(name))
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expr: Expr,
    #[serde(default)]
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, descending: false }
    }

    pub fn desc(expr: Expr) -> Self {
        Self { expr, descending: true }
    }
}

/// SELECT query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    #[serde(rename = "$ref")]
    pub entity: QueryEntity,

    /// Selected fields; empty selects every column
    #[serde(default)]
    pub fields: Vec<QueryField>,

    #[serde(rename = "$where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl SelectQuery {
    pub fn select_from(entity: QueryEntity) -> Self {
        Self {
            entity,
            fields: Vec::new(),
            filter: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, fields: impl IntoIterator<Item = QueryField>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn take(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// INSERT query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertQuery {
    #[serde(rename = "$ref")]
    pub entity: QueryEntity,
    pub values: Vec<(String, Expr)>,
}

impl InsertQuery {
    pub fn insert_into(entity: QueryEntity) -> Self {
        Self {
            entity,
            values: Vec::new(),
        }
    }

    pub fn value(mut self, column: impl Into<String>, expr: Expr) -> Self {
        self.values.push((column.into(), expr));
        self
    }
}

/// UPDATE query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuery {
    #[serde(rename = "$ref")]
    pub entity: QueryEntity,
    pub set: Vec<(String, Expr)>,
    #[serde(rename = "$where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
}

impl UpdateQuery {
    pub fn new(entity: QueryEntity) -> Self {
        Self {
            entity,
            set: Vec::new(),
            filter: None,
        }
    }

    pub fn set(mut self, column: impl Into<String>, expr: Expr) -> Self {
        self.set.push((column.into(), expr));
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }
}

/// DELETE query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "$ref")]
    pub entity: QueryEntity,
    #[serde(rename = "$where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
}

impl DeleteQuery {
    pub fn delete_from(entity: QueryEntity) -> Self {
        Self { entity, filter: None }
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }
}

/// Root of a structured query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryExpression {
    Select(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

impl QueryExpression {
    /// The entity this query targets
    pub fn entity(&self) -> &QueryEntity {
        match self {
            QueryExpression::Select(q) => &q.entity,
            QueryExpression::Insert(q) => &q.entity,
            QueryExpression::Update(q) => &q.entity,
            QueryExpression::Delete(q) => &q.entity,
        }
    }
}

impl From<SelectQuery> for QueryExpression {
    fn from(query: SelectQuery) -> Self {
        QueryExpression::Select(query)
    }
}

impl From<InsertQuery> for QueryExpression {
    fn from(query: InsertQuery) -> Self {
        QueryExpression::Insert(query)
    }
}

impl From<UpdateQuery> for QueryExpression {
    fn from(query: UpdateQuery) -> Self {
        QueryExpression::Update(query)
    }
}

impl From<DeleteQuery> for QueryExpression {
    fn from(query: DeleteQuery) -> Self {
        QueryExpression::Delete(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_expr_from_value() {
        assert_eq!(NameExpr::try_from(&json!("Products")).unwrap().name, "Products");
        assert_eq!(
            NameExpr::try_from(&json!({ "$name": "dbo.Products" })).unwrap().name,
            "dbo.Products"
        );
        assert!(NameExpr::try_from(&json!(42)).is_err());
        assert!(NameExpr::try_from(&json!({ "name": "Products" })).is_err());
        assert!(NameExpr::try_from(&json!({ "$name": 1 })).is_err());
    }

    #[test]
    fn test_name_expr_member() {
        assert_eq!(NameExpr::new("dbo.Products.id").member(), "id");
        assert_eq!(NameExpr::new("id").member(), "id");
    }

    #[test]
    fn test_select_builder() {
        let query = SelectQuery::select_from(QueryEntity::new("Products").with_alias("p"))
            .select([QueryField::name("id"), QueryField::name("name")])
            .filter(Expr::eq(Expr::name("id"), Expr::param()))
            .take(10);

        assert_eq!(query.fields.len(), 2);
        assert_eq!(query.entity.alias.as_deref(), Some("p"));
        assert_eq!(query.limit, Some(10));
        assert!(query.filter.is_some());
    }

    #[test]
    fn test_insert_and_delete_builders_convert_to_expressions() {
        let insert = InsertQuery::insert_into(QueryEntity::new("Products"))
            .value("id", Expr::param())
            .value("name", Expr::literal("Chair"));
        assert_eq!(insert.values.len(), 2);

        let delete = DeleteQuery::delete_from(QueryEntity::new("Products"))
            .filter(Expr::eq(Expr::name("id"), Expr::param()));

        let insert: QueryExpression = insert.into();
        let delete: QueryExpression = delete.into();
        assert!(matches!(insert, QueryExpression::Insert(_)));
        assert!(matches!(delete, QueryExpression::Delete(ref d) if d.filter.is_some()));
        assert_eq!(delete.entity().name, "Products");
    }

    #[test]
    fn test_entity_unaliased() {
        let entity = QueryEntity::new("Products").with_alias("p");
        assert_eq!(entity.unaliased(), QueryEntity::new("Products"));
        assert_eq!(entity.alias.as_deref(), Some("p"));
    }

    #[test]
    fn test_query_expression_serde() {
        let query: QueryExpression =
            SelectQuery::select_from(QueryEntity::new("Products")).select([QueryField::name("id")]).into();
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["select"]["$ref"]["name"], json!("Products"));
        assert_eq!(value["select"]["fields"][0]["expr"]["name"]["$name"], json!("id"));

        let parsed: QueryExpression = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, query);
        assert_eq!(parsed.entity().name, "Products");
    }
}
