//! PostgreSQL rendering of directory reads using SeaQuery.

use sea_query::{
    Alias, Asterisk, Cond, Expr, Func, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Value,
};

use super::query_builder::escape_like_wildcards;
use super::types::{FilterValue, OrderClause, ReadRequest, ReferenceRequest, SortDirection};

/// SELECT for one page of rows.
pub fn select_sql(request: &ReadRequest) -> String {
    let table = request.table.name();
    let mut query = Query::select();

    query.column((Alias::new(table), Asterisk));
    query.from(Alias::new(table));
    add_conditions(&mut query, request);

    add_order(&mut query, table, &request.order);
    let key = request.table.key_column();
    if request.order.field != key {
        query.order_by((Alias::new(table), Alias::new(key)), Order::Asc);
    }

    query.limit(request.range.len());
    query.offset(request.range.start);

    query.to_string(PostgresQueryBuilder)
}

/// COUNT(*) over the same predicates, ignoring order and range.
pub fn count_sql(request: &ReadRequest) -> String {
    let mut query = Query::select();

    query.expr(Expr::col(Asterisk).count());
    query.from(Alias::new(request.table.name()));
    add_conditions(&mut query, request);

    query.to_string(PostgresQueryBuilder)
}

/// SELECT of `id` and the label column of a reference table.
pub fn reference_sql(request: &ReferenceRequest) -> String {
    let table = request.source.table();
    let mut query = Query::select();

    query.column((Alias::new(table), Alias::new("id")));
    query.column((Alias::new(table), Alias::new(request.source.label_column())));
    query.from(Alias::new(table));
    add_order(&mut query, table, &request.order);
    query.order_by((Alias::new(table), Alias::new("id")), Order::Asc);

    query.to_string(PostgresQueryBuilder)
}

/// Cheapest read that fails when `table` is missing or unreadable.
pub fn probe_sql(table: &str) -> String {
    Query::select()
        .expr(Expr::val(1))
        .from(Alias::new(table))
        .limit(1)
        .to_string(PostgresQueryBuilder)
}

fn add_conditions(query: &mut SelectStatement, request: &ReadRequest) {
    let table = request.table.name();

    if let Some(scope) = &request.scope {
        query.and_where(Expr::col((Alias::new(table), Alias::new(&scope.column))).eq(scope.owner));
    }

    for (field, value) in &request.predicates {
        if let Some(expr) = predicate_expr(table, field, value) {
            query.and_where(expr);
        }
    }

    if let Some(search) = &request.search {
        let pattern = format!("%{}%", escape_like_wildcards(&search.term.to_lowercase()));
        let mut any = Cond::any();
        for column in &search.columns {
            any = any.add(
                Expr::expr(Func::lower(Expr::col((Alias::new(table), Alias::new(column)))))
                    .like(pattern.clone()),
            );
        }
        query.and_where(any.into());
    }
}

fn predicate_expr(table: &str, field: &str, value: &FilterValue) -> Option<SimpleExpr> {
    let column = Expr::col((Alias::new(table), Alias::new(field)));
    match value {
        FilterValue::List(items) => {
            let values: Vec<Value> = items.iter().filter_map(sql_value).collect();
            if values.is_empty() {
                // IN () matches nothing
                Some(Expr::val(false).into())
            } else {
                Some(column.is_in(values))
            }
        }
        other => sql_value(other).map(|v| column.eq(v)),
    }
}

fn sql_value(value: &FilterValue) -> Option<Value> {
    match value {
        FilterValue::Integer(i) => Some((*i).into()),
        FilterValue::Boolean(b) => Some((*b).into()),
        FilterValue::Uuid(u) => Some((*u).into()),
        FilterValue::Text(s) => Some(s.clone().into()),
        FilterValue::List(_) => None,
    }
}

fn add_order(query: &mut SelectStatement, table: &str, order: &OrderClause) {
    let direction = match order.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    query.order_by((Alias::new(table), Alias::new(&order.field)), direction);
}
