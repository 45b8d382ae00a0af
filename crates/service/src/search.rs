//! Keyword search as data: which columns to look at, how to match and how
//! to combine, turned into a sea-orm [`Condition`] by [`SearchSpec::condition`].

use sea_orm::sea_query::{ColumnRef, Expr, Func, IntoColumnRef};
use sea_orm::Condition;

use models::{car, car_model, user};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// `LOWER(col) LIKE '%q%'`
    ContainsIgnoreCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Any field may match.
    Any,
    /// Every field must match.
    All,
}

#[derive(Debug, Clone)]
pub struct SearchSpec {
    pub fields: Vec<ColumnRef>,
    pub mode: MatchMode,
    pub combinator: Combinator,
}

impl SearchSpec {
    pub fn new() -> Self {
        Self { fields: Vec::new(), mode: MatchMode::ContainsIgnoreCase, combinator: Combinator::Any }
    }

    pub fn field<C: IntoColumnRef>(mut self, col: C) -> Self {
        self.fields.push(col.into_column_ref());
        self
    }

    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// `None` for a missing or blank query, which means "no filter".
    pub fn condition(&self, query: Option<&str>) -> Option<Condition> {
        let q = query.map(str::trim).filter(|q| !q.is_empty())?;
        if self.fields.is_empty() {
            return None;
        }
        let mut cond = match self.combinator {
            Combinator::Any => Condition::any(),
            Combinator::All => Condition::all(),
        };
        match self.mode {
            MatchMode::ContainsIgnoreCase => {
                let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
                for col in &self.fields {
                    cond = cond.add(Expr::expr(Func::lower(Expr::col(col.clone()))).like(pattern.clone()));
                }
            }
        }
        Some(cond)
    }
}

impl Default for SearchSpec {
    fn default() -> Self { Self::new() }
}

/// Escape LIKE wildcards so user input only ever matches literally.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Car listing: make or model of the car's model.
pub fn car_listing() -> SearchSpec {
    SearchSpec::new()
        .field((car_model::Entity, car_model::Column::Make))
        .field((car_model::Entity, car_model::Column::Model))
}

/// Order listings: plate, VIN, owner names and car model.
pub fn order_listing() -> SearchSpec {
    SearchSpec::new()
        .field((car::Entity, car::Column::PlateNr))
        .field((car::Entity, car::Column::Vin))
        .field((user::Entity, user::Column::FirstName))
        .field((user::Entity, user::Column::LastName))
        .field((car_model::Entity, car_model::Column::Make))
        .field((car_model::Entity, car_model::Column::Model))
}
