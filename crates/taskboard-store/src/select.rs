/// A single filter predicate on a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Column equals the value.
    Eq { column: String, value: String },
    /// Column contains `needle`, ignoring case (`ILIKE %needle%`).
    ILike { column: String, needle: String },
    /// Column is greater than or equal to the value.
    Gte { column: String, value: String },
    /// Column is less than or equal to the value.
    Lte { column: String, value: String },
}

/// Ordering on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Related rows to expand into each selected row.
///
/// Rows of `table` whose `foreign_key` equals the parent id are attached under
/// the key `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub table: String,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

/// Count strategy requested alongside the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Exact `count(*)` over the filtered set, ignoring the range.
    Exact,
}

/// Select query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    /// Projected columns; empty means all.
    pub columns: Vec<String>,
    pub embed: Option<Embed>,
    pub predicates: Vec<Predicate>,
    pub order: Vec<Order>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub count: Option<CountMode>,
}

impl Select {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            embed: None,
            predicates: Vec::new(),
            order: Vec::new(),
            offset: None,
            limit: None,
            count: None,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn ilike(mut self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.predicates.push(Predicate::ILike {
            column: column.into(),
            needle: needle.into(),
        });
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Gte {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn lte(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Lte {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Restrict to the inclusive row range `from..=to`.
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.offset = Some(from);
        self.limit = Some(to.saturating_sub(from) + 1);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn exact_count(mut self) -> Self {
        self.count = Some(CountMode::Exact);
        self
    }

    /// Render as PostgREST query parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.predicates.len() + 4);

        let mut select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        if let Some(embed) = &self.embed {
            let columns = if embed.columns.is_empty() {
                "*".to_string()
            } else {
                embed.columns.join(",")
            };
            select.push_str(&format!(",{}({})", embed.table, columns));
        }
        params.push(("select".to_string(), select));

        for predicate in &self.predicates {
            let (column, value) = match predicate {
                Predicate::Eq { column, value } => (column, format!("eq.{value}")),
                Predicate::ILike { column, needle } => (column, format!("ilike.*{needle}*")),
                Predicate::Gte { column, value } => (column, format!("gte.{value}")),
                Predicate::Lte { column, value } => (column, format!("lte.{value}")),
            };
            params.push((column.clone(), value));
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}
