use crate::feature::{Attributes, display_text};

/// Equality test on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    pub key: String,
    pub value: String,
}

impl PropertyFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn to_sql(&self) -> String {
        format!("{} = '{}'", self.key, self.value.replace('\'', "''"))
    }
}

/// Feature query sent to a layer or table.
///
/// An empty filter list selects every feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureQuery {
    pub properties: Vec<PropertyFilter>,
    /// `None` requests every field.
    pub out_fields: Option<Vec<String>>,
    pub return_geometry: bool,
}

impl Default for FeatureQuery {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            out_fields: None,
            return_geometry: true,
        }
    }
}

impl FeatureQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: PropertyFilter) -> Self {
        Self {
            properties: vec![filter],
            ..Self::default()
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.out_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn without_geometry(mut self) -> Self {
        self.return_geometry = false;
        self
    }

    /// SQL-92 `where` clause understood by feature services.
    pub fn where_clause(&self) -> String {
        if self.properties.is_empty() {
            return "1=1".to_string();
        }
        self.properties
            .iter()
            .map(PropertyFilter::to_sql)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// `outFields` as the service expects it.
    pub fn out_fields_list(&self) -> Vec<String> {
        match &self.out_fields {
            Some(f) => f.clone(),
            None => vec!["*".to_string()],
        }
    }

    /// Evaluates the filter against an attribute map, for local sources.
    pub fn matches(&self, attrs: &Attributes) -> bool {
        properties_match(attrs, &self.properties)
    }
}

fn properties_match(attrs: &Attributes, filters: &[PropertyFilter]) -> bool {
    filters.iter().all(|f| {
        let Some(v) = attrs.get(&f.key) else {
            return false;
        };
        !v.is_null() && display_text(v) == f.value
    })
}
