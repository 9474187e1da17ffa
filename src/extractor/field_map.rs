/// Where a field's value comes from in a pipe-split DETAIL line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// One zero-based column, copied verbatim.
    Single(usize),
    /// Two columns joined with a single space, then trimmed.
    Combined(usize, usize),
}

impl FieldSource {
    /// Resolve this source against the split columns of one line.
    ///
    /// Columns past the end of `parts` resolve to an empty string.
    pub fn resolve(&self, parts: &[&str]) -> String {
        match *self {
            FieldSource::Single(index) => column(parts, index).to_string(),
            FieldSource::Combined(first, second) => {
                format!("{} {}", column(parts, first), column(parts, second))
                    .trim()
                    .to_string()
            }
        }
    }

    pub fn max_index(&self) -> usize {
        match *self {
            FieldSource::Single(index) => index,
            FieldSource::Combined(first, second) => first.max(second),
        }
    }
}

fn column<'a>(parts: &[&'a str], index: usize) -> &'a str {
    parts.get(index).copied().unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub source: FieldSource,
}

impl FieldSpec {
    pub const fn single(name: &'static str, index: usize) -> Self {
        Self {
            name,
            source: FieldSource::Single(index),
        }
    }

    pub const fn combined(name: &'static str, first: usize, second: usize) -> Self {
        Self {
            name,
            source: FieldSource::Combined(first, second),
        }
    }
}

/// Ordered, compile-time table of output fields.
///
/// Declaration order is the column order of every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    fields: &'static [FieldSpec],
}

impl FieldMap {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// The Concur DETAIL export schema.
    pub const fn concur() -> Self {
        CONCUR_FIELD_MAP
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of pipe-separated columns a line needs for every field to be populated.
    pub fn required_columns(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.source.max_index() + 1)
            .max()
            .unwrap_or(0)
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::concur()
    }
}

const CONCUR_FIELDS: &[FieldSpec] = &[
    FieldSpec::single("Date", 2),
    FieldSpec::single("PartnerId", 79),
    FieldSpec::single("Quantity", 65),
    // last name, first name
    FieldSpec::combined("UserName", 5, 6),
    FieldSpec::single("Department", 9),
    FieldSpec::single("Purpose", 68),
    FieldSpec::single("Value", 248),
];

pub const CONCUR_FIELD_MAP: FieldMap = FieldMap::new(CONCUR_FIELDS);
