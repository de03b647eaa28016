//! Field and syntax model: the declared shape of one command.
//!
//! A [`Syntax`] is an ordered list of [`Field`]s. The first field is the literal
//! command keyword; every later field is a parameter whose [`FieldMode`] decides
//! both how the operator fills it in and how it is rendered on the wire.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Field mode ──────────────────────────────────────────────────

/// How a field collects its value and how the serializer renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    /// Free text, rendered verbatim (id portion only).
    Plain,
    /// Free text glued to a literal prefix, e.g. `x5`.
    SpecialPrefix,
    /// One value picked from a fixed choice list.
    SimpleRadio,
    /// One value picked from a typed, filterable choice list.
    ComplexRadio,
    /// Ordered set of unique tokens.
    MultiSelectSet,
    /// Tokens with a positive count each, rendered as `id:count`.
    MultiSelectMultiset,
}

impl FieldMode {
    /// True for the modes backed by a single scalar value.
    pub const fn is_scalar(self) -> bool {
        match self {
            Self::Plain | Self::SpecialPrefix | Self::SimpleRadio | Self::ComplexRadio => true,
            Self::MultiSelectSet | Self::MultiSelectMultiset => false,
        }
    }
}

// ── Field ───────────────────────────────────────────────────────

/// One slot in a command's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    original_name: String,
    display_name: String,
    mode: FieldMode,
    required: bool,
    delimiter: Option<String>,
}

impl Field {
    pub fn new(
        original_name: impl Into<String>,
        display_name: impl Into<String>,
        mode: FieldMode,
        required: bool,
        delimiter: Option<String>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            display_name: display_name.into(),
            mode,
            required,
            delimiter,
        }
    }

    /// A plain field whose display name equals its key. Used for the command keyword.
    pub fn keyword(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, FieldMode::Plain, true, None)
    }

    /// Protocol-stable key. Never changes with the locale.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// The raw delimiter / prefix, if one was declared.
    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    /// Separator between multi-select entries: the declared delimiter if non-empty, else `,`.
    pub fn list_separator(&self) -> &str {
        match self.delimiter.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => ",",
        }
    }

    /// Label for an input control, with a `*` marker on required fields.
    pub fn label(&self) -> String {
        if self.required {
            format!("{}*", self.display_name)
        } else {
            self.display_name.clone()
        }
    }
}

// ── Syntax ──────────────────────────────────────────────────────

/// Rejected syntax definitions. Raised while building the catalog, never at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum SyntaxError {
    Empty,
    DuplicateField { name: String },
    EmptyFieldName { index: usize },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::Empty => write!(f, "Syntax has no fields"),
            SyntaxError::DuplicateField { name } => {
                write!(f, "Duplicate field name in syntax: {name}")
            }
            SyntaxError::EmptyFieldName { index } => {
                write!(f, "Field {index} has an empty name")
            }
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Ordered, immutable list of fields. The first one is the command keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Syntax {
    fields: Vec<Field>,
}

impl Syntax {
    pub fn builder(keyword: impl Into<String>) -> SyntaxBuilder {
        SyntaxBuilder {
            fields: vec![Field::keyword(keyword)],
        }
    }

    /// Build from an already assembled field list, checking the model invariants.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self, SyntaxError> {
        if fields.is_empty() {
            return Err(SyntaxError::Empty);
        }
        for (index, field) in fields.iter().enumerate() {
            if field.original_name.is_empty() {
                return Err(SyntaxError::EmptyFieldName { index });
            }
            let seen_before = fields
                .iter()
                .take(index)
                .any(|f| f.original_name == field.original_name);
            if seen_before {
                return Err(SyntaxError::DuplicateField {
                    name: field.original_name.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// All fields, keyword first. UI generation and rendering both walk this order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The command keyword (first field's original name).
    pub fn keyword(&self) -> &str {
        self.fields
            .first()
            .map_or("", |f| f.original_name.as_str())
    }

    /// Every value-bearing field, i.e. all fields after the keyword.
    pub fn parameters(&self) -> &[Field] {
        self.fields.get(1..).unwrap_or_default()
    }

    pub fn field(&self, original_name: &str) -> Option<&Field> {
        self.parameters()
            .iter()
            .find(|f| f.original_name == original_name)
    }

    /// Usage line such as `build <characters> [discs]`.
    pub fn usage(&self) -> String {
        let mut parts = vec![self.keyword().to_string()];
        for field in self.parameters() {
            let mut name = field.original_name.clone();
            if field.mode == FieldMode::SpecialPrefix {
                name = format!("{}{name}", field.delimiter().unwrap_or_default());
            }
            if matches!(field.mode, FieldMode::MultiSelectSet | FieldMode::MultiSelectMultiset) {
                name.push_str("...");
            }
            if field.required {
                parts.push(format!("<{name}>"));
            } else {
                parts.push(format!("[{name}]"));
            }
        }
        parts.join(" ")
    }
}

/// Fluent builder mirroring how command definitions are written by hand.
#[derive(Debug, Clone)]
pub struct SyntaxBuilder {
    fields: Vec<Field>,
}

impl SyntaxBuilder {
    /// Optional plain parameter.
    pub fn add(self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.field(Field::new(name, display_name, FieldMode::Plain, false, None))
    }

    /// Required plain parameter.
    pub fn add_required(self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.field(Field::new(name, display_name, FieldMode::Plain, true, None))
    }

    /// Parameter with an explicit mode and delimiter / prefix.
    pub fn add_mode(
        self,
        name: impl Into<String>,
        display_name: impl Into<String>,
        mode: FieldMode,
        delimiter: impl Into<String>,
    ) -> Self {
        self.field(Field::new(
            name,
            display_name,
            mode,
            false,
            Some(delimiter.into()),
        ))
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Syntax, SyntaxError> {
        Syntax::from_fields(self.fields)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn keyword_is_first_field() {
        let syntax = Syntax::builder("give")
            .add_required("item", "Item")
            .add("amount", "Amount")
            .build()
            .unwrap();
        assert_eq!(syntax.keyword(), "give");
        assert_eq!(syntax.fields().len(), 3);
        assert_eq!(syntax.parameters().len(), 2);
        assert_eq!(syntax.parameters()[0].original_name(), "item");
        assert!(syntax.field("give").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Syntax::builder("give")
            .add("item", "Item")
            .add("item", "Item again")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SyntaxError::DuplicateField {
                name: "item".to_string()
            }
        );
    }

    #[test]
    fn empty_syntax_rejected() {
        assert_eq!(Syntax::from_fields(Vec::new()), Err(SyntaxError::Empty));
    }

    #[test]
    fn empty_field_name_rejected() {
        let err = Syntax::builder("give").add("", "Nothing").build().unwrap_err();
        assert_eq!(err, SyntaxError::EmptyFieldName { index: 1 });
    }

    #[test]
    fn list_separator_falls_back_to_comma() {
        let empty = Field::new("a", "A", FieldMode::MultiSelectSet, false, Some(String::new()));
        let none = Field::new("b", "B", FieldMode::MultiSelectSet, false, None);
        let space = Field::new("c", "C", FieldMode::MultiSelectSet, false, Some(" ".into()));
        assert_eq!(empty.list_separator(), ",");
        assert_eq!(none.list_separator(), ",");
        assert_eq!(space.list_separator(), " ");
    }

    #[test]
    fn usage_marks_required_and_prefix() {
        let syntax = Syntax::builder("lvl")
            .add_required("uid", "Uid")
            .add_mode("level", "Level", FieldMode::SpecialPrefix, "lv")
            .add_mode("ids", "Ids", FieldMode::MultiSelectSet, ",")
            .build()
            .unwrap();
        assert_eq!(syntax.usage(), "lvl <uid> [lvlevel] [ids...]");
    }

    #[test]
    fn required_label_has_asterisk() {
        let field = Field::new("uid", "Player", FieldMode::Plain, true, None);
        assert_eq!(field.label(), "Player*");
    }
}
