//! Field descriptors.

use std::fmt;

use super::transform::{PostTransform, PreTransform};
use super::PATH_SEPARATOR;
use crate::store::{Inventory, RecordId};
use crate::value::Value;

/// Field kinds, each with its own operator and unary-condition semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// True/false flag.
    Boolean,
    /// Short text.
    Text,
    /// Free-form text.
    LongText,
    /// Identifier of a record in a related table.
    Reference,
    /// Calendar date.
    Date,
    /// Timestamp.
    DateTime,
    /// Integer or floating point number.
    Numeric,
}

impl FieldKind {
    /// Text kinds support the length-annotated variant.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::LongText)
    }

    /// Kinds that accept `>`, `<`, `>=` and `<=`.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            FieldKind::Numeric | FieldKind::Date | FieldKind::DateTime
        )
    }

    /// Lower-case name for listings and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "text",
            FieldKind::LongText => "long text",
            FieldKind::Reference => "reference",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Numeric => "numeric",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step from a record to a related record: follow the reference stored
/// in `field` into `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedHop {
    /// Reference attribute on the current record.
    pub field: String,
    /// Table the reference points into.
    pub table: String,
}

impl RelatedHop {
    pub fn new(field: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            table: table.into(),
        }
    }
}

/// Per-record computation backing a dynamic field.
#[derive(Clone, Copy)]
pub struct ComputeFn {
    name: &'static str,
    func: fn(&Inventory, RecordId) -> Value,
}

impl ComputeFn {
    pub const fn new(name: &'static str, func: fn(&Inventory, RecordId) -> Value) -> Self {
        Self { name, func }
    }

    /// Compute the value for one record.
    pub fn call(&self, inventory: &Inventory, id: RecordId) -> Value {
        (self.func)(inventory, id)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ComputeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComputeFn({})", self.name)
    }
}

impl PartialEq for ComputeFn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func as usize == other.func as usize
    }
}

/// How a query token maps to a stored or computed value.
///
/// A descriptor is either stored (`storage_field`, optionally reached through
/// `related`) or dynamic (`compute`), never both.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Registry key.
    pub token: String,
    /// Stored attribute name; empty for dynamic fields.
    pub storage_field: String,
    /// Traversal from the primary record to the record holding the attribute.
    pub related: Vec<RelatedHop>,
    /// Human label.
    pub display_name: String,
    pub kind: FieldKind,
    /// Whether null is a meaningful stored state.
    pub nullable: bool,
    pub compute: Option<ComputeFn>,
    /// Query literal to storage value.
    pub pre_transform: Option<PreTransform>,
    /// Storage value to display value.
    pub post_transform: Option<PostTransform>,
}

impl FieldDescriptor {
    /// A stored attribute of the primary record.
    ///
    /// The display name defaults to the storage name with underscores as spaces.
    pub fn stored(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            display_name: name.replace('_', " "),
            storage_field: name.clone(),
            token: name,
            related: Vec::new(),
            kind,
            nullable: false,
            compute: None,
            pre_transform: None,
            post_transform: None,
        }
    }

    /// A field computed per record.
    pub fn dynamic(token: impl Into<String>, kind: FieldKind, compute: ComputeFn) -> Self {
        let token = token.into();
        Self {
            display_name: token.replace('_', " "),
            storage_field: String::new(),
            token,
            related: Vec::new(),
            kind,
            nullable: true,
            compute: Some(compute),
            pre_transform: None,
            post_transform: None,
        }
    }

    /// Reach the attribute through a reference.
    pub fn through(mut self, field: impl Into<String>, table: impl Into<String>) -> Self {
        self.related.push(RelatedHop::new(field, table));
        self
    }

    /// Use a different registry token, keeping the storage location.
    pub fn renamed(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_display(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_pre(mut self, transform: PreTransform) -> Self {
        self.pre_transform = Some(transform);
        self
    }

    pub fn with_post(mut self, transform: PostTransform) -> Self {
        self.post_transform = Some(transform);
        self
    }

    /// Check if the value is computed rather than stored.
    pub fn is_dynamic(&self) -> bool {
        self.compute.is_some()
    }

    /// Prefix made of the related hops (`enclosure`), empty for direct fields.
    pub fn related_prefix(&self) -> String {
        self.related
            .iter()
            .map(|hop| hop.field.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// Store look-up path (`enclosure__location_room`); the token for dynamic fields.
    pub fn column(&self) -> String {
        if self.is_dynamic() {
            return self.token.clone();
        }
        if self.related.is_empty() {
            self.storage_field.clone()
        } else {
            format!(
                "{}{}{}",
                self.related_prefix(),
                PATH_SEPARATOR,
                self.storage_field
            )
        }
    }

    /// Numeric pseudo-field holding the character length of this field, and
    /// the column the executor must materialise for it. Text kinds only.
    pub fn length_annotated(&self) -> Option<(FieldDescriptor, DerivedColumn)> {
        if !self.kind.is_textual() {
            return None;
        }
        let derived = DerivedColumn {
            name: format!("{}{}length", self.column(), PATH_SEPARATOR),
            source: self.clone(),
            function: DerivedFunction::Length,
        };
        let pseudo = FieldDescriptor {
            token: format!("{}{}length", self.token, PATH_SEPARATOR),
            storage_field: derived.name.clone(),
            related: Vec::new(),
            display_name: format!("{} length", self.display_name),
            kind: FieldKind::Numeric,
            nullable: false,
            compute: None,
            pre_transform: None,
            post_transform: None,
        };
        Some((pseudo, derived))
    }

    /// The displayed form of a reference as a stored field one hop further
    /// (`architecture` becomes `architecture__name`). `None` unless the field
    /// is shown through [`PostTransform::LookupField`].
    pub fn display_variant(&self) -> Option<FieldDescriptor> {
        let (table, field) = match self.post_transform {
            Some(PostTransform::LookupField { table, field }) if !self.is_dynamic() => {
                (table, field)
            }
            _ => return None,
        };
        let mut related = self.related.clone();
        related.push(RelatedHop::new(self.storage_field.clone(), table));
        Some(FieldDescriptor {
            token: self.token.clone(),
            storage_field: field.to_string(),
            related,
            display_name: self.display_name.clone(),
            kind: FieldKind::Text,
            nullable: true,
            compute: None,
            pre_transform: None,
            post_transform: None,
        })
    }
}

/// Functions a derived column can apply to its source field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedFunction {
    /// Character length of the textual value.
    Length,
}

/// A column computed from a stored field solely to support a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    /// Column name the predicate refers to.
    pub name: String,
    /// Field the column is computed from.
    pub source: FieldDescriptor,
    pub function: DerivedFunction,
}

impl DerivedColumn {
    /// Compute the column from the source field's value.
    pub fn evaluate(&self, source: &Value) -> Value {
        match self.function {
            DerivedFunction::Length => source.char_length(),
        }
    }
}
