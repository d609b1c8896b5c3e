//! Runtime values produced by instantiation and member access.

use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::{QualifiedName, TypeHash};

/// A runtime value.
///
/// Objects are reference counted and compared by identity; everything else
/// compares structurally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    List(Vec<Value>),
    Object(Rc<Instance>),
}

impl Value {
    /// Wrap an instance.
    pub fn object(instance: Instance) -> Self {
        Value::Object(Rc::new(instance))
    }

    /// Float constructor.
    pub fn float(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }

    pub fn as_object(&self) -> Option<&Rc<Instance>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{}", v.0),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => write!(f, "<{} object>", obj.type_name()),
        }
    }
}

/// A constructor argument, positional or keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Value,
}

impl Argument {
    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }

    pub fn keyword(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// An object created through instantiation dispatch.
///
/// Records the concrete type that allocated it and the placeholder it was
/// constructed through, so identity checks work against either.
#[derive(Debug, Clone)]
pub struct Instance {
    type_name: QualifiedName,
    concrete: TypeHash,
    placeholder: TypeHash,
    fields: FxHashMap<String, Value>,
}

impl Instance {
    /// Allocate an empty instance of a concrete type.
    pub fn new(type_name: QualifiedName, concrete: TypeHash) -> Self {
        Self {
            type_name,
            concrete,
            placeholder: TypeHash::EMPTY,
            fields: FxHashMap::default(),
        }
    }

    /// Qualified name of the concrete type.
    pub fn type_name(&self) -> &QualifiedName {
        &self.type_name
    }

    /// Identity of the concrete type that allocated this instance.
    pub fn concrete(&self) -> TypeHash {
        self.concrete
    }

    /// Identity of the placeholder this instance was dispatched through.
    pub fn placeholder(&self) -> TypeHash {
        self.placeholder
    }

    pub fn set_placeholder(&mut self, placeholder: TypeHash) {
        self.placeholder = placeholder;
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Instance {}
